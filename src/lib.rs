//! Hive Prometheus Exporter
//!
//! A Prometheus metrics exporter for Hive smart-home installations.
//!
//! # Overview
//!
//! The exporter logs in to the Hive cloud API once, then polls it on a fixed
//! interval for every home on the account, its devices (hubs, sensors,
//! boilers) and its products (thermostats, plugs, lights, TRVs). Selected
//! fields are republished as labeled gauges for Prometheus to scrape.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      HTTPS/JSON      ┌──────────────┐
//! │  Hive API   │ ◄─────────────────►  │   Exporter   │
//! │ (beekeeper) │   Cognito tokens     │              │
//! └─────────────┘                      │  ┌────────┐  │      HTTP      ┌────────────┐
//!                                      │  │ Poller │  │ ◄────────────► │ Prometheus │
//!                                      │  └────────┘  │   /metrics     └────────────┘
//!                                      │  ┌────────┐  │
//!                                      │  │Metrics │  │
//!                                      │  └────────┘  │
//!                                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`hive`] - Authentication, API client and resource fetchers
//! - [`collectors`] - JSON to gauge mapping and the poll cycle
//! - [`metrics`] - Prometheus metric definitions
//! - [`scheduler`] - Interval timer that drops overlapping runs
//! - [`server`] - HTTP server and poll loop wiring
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use hive_exporter::{config::Config, hive::HiveClient, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     let credentials = config.credentials()?;
//!     let client = HiveClient::login(&config.hive, &credentials).await?;
//!     server::start(config, client).await?;
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod hive;
pub mod metrics;
pub mod scheduler;
pub mod server;
