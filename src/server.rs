//! HTTP Server and Poll Loop
//!
//! This module implements the Prometheus exporter HTTP server and drives the
//! poll cycle.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`
//! - **Poll Loop**: [`PollScheduler`] task that runs one poll cycle per interval
//! - **State Management**: the shared [`HiveMetrics`] handle and the client in an `Arc`
//!
//! # Metrics Collection
//!
//! Every `interval_seconds` the scheduler runs [`run_poll_cycle`], which:
//! 1. Polls the Hive API and updates the entity gauges
//! 2. Sets `hive_up` to 1 on success, 0 on failure
//! 3. Records the cycle duration and the time of the last successful poll
//!
//! # Shutdown
//!
//! Ctrl-C stops the server gracefully and `start` returns `Ok(())`.

use crate::collectors;
use crate::config::{Config, PollingConfig};
use crate::hive::HiveApi;
use crate::metrics::HiveMetrics;
use crate::scheduler::PollScheduler;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{error, info};

pub async fn start<C>(config: Config, client: C) -> anyhow::Result<()>
where
    C: HiveApi + 'static,
{
    let metrics = HiveMetrics::new()?;
    let client = Arc::new(client);

    // Start the poll loop
    let scheduler = PollScheduler::new(Duration::from_secs(config.polling.interval_seconds));
    let poll_metrics = metrics.clone();
    let polling = config.polling.clone();
    let poll_task = tokio::spawn(scheduler.run(move || {
        let client = client.clone();
        let metrics = poll_metrics.clone();
        let polling = polling.clone();
        async move { run_poll_cycle(client.as_ref(), &metrics, &polling).await }
    }));

    let app = router(metrics);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poll_task.abort();
    info!("Shut down");

    Ok(())
}

/// Router serving the registry at `/metrics`.
pub fn router(metrics: HiveMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

/// One poll cycle plus the exporter health gauges.
pub async fn run_poll_cycle<C: HiveApi>(
    client: &C,
    metrics: &HiveMetrics,
    config: &PollingConfig,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let result = collectors::poll(client, metrics, config).await;
    metrics
        .poll_duration_seconds
        .set(started.elapsed().as_secs_f64());

    match result {
        Ok(_) => {
            metrics.up.set(1.0);
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
            metrics.last_poll_timestamp_seconds.set(now);
            Ok(())
        }
        Err(e) => {
            metrics.up.set(0.0);
            Err(e.into())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Interrupt received, shutting down");
}

async fn metrics_handler(State(metrics): State<HiveMetrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}
