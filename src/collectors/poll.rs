//! Poll cycle
//!
//! One pass over the account: refresh tokens, fetch homes, then for each home
//! fetch and map its devices and products (and actions when enabled).
//!
//! Fetch errors abort the cycle and are returned to the caller. A mapping
//! error only abandons the entity it came from; it is logged and counted in
//! [`PollSummary::failed`].

use super::{label_value, map_action, map_device, map_product, require};
use crate::config::PollingConfig;
use crate::error::Result;
use crate::hive::{fetch, HiveApi};
use crate::metrics::HiveMetrics;
use tracing::{debug, info, warn};

/// Counts from one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub homes: usize,
    pub devices: usize,
    /// Products seen, including ones the selected mapping skips
    pub products: usize,
    pub actions: usize,
    /// Entities abandoned because of a mapping error
    pub failed: usize,
    /// Gauge writes made by the product mapper
    pub product_updates: usize,
}

pub async fn poll<C: HiveApi>(
    client: &C,
    metrics: &HiveMetrics,
    config: &PollingConfig,
) -> Result<PollSummary> {
    info!("Polling Hive API");
    client.refresh_tokens().await?;

    let mut summary = PollSummary::default();
    let homes = fetch::get_homes(client).await?;

    for home in &homes {
        let home_id = match require(home, "id", "home") {
            Ok(id) => label_value(id),
            Err(e) => {
                warn!("Skipping home: {}", e);
                summary.failed += 1;
                continue;
            }
        };
        summary.homes += 1;

        for device in fetch::get_devices(client, Some(&home_id)).await? {
            match map_device(metrics, home, &device) {
                Ok(true) => summary.devices += 1,
                Ok(false) => debug!("Skipping device without state in home {}", home_id),
                Err(e) => {
                    warn!("Failed to map device in home {}: {}", home_id, e);
                    summary.failed += 1;
                }
            }
        }

        for product in fetch::get_products(client, Some(&home_id)).await? {
            match map_product(metrics, config.product_mapping, home, &product) {
                Ok(updates) => {
                    summary.products += 1;
                    summary.product_updates += updates;
                }
                Err(e) => {
                    warn!("Failed to map product in home {}: {}", home_id, e);
                    summary.failed += 1;
                }
            }
        }

        if config.collect_actions {
            for action in fetch::get_actions(client, Some(&home_id)).await? {
                match map_action(metrics, home, &action) {
                    Ok(()) => summary.actions += 1,
                    Err(e) => {
                        warn!("Failed to map action in home {}: {}", home_id, e);
                        summary.failed += 1;
                    }
                }
            }
        }
    }

    info!(
        "Polling done: {} homes, {} devices, {} products, {} failed",
        summary.homes, summary.devices, summary.products, summary.failed
    );
    Ok(summary)
}
