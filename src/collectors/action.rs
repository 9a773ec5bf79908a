//! Action Metrics Collector
//!
//! # Metrics Produced
//! - `hive_action_enabled` - 1 if the action is enabled, else 0
//!   - Labels: home_id, home_name, id, name

use super::{label_value, require, truthy};
use crate::error::Result;
use crate::metrics::HiveMetrics;
use serde_json::Value;

pub fn map_action(metrics: &HiveMetrics, home: &Value, action: &Value) -> Result<()> {
    let home_id = label_value(require(home, "id", "home")?);
    let home_name = label_value(require(home, "name", "home")?);
    let id = label_value(require(action, "id", "action")?);
    let name = action.get("name").map(label_value).unwrap_or_default();

    metrics.set_bool_metric(
        &metrics.action_enabled,
        &[home_id.as_str(), home_name.as_str(), id.as_str(), name.as_str()],
        action.get("enabled").is_some_and(truthy),
    );
    Ok(())
}
