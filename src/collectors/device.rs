//! Device Metrics Collector
//!
//! Maps a hub/sensor device record onto connectivity, firmware and power
//! gauges.
//!
//! # Metrics Produced
//! - `hive_online` - 1 if `props.online` is truthy, else 0 (always set)
//! - `hive_version` - firmware version, value 1 (required)
//!   - Extra label: version
//! - `hive_model` - model, value 1 (required)
//!   - Extra label: model
//! - `hive_power` - power source, value 1 (required)
//!   - Extra label: power
//! - `hive_signal` / `hive_battery` - set only when truthy
//! - `hive_upgrade_available` / `hive_upgrading` - 1/0, when `props.upgrade` is present
//! - `hive_upgrade_status` - value 1, when `props.upgrade.status` is present
//!   - Extra label: status
//!
//! All metrics carry `home_id, home_name, type, id, name`.

use super::{gauge_value, label_value, require, truthy, truthy_field, EntityLabels};
use crate::error::Result;
use crate::metrics::HiveMetrics;
use serde_json::Value;

/// Updates the device gauges for one device.
///
/// Returns `Ok(false)` without touching any gauge when the device has no
/// `state`. A missing `props`, or a `props` without `version`, `model` or
/// `power`, is a mapping error; gauges written before the missing field was
/// reached keep their new values.
pub fn map_device(metrics: &HiveMetrics, home: &Value, device: &Value) -> Result<bool> {
    let Some(state) = device.get("state") else {
        return Ok(false);
    };
    let name = require(state, "name", "device state")?;
    let labels = EntityLabels::new(home, device, name)?;
    let props = require(device, "props", "device")?;

    metrics.set_bool_metric(
        &metrics.online,
        &labels.base(),
        props.get("online").is_some_and(truthy),
    );

    if truthy(props) {
        let version = label_value(require(props, "version", "device props")?);
        metrics.set_gauge(&metrics.version, &labels.with(&version), 1.0);

        let model = label_value(require(props, "model", "device props")?);
        metrics.set_gauge(&metrics.model, &labels.with(&model), 1.0);

        let power = label_value(require(props, "power", "device props")?);
        metrics.set_gauge(&metrics.power, &labels.with(&power), 1.0);

        if let Some(signal) = truthy_field(props, "signal") {
            metrics.set_gauge(&metrics.signal, &labels.base(), gauge_value(signal, "signal")?);
        }

        if let Some(battery) = truthy_field(props, "battery") {
            metrics.set_gauge(&metrics.battery, &labels.base(), gauge_value(battery, "battery")?);
        }
    }

    if let Some(upgrade) = truthy_field(props, "upgrade") {
        metrics.set_bool_metric(
            &metrics.upgrade_available,
            &labels.base(),
            upgrade.get("available").is_some_and(truthy),
        );
        metrics.set_bool_metric(
            &metrics.upgrading,
            &labels.base(),
            upgrade.get("upgrading").is_some_and(truthy),
        );

        if let Some(status) = truthy_field(upgrade, "status") {
            let status = label_value(status);
            metrics.set_gauge(&metrics.upgrade_status, &labels.with(&status), 1.0);
        }
    }

    Ok(true)
}
