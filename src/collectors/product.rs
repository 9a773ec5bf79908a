//! Product Metrics Collector
//!
//! Maps product records (thermostats, plugs, lights, TRVs, sensors) onto
//! gauges through one of two mapping tables, chosen by
//! [`ProductMapping`]. The tables are alternatives and never both apply.
//!
//! # General mapping
//! Every product type except `trvcontrol`:
//! - `hive_mode` (extra label `mode`), `hive_brightness` (extra label `group`),
//!   `hive_target` from `state`
//! - `hive_motion`, `hive_model` (extra label `model`), `hive_manufacturer`
//!   (extra label `manufacturer`), `hive_in_use`, `hive_temperature`,
//!   `hive_working`, `hive_schedule_override` from `props`
//! - `hive_auto_boost_{target,active,duration}` from `props.autoBoost`
//! - `hive_holiday_mode_{active,enabled}` from `props.holidayMode`
//!
//! # TRV mapping
//! Only `trvcontrol`:
//! - `hive_trv_target`, `hive_trv_mode` (extra label `mode`) from `state`
//! - `hive_trv_auto_boost_target`, `hive_trv_working`, `hive_trv_temperature`
//!   from `props`
//!
//! Every entry uses the falsy guard.

use super::{gauge_value, label_value, lookup, require, truthy_field, EntityLabels};
use crate::config::ProductMapping;
use crate::error::Result;
use crate::metrics::HiveMetrics;
use prometheus::GaugeVec;
use serde_json::Value;
use tracing::debug;

pub const TRV_TYPE: &str = "trvcontrol";

/// Where the extra label value of a mapped field comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraLabel {
    None,
    /// The field's own value becomes the label; the sample is 1
    FieldValue,
    /// `"true"`/`"false"` from `state.isGroup`
    GroupFlag,
}

/// How the field's value becomes a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    /// Presence indicator, always 1
    Flag,
}

/// One `{json path, gauge, extra label, value}` row of a mapping table
pub struct FieldMapping {
    pub path: &'static [&'static str],
    pub gauge: fn(&HiveMetrics) -> &GaugeVec,
    pub extra: ExtraLabel,
    pub value: ValueKind,
}

/// A product mapping: which types it handles and the fields it maps
pub struct MappingTable {
    pub handles: fn(&str) -> bool,
    pub fields: &'static [FieldMapping],
}

const fn field(
    path: &'static [&'static str],
    gauge: fn(&HiveMetrics) -> &GaugeVec,
    extra: ExtraLabel,
    value: ValueKind,
) -> FieldMapping {
    FieldMapping {
        path,
        gauge,
        extra,
        value,
    }
}

pub static GENERAL: MappingTable = MappingTable {
    handles: |product_type| product_type != TRV_TYPE,
    fields: &[
        field(&["state", "mode"], |m| m.mode.as_ref(), ExtraLabel::FieldValue, ValueKind::Flag),
        field(&["state", "brightness"], |m| m.brightness.as_ref(), ExtraLabel::GroupFlag, ValueKind::Numeric),
        field(&["state", "target"], |m| m.target.as_ref(), ExtraLabel::None, ValueKind::Numeric),
        field(&["props", "motion", "status"], |m| m.motion.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "model"], |m| m.model.as_ref(), ExtraLabel::FieldValue, ValueKind::Flag),
        field(&["props", "manufacturer"], |m| m.manufacturer.as_ref(), ExtraLabel::FieldValue, ValueKind::Flag),
        field(&["props", "inUse"], |m| m.in_use.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "temperature"], |m| m.temperature.as_ref(), ExtraLabel::None, ValueKind::Numeric),
        field(&["props", "working"], |m| m.working.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "scheduleOverride"], |m| m.schedule_override.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "autoBoost", "target"], |m| m.auto_boost_target.as_ref(), ExtraLabel::None, ValueKind::Numeric),
        field(&["props", "autoBoost", "active"], |m| m.auto_boost_active.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "autoBoost", "duration"], |m| m.auto_boost_duration.as_ref(), ExtraLabel::None, ValueKind::Numeric),
        field(&["props", "holidayMode", "active"], |m| m.holiday_mode_active.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "holidayMode", "enabled"], |m| m.holiday_mode_enabled.as_ref(), ExtraLabel::None, ValueKind::Flag),
    ],
};

pub static TRV: MappingTable = MappingTable {
    handles: |product_type| product_type == TRV_TYPE,
    fields: &[
        field(&["state", "target"], |m| m.trv_target.as_ref(), ExtraLabel::None, ValueKind::Numeric),
        field(&["state", "mode"], |m| m.trv_mode.as_ref(), ExtraLabel::FieldValue, ValueKind::Flag),
        field(&["props", "autoBoost", "target"], |m| m.trv_auto_boost_target.as_ref(), ExtraLabel::None, ValueKind::Numeric),
        field(&["props", "working"], |m| m.trv_working.as_ref(), ExtraLabel::None, ValueKind::Flag),
        field(&["props", "temperature"], |m| m.trv_temperature.as_ref(), ExtraLabel::None, ValueKind::Numeric),
    ],
};

pub fn table_for(mapping: ProductMapping) -> &'static MappingTable {
    match mapping {
        ProductMapping::General => &GENERAL,
        ProductMapping::Trv => &TRV,
    }
}

/// Updates the product gauges for one product and returns how many gauges
/// were written.
///
/// Products the selected table does not handle, and products without a
/// `state`, are skipped with `Ok(0)`.
pub fn map_product(
    metrics: &HiveMetrics,
    mapping: ProductMapping,
    home: &Value,
    product: &Value,
) -> Result<usize> {
    let table = table_for(mapping);
    let product_type = product.get("type").and_then(Value::as_str).unwrap_or_default();
    if !(table.handles)(product_type) {
        debug!("Skipping product type {:?} under {:?} mapping", product_type, mapping);
        return Ok(0);
    }

    let Some(state) = product.get("state") else {
        return Ok(0);
    };
    let labels = EntityLabels::new(home, product, require(state, "name", "product state")?)?;
    let group = if truthy_field(state, "isGroup").is_some() {
        "true"
    } else {
        "false"
    };

    let mut updates = 0;
    for row in table.fields {
        let Some(value) = lookup(product, row.path) else {
            continue;
        };

        let sample = match row.value {
            ValueKind::Flag => 1.0,
            ValueKind::Numeric => gauge_value(value, &row.path.join("."))?,
        };

        let extra = match row.extra {
            ExtraLabel::None => None,
            ExtraLabel::FieldValue => Some(label_value(value)),
            ExtraLabel::GroupFlag => Some(group.to_string()),
        };
        let label_values = match &extra {
            Some(extra) => labels.with(extra),
            None => labels.base(),
        };

        metrics.set_gauge((row.gauge)(metrics), &label_values, sample);
        updates += 1;
    }

    Ok(updates)
}
