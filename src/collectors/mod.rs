//! Metrics Collectors
//!
//! This module maps Hive JSON snapshots onto the gauges in
//! [`HiveMetrics`](crate::metrics::HiveMetrics).
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Take one home record and one entity record as `serde_json::Value`
//! - Build the entity label tuple `(home_id, home_name, type, id, name)`
//! - Set each gauge whose source field passes the guard
//! - Return `Err(ExporterError::Mapping)` when a required field is missing;
//!   the poll cycle logs it and moves on to the next entity
//!
//! # Guards
//!
//! Optional fields use a falsy guard: `null`, `false`, `0`, `""`, `[]` and
//! `{}` all count as absent and leave the gauge at its previous value. A
//! device reporting `battery: 0` therefore keeps its last non-zero reading.

use crate::error::{ExporterError, Result};
use serde_json::Value;

pub mod action;
pub mod device;
pub mod poll;
pub mod product;

pub use action::map_action;
pub use device::map_device;
pub use poll::{poll, PollSummary};
pub use product::map_product;

/// Falsy-guard truthiness of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// `value.key` if present and truthy.
pub fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| truthy(v))
}

/// Follows `path` from `root`, returning the leaf if it exists and is truthy.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| truthy_field(node, key))
}

/// `value.key`, or a mapping error naming the field and its context.
pub fn require<'a>(value: &'a Value, key: &str, context: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| ExporterError::Mapping(format!("missing field `{key}` in {context}")))
}

/// Renders a JSON value as a label value: strings verbatim, everything else
/// in its JSON form.
pub fn label_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts a JSON value to a gauge sample.
///
/// Numbers map directly, booleans to 1/0, and numeric strings are parsed.
pub fn gauge_value(value: &Value, field: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ExporterError::Mapping(format!("`{field}` is not numeric: {value}")))
}

/// The label tuple shared by every metric of one device or product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityLabels {
    values: [String; 5],
}

impl EntityLabels {
    /// Build labels from a home record, an entity record and its display name.
    pub fn new(home: &Value, entity: &Value, name: &Value) -> Result<Self> {
        Ok(Self {
            values: [
                label_value(require(home, "id", "home")?),
                label_value(require(home, "name", "home")?),
                label_value(require(entity, "type", "entity")?),
                label_value(require(entity, "id", "entity")?),
                label_value(name),
            ],
        })
    }

    pub fn id(&self) -> &str {
        &self.values[3]
    }

    /// The five base labels.
    pub fn base(&self) -> Vec<&str> {
        self.values.iter().map(String::as_str).collect()
    }

    /// The base labels followed by one extra label value.
    pub fn with<'a>(&'a self, extra: &'a str) -> Vec<&'a str> {
        let mut labels = self.base();
        labels.push(extra);
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!truthy(&value), "{value} should be falsy");
        }
    }

    #[test]
    fn truthy_values() {
        for value in [json!(true), json!(1), json!(-3.5), json!("x"), json!([0]), json!({"a": 0})] {
            assert!(truthy(&value), "{value} should be truthy");
        }
    }

    #[test]
    fn lookup_stops_at_falsy_parent() {
        let doc = json!({"props": {"autoBoost": {}, "holidayMode": {"active": true}}});
        assert_eq!(lookup(&doc, &["props", "autoBoost", "target"]), None);
        assert_eq!(
            lookup(&doc, &["props", "holidayMode", "active"]),
            Some(&json!(true))
        );
    }

    #[test]
    fn label_values_render_json_scalars() {
        assert_eq!(label_value(&json!("hub")), "hub");
        assert_eq!(label_value(&json!(42)), "42");
        assert_eq!(label_value(&json!(true)), "true");
    }

    #[test]
    fn gauge_values() {
        assert_eq!(gauge_value(&json!(80), "signal").unwrap(), 80.0);
        assert_eq!(gauge_value(&json!(19.5), "temperature").unwrap(), 19.5);
        assert_eq!(gauge_value(&json!(true), "working").unwrap(), 1.0);
        assert_eq!(gauge_value(&json!("21"), "target").unwrap(), 21.0);
        assert!(gauge_value(&json!("warm"), "target").is_err());
        assert!(gauge_value(&json!({"a": 1}), "target").is_err());
    }

    #[test]
    fn entity_labels_require_home_and_entity_ids() {
        let home = json!({"id": "h1", "name": "Home"});
        let entity = json!({"type": "hub", "id": "d1"});
        let labels = EntityLabels::new(&home, &entity, &json!("Hub")).unwrap();
        assert_eq!(labels.base(), vec!["h1", "Home", "hub", "d1", "Hub"]);
        assert_eq!(labels.with("1.2"), vec!["h1", "Home", "hub", "d1", "Hub", "1.2"]);

        let err = EntityLabels::new(&json!({"id": "h1"}), &entity, &json!("Hub")).unwrap_err();
        assert!(err.to_string().contains("missing field `name` in home"));
    }
}
