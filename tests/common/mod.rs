//! Shared test helpers: a scripted in-memory Hive API.

#![allow(dead_code)]

use hive_exporter::error::{ExporterError, Result};
use hive_exporter::hive::HiveApi;
use hive_exporter::metrics::HiveMetrics;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub const BASE_URL: &str = "http://hive.test/1.0";

pub fn create_test_metrics() -> HiveMetrics {
    HiveMetrics::new().expect("Failed to create metrics")
}

pub fn home() -> Value {
    json!({"id": "h1", "name": "Home"})
}

/// Labels for an entity in [`home`].
pub fn labels<'a>(entity_type: &'a str, id: &'a str, name: &'a str) -> Vec<&'a str> {
    vec!["h1", "Home", entity_type, id, name]
}

pub fn labels_with<'a>(entity_type: &'a str, id: &'a str, name: &'a str, extra: &'a str) -> Vec<&'a str> {
    let mut labels = labels(entity_type, id, name);
    labels.push(extra);
    labels
}

/// In-memory `HiveApi` answering from canned JSON and recording every call.
#[derive(Default)]
pub struct FakeHive {
    pub homes: Vec<Value>,
    /// Responses keyed by `"{path}:{home_id}"`, e.g. `"devices:h1"`
    pub responses: HashMap<String, Value>,
    /// Paths that fail with an API error
    pub failing: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeHive {
    pub fn with_homes(homes: Vec<Value>) -> Self {
        Self {
            homes,
            ..Self::default()
        }
    }

    pub fn respond(mut self, path: &str, home_id: &str, body: Value) -> Self {
        self.responses.insert(format!("{path}:{home_id}"), body);
        self
    }

    pub fn fail(mut self, path: &str) -> Self {
        self.failing.push(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl HiveApi for FakeHive {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn refresh_tokens(&self) -> Result<()> {
        self.record("refresh".to_string());
        Ok(())
    }

    async fn request(&self, method: Method, url: &str) -> Result<Value> {
        let relative = url
            .strip_prefix(BASE_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(url);
        self.record(format!("{method} {relative}"));

        let (path, query) = relative.split_once('?').unwrap_or((relative, ""));
        if self.failing.iter().any(|p| p == path) {
            return Err(ExporterError::HiveApi(format!("500 from {url}")));
        }

        if path == "nodes/all" {
            return Ok(json!({"homes": {"homes": self.homes}}));
        }

        let home_id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("homeId="))
            .unwrap_or_default();
        Ok(self
            .responses
            .get(&format!("{path}:{home_id}"))
            .cloned()
            .unwrap_or_else(|| json!([])))
    }
}
