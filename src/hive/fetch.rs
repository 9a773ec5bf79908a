//! Resource fetchers
//!
//! One GET per call against a fixed endpoint template. No retries and no
//! pagination; transport and decode errors are returned unchanged.

use crate::error::{ExporterError, Result};
use crate::hive::client::HiveApi;
use reqwest::Method;
use serde_json::Value;

/// Builds `{base}/{path}?` with an optional `homeId={id}&` query.
pub fn endpoint_url(base_url: &str, path: &str, home_id: Option<&str>) -> String {
    let mut url = format!("{}/{}?", base_url.trim_end_matches('/'), path);
    if let Some(home_id) = home_id.filter(|id| !id.is_empty()) {
        url.push_str(&format!("homeId={home_id}&"));
    }
    url
}

fn into_list(endpoint: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ExporterError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            reason: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

async fn get_list<C: HiveApi>(client: &C, path: &str, home_id: Option<&str>) -> Result<Vec<Value>> {
    let url = endpoint_url(client.base_url(), path, home_id);
    let body = client.request(Method::GET, &url).await?;
    into_list(path, body)
}

/// All homes on the account, from `nodes/all` (`homes.homes`).
pub async fn get_homes<C: HiveApi>(client: &C) -> Result<Vec<Value>> {
    let url = endpoint_url(client.base_url(), "nodes/all", None);
    let mut body = client.request(Method::GET, &url).await?;
    let homes = body
        .get_mut("homes")
        .and_then(|homes| homes.get_mut("homes"))
        .map(Value::take)
        .ok_or_else(|| ExporterError::UnexpectedResponse {
            endpoint: "nodes/all".to_string(),
            reason: "missing homes.homes".to_string(),
        })?;
    into_list("nodes/all", homes)
}

pub async fn get_devices<C: HiveApi>(client: &C, home_id: Option<&str>) -> Result<Vec<Value>> {
    get_list(client, "devices", home_id).await
}

pub async fn get_products<C: HiveApi>(client: &C, home_id: Option<&str>) -> Result<Vec<Value>> {
    get_list(client, "products", home_id).await
}

pub async fn get_actions<C: HiveApi>(client: &C, home_id: Option<&str>) -> Result<Vec<Value>> {
    get_list(client, "actions", home_id).await
}
