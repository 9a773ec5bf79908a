//! Poll cycle tests against a scripted Hive API

mod common;

use common::{create_test_metrics, home, labels, FakeHive};
use hive_exporter::collectors::{poll, PollSummary};
use hive_exporter::config::{PollingConfig, ProductMapping};
use serde_json::json;

fn polling(mapping: ProductMapping, collect_actions: bool) -> PollingConfig {
    PollingConfig {
        interval_seconds: 60,
        product_mapping: mapping,
        collect_actions,
    }
}

#[tokio::test]
async fn test_refresh_happens_once_before_any_fetch() {
    // Given: An account with one home
    let client = FakeHive::with_homes(vec![home()]);
    let metrics = create_test_metrics();

    // When: Running one poll cycle
    poll(&client, &metrics, &polling(ProductMapping::Trv, false))
        .await
        .unwrap();

    // Then: refresh is the first call and happens exactly once
    let calls = client.calls();
    assert_eq!(calls[0], "refresh");
    assert_eq!(calls.iter().filter(|c| *c == "refresh").count(), 1);
    assert_eq!(
        calls,
        vec![
            "refresh",
            "GET nodes/all?",
            "GET devices?homeId=h1&",
            "GET products?homeId=h1&",
        ]
    );
}

#[tokio::test]
async fn test_empty_home_performs_no_updates() {
    // Given: A home with no devices and no products
    let client = FakeHive::with_homes(vec![home()]);
    let metrics = create_test_metrics();
    let before = metrics.render().unwrap();

    // When: Polling
    let summary = poll(&client, &metrics, &polling(ProductMapping::General, false))
        .await
        .unwrap();

    // Then: The cycle succeeds and nothing changes
    assert_eq!(
        summary,
        PollSummary {
            homes: 1,
            ..PollSummary::default()
        }
    );
    assert_eq!(metrics.render().unwrap(), before);
}

#[tokio::test]
async fn test_devices_and_products_are_mapped_per_home() {
    let client = FakeHive::with_homes(vec![home()])
        .respond(
            "devices",
            "h1",
            json!([{
                "id": "d1",
                "type": "hub",
                "state": {"name": "Hub"},
                "props": {"online": true, "version": "1.2", "model": "X", "power": "mains"}
            }]),
        )
        .respond(
            "products",
            "h1",
            json!([
                {"type": "trvcontrol", "id": "p1", "state": {"name": "TRV", "target": 21}, "props": {}},
                {"type": "heating", "id": "p2", "state": {"name": "Heating", "target": 19}}
            ]),
        );
    let metrics = create_test_metrics();

    let summary = poll(&client, &metrics, &polling(ProductMapping::Trv, false))
        .await
        .unwrap();

    assert_eq!(summary.devices, 1);
    assert_eq!(summary.products, 2);
    assert_eq!(summary.product_updates, 1);
    assert_eq!(metrics.online.with_label_values(&labels("hub", "d1", "Hub")).get(), 1.0);
    assert_eq!(
        metrics
            .trv_target
            .with_label_values(&labels("trvcontrol", "p1", "TRV"))
            .get(),
        21.0
    );
    assert!(!metrics.render().unwrap().contains("id=\"p2\""));
}

#[tokio::test]
async fn test_bad_device_does_not_abort_cycle() {
    // Given: A home whose first device lacks required props
    let client = FakeHive::with_homes(vec![home()]).respond(
        "devices",
        "h1",
        json!([
            {"id": "bad", "type": "hub", "state": {"name": "Broken"}},
            {
                "id": "d2",
                "type": "boilermodule",
                "state": {"name": "Boiler"},
                "props": {"online": true, "version": "2", "model": "BM", "power": "mains"}
            }
        ]),
    );
    let metrics = create_test_metrics();

    // When: Polling
    let summary = poll(&client, &metrics, &polling(ProductMapping::Trv, false))
        .await
        .unwrap();

    // Then: The bad device is counted as failed and the next one is mapped
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.devices, 1);
    assert_eq!(
        metrics
            .online
            .with_label_values(&labels("boilermodule", "d2", "Boiler"))
            .get(),
        1.0
    );
}

#[tokio::test]
async fn test_fetch_failure_aborts_cycle_and_keeps_old_values() {
    // Given: Gauges set by a previous successful cycle
    let metrics = create_test_metrics();
    let device = json!([{
        "id": "d1",
        "type": "hub",
        "state": {"name": "Hub"},
        "props": {"online": true, "version": "1.2", "model": "X", "power": "mains", "battery": 90}
    }]);
    let healthy = FakeHive::with_homes(vec![home()]).respond("devices", "h1", device.clone());
    poll(&healthy, &metrics, &polling(ProductMapping::Trv, false))
        .await
        .unwrap();

    // When: The next cycle fails fetching products
    let failing = FakeHive::with_homes(vec![home()])
        .respond("devices", "h1", device)
        .fail("products");
    let result = poll(&failing, &metrics, &polling(ProductMapping::Trv, false)).await;

    // Then: The error propagates and earlier values are still exposed
    assert!(result.is_err());
    assert_eq!(metrics.battery.with_label_values(&labels("hub", "d1", "Hub")).get(), 90.0);
}

#[tokio::test]
async fn test_homes_failure_happens_after_refresh() {
    let client = FakeHive::default().fail("nodes/all");
    let metrics = create_test_metrics();

    let result = poll(&client, &metrics, &polling(ProductMapping::Trv, false)).await;

    assert!(result.is_err());
    assert_eq!(client.calls(), vec!["refresh", "GET nodes/all?"]);
}

#[tokio::test]
async fn test_actions_only_fetched_when_enabled() {
    let client = FakeHive::with_homes(vec![home()]).respond(
        "actions",
        "h1",
        json!([{"id": "a1", "name": "Morning", "enabled": true}]),
    );
    let metrics = create_test_metrics();

    poll(&client, &metrics, &polling(ProductMapping::Trv, false))
        .await
        .unwrap();
    assert!(!client.calls().iter().any(|c| c.starts_with("GET actions")));

    let summary = poll(&client, &metrics, &polling(ProductMapping::Trv, true))
        .await
        .unwrap();
    assert_eq!(summary.actions, 1);
    assert!(client.calls().contains(&"GET actions?homeId=h1&".to_string()));
    assert_eq!(
        metrics
            .action_enabled
            .with_label_values(&["h1", "Home", "a1", "Morning"])
            .get(),
        1.0
    );
}

#[tokio::test]
async fn test_every_home_is_polled() {
    let client = FakeHive::with_homes(vec![
        json!({"id": "h1", "name": "Home"}),
        json!({"id": "h2", "name": "Cabin"}),
    ]);
    let metrics = create_test_metrics();

    let summary = poll(&client, &metrics, &polling(ProductMapping::General, false))
        .await
        .unwrap();

    assert_eq!(summary.homes, 2);
    let calls = client.calls();
    assert!(calls.contains(&"GET devices?homeId=h2&".to_string()));
    assert!(calls.contains(&"GET products?homeId=h2&".to_string()));
}

#[tokio::test]
async fn test_home_without_id_is_skipped() {
    // Given: A home record without an id ahead of a valid home
    let client = FakeHive::with_homes(vec![json!({"name": "Broken"}), home()]).respond(
        "devices",
        "h1",
        json!([{
            "id": "d1",
            "type": "hub",
            "state": {"name": "Hub"},
            "props": {"online": true, "version": "1.2", "model": "X", "power": "mains"}
        }]),
    );
    let metrics = create_test_metrics();

    // When: Polling
    let summary = poll(&client, &metrics, &polling(ProductMapping::Trv, false))
        .await
        .unwrap();

    // Then: The broken home is counted as failed and the valid one is polled
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.homes, 1);
    assert_eq!(
        client.calls(),
        vec![
            "refresh",
            "GET nodes/all?",
            "GET devices?homeId=h1&",
            "GET products?homeId=h1&",
        ]
    );
    assert_eq!(metrics.online.with_label_values(&labels("hub", "d1", "Hub")).get(), 1.0);
}
