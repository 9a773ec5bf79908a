//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the Hive exporter.
//!
//! # Metric Categories
//!
//! ## Devices (hubs, sensors, boilers)
//! - Connectivity, firmware version, model and power source
//! - Signal strength and battery level
//! - Firmware upgrade availability and status
//!
//! ## Products (general mapping)
//! - Mode, brightness, target temperature
//! - Motion, in-use, working and override flags
//! - Auto-boost and holiday-mode settings
//!
//! ## Products (TRV mapping)
//! - `hive_trv_*` target, mode, boost target, working flag and temperature
//!
//! ## Exporter
//! - `hive_up`, last poll timestamp and poll duration
//!
//! Entity metrics carry the labels `home_id, home_name, type, id, name`,
//! plus one extra label for metrics whose value is a string (version, model,
//! power, status, mode, manufacturer) or that need a group flag.
//!
//! All metrics use the `hive_` namespace prefix.

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Labels shared by every device and product metric.
pub const ENTITY_LABELS: [&str; 5] = ["home_id", "home_name", "type", "id", "name"];

const NAMESPACE: &str = "hive";

/// Metrics registry for the Hive exporter
///
/// Created once at startup and shared by clone; every handle is an `Arc`.
#[derive(Clone)]
pub struct HiveMetrics {
    registry: Arc<Registry>,

    // Device metrics
    pub online: Arc<GaugeVec>,
    pub version: Arc<GaugeVec>,
    pub model: Arc<GaugeVec>,
    pub power: Arc<GaugeVec>,
    pub signal: Arc<GaugeVec>,
    pub battery: Arc<GaugeVec>,
    pub upgrade_available: Arc<GaugeVec>,
    pub upgrading: Arc<GaugeVec>,
    pub upgrade_status: Arc<GaugeVec>,

    // Product metrics (general mapping)
    pub mode: Arc<GaugeVec>,
    pub brightness: Arc<GaugeVec>,
    pub target: Arc<GaugeVec>,
    pub motion: Arc<GaugeVec>,
    pub manufacturer: Arc<GaugeVec>,
    pub in_use: Arc<GaugeVec>,
    pub temperature: Arc<GaugeVec>,
    pub working: Arc<GaugeVec>,
    pub schedule_override: Arc<GaugeVec>,
    pub auto_boost_target: Arc<GaugeVec>,
    pub auto_boost_active: Arc<GaugeVec>,
    pub auto_boost_duration: Arc<GaugeVec>,
    pub holiday_mode_active: Arc<GaugeVec>,
    pub holiday_mode_enabled: Arc<GaugeVec>,

    // Product metrics (TRV mapping)
    pub trv_target: Arc<GaugeVec>,
    pub trv_mode: Arc<GaugeVec>,
    pub trv_auto_boost_target: Arc<GaugeVec>,
    pub trv_working: Arc<GaugeVec>,
    pub trv_temperature: Arc<GaugeVec>,

    // Actions
    pub action_enabled: Arc<GaugeVec>,

    // Exporter
    pub up: Arc<Gauge>,
    pub last_poll_timestamp_seconds: Arc<Gauge>,
    pub poll_duration_seconds: Arc<Gauge>,
}

/// Builds a gauge labeled by [`ENTITY_LABELS`] and an optional extra label.
fn entity_gauge(name: &str, help: &str, extra: Option<&str>) -> prometheus::Result<GaugeVec> {
    let mut labels = ENTITY_LABELS.to_vec();
    labels.extend(extra);
    GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &labels)
}

impl HiveMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Device metrics
        let online = entity_gauge("online", "Device connectivity (1=online, 0=offline)", None)?;
        let version = entity_gauge("version", "Device firmware version (value is always 1)", Some("version"))?;
        let model = entity_gauge("model", "Entity model (value is always 1)", Some("model"))?;
        let power = entity_gauge("power", "Device power source (value is always 1)", Some("power"))?;
        let signal = entity_gauge("signal", "Device signal strength", None)?;
        let battery = entity_gauge("battery", "Device battery level", None)?;
        let upgrade_available = entity_gauge(
            "upgrade_available",
            "Firmware upgrade available (1=yes, 0=no)",
            None,
        )?;
        let upgrading = entity_gauge("upgrading", "Firmware upgrade in progress (1=yes, 0=no)", None)?;
        let upgrade_status = entity_gauge(
            "upgrade_status",
            "Last reported firmware upgrade status (value is always 1)",
            Some("status"),
        )?;

        // Product metrics (general mapping)
        let mode = entity_gauge("mode", "Product mode (value is always 1)", Some("mode"))?;
        let brightness = entity_gauge("brightness", "Light brightness", Some("group"))?;
        let target = entity_gauge("target", "Target temperature", None)?;
        let motion = entity_gauge("motion", "Motion detected", None)?;
        let manufacturer = entity_gauge(
            "manufacturer",
            "Product manufacturer (value is always 1)",
            Some("manufacturer"),
        )?;
        let in_use = entity_gauge("in_use", "Product in use", None)?;
        let temperature = entity_gauge("temperature", "Measured temperature", None)?;
        let working = entity_gauge("working", "Product actively working (e.g. heating)", None)?;
        let schedule_override = entity_gauge("schedule_override", "Schedule overridden", None)?;
        let auto_boost_target = entity_gauge("auto_boost_target", "Auto-boost target temperature", None)?;
        let auto_boost_active = entity_gauge("auto_boost_active", "Auto-boost active", None)?;
        let auto_boost_duration = entity_gauge("auto_boost_duration", "Auto-boost duration", None)?;
        let holiday_mode_active = entity_gauge("holiday_mode_active", "Holiday mode active", None)?;
        let holiday_mode_enabled = entity_gauge("holiday_mode_enabled", "Holiday mode enabled", None)?;

        // Product metrics (TRV mapping)
        let trv_target = entity_gauge("trv_target", "TRV target temperature", None)?;
        let trv_mode = entity_gauge("trv_mode", "TRV mode (value is always 1)", Some("mode"))?;
        let trv_auto_boost_target = entity_gauge(
            "trv_auto_boost_target",
            "TRV auto-boost target temperature",
            None,
        )?;
        let trv_working = entity_gauge("trv_working", "TRV actively heating", None)?;
        let trv_temperature = entity_gauge("trv_temperature", "TRV measured temperature", None)?;

        // Actions
        let action_enabled = GaugeVec::new(
            Opts::new("action_enabled", "Action enabled (1=enabled, 0=disabled)")
                .namespace(NAMESPACE),
            &["home_id", "home_name", "id", "name"],
        )?;

        // Exporter
        let up = Gauge::with_opts(
            Opts::new("up", "Whether the last poll of the Hive API succeeded").namespace(NAMESPACE),
        )?;
        let last_poll_timestamp_seconds = Gauge::with_opts(
            Opts::new(
                "last_poll_timestamp_seconds",
                "Unix timestamp of the last successful poll",
            )
            .namespace(NAMESPACE),
        )?;
        let poll_duration_seconds = Gauge::with_opts(
            Opts::new("poll_duration_seconds", "Duration of the last poll cycle")
                .namespace(NAMESPACE),
        )?;

        let vecs = [
            &online,
            &version,
            &model,
            &power,
            &signal,
            &battery,
            &upgrade_available,
            &upgrading,
            &upgrade_status,
            &mode,
            &brightness,
            &target,
            &motion,
            &manufacturer,
            &in_use,
            &temperature,
            &working,
            &schedule_override,
            &auto_boost_target,
            &auto_boost_active,
            &auto_boost_duration,
            &holiday_mode_active,
            &holiday_mode_enabled,
            &trv_target,
            &trv_mode,
            &trv_auto_boost_target,
            &trv_working,
            &trv_temperature,
            &action_enabled,
        ];
        for gauge in vecs {
            registry.register(Box::new(gauge.clone()))?;
        }
        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(last_poll_timestamp_seconds.clone()))?;
        registry.register(Box::new(poll_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            online: Arc::new(online),
            version: Arc::new(version),
            model: Arc::new(model),
            power: Arc::new(power),
            signal: Arc::new(signal),
            battery: Arc::new(battery),
            upgrade_available: Arc::new(upgrade_available),
            upgrading: Arc::new(upgrading),
            upgrade_status: Arc::new(upgrade_status),
            mode: Arc::new(mode),
            brightness: Arc::new(brightness),
            target: Arc::new(target),
            motion: Arc::new(motion),
            manufacturer: Arc::new(manufacturer),
            in_use: Arc::new(in_use),
            temperature: Arc::new(temperature),
            working: Arc::new(working),
            schedule_override: Arc::new(schedule_override),
            auto_boost_target: Arc::new(auto_boost_target),
            auto_boost_active: Arc::new(auto_boost_active),
            auto_boost_duration: Arc::new(auto_boost_duration),
            holiday_mode_active: Arc::new(holiday_mode_active),
            holiday_mode_enabled: Arc::new(holiday_mode_enabled),
            trv_target: Arc::new(trv_target),
            trv_mode: Arc::new(trv_mode),
            trv_auto_boost_target: Arc::new(trv_auto_boost_target),
            trv_working: Arc::new(trv_working),
            trv_temperature: Arc::new(trv_temperature),
            action_enabled: Arc::new(action_enabled),
            up: Arc::new(up),
            last_poll_timestamp_seconds: Arc::new(last_poll_timestamp_seconds),
            poll_duration_seconds: Arc::new(poll_duration_seconds),
        })
    }

    /// Set a labeled gauge to a value
    pub fn set_gauge(&self, gauge: &GaugeVec, labels: &[&str], value: f64) {
        gauge.with_label_values(labels).set(value);
    }

    /// Set a labeled gauge to 1 or 0
    pub fn set_bool_metric(&self, gauge: &GaugeVec, labels: &[&str], value: bool) {
        self.set_gauge(gauge, labels, if value { 1.0 } else { 0.0 });
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
