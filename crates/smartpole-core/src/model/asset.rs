// ── Asset and device domain types ──

use serde::{Deserialize, Serialize};

/// Polling interval given to newly discovered assets and devices.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// A remote-registered site grouping devices, with local overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Remote-assigned, stable.
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// Absent from the latest discovery.
    #[serde(default, skip_serializing_if = "is_false")]
    pub orphaned: bool,
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// A sensor unit belonging to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub orphaned: bool,
}

impl Asset {
    /// A freshly discovered asset: enabled, default interval, no devices.
    pub fn discovered(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            interval_ms: DEFAULT_INTERVAL_MS,
            orphaned: false,
            devices: Vec::new(),
        }
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    pub fn device_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.id == device_id)
    }

    pub fn enabled_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.enabled)
    }
}

impl Device {
    pub fn discovered(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            interval_ms: DEFAULT_INTERVAL_MS,
            orphaned: false,
        }
    }

    /// Numeric id as the telemetry endpoints expect it.
    pub fn remote_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }
}
