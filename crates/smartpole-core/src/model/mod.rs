// ── Domain model ──
//
// Local view of the console inventory plus the telemetry readings served
// to callers. Wire shapes live in `smartpole_api::console::models`;
// `crate::convert` maps between the two.

pub mod asset;
pub mod reading;
pub mod role;

pub use asset::{Asset, DEFAULT_INTERVAL_MS, Device};
pub use reading::{LatestReading, Metric, MetricGroup, Reading};
pub use role::{DeviceRole, RoleMatcher};
