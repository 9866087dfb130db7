// ── Telemetry readings ──

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A single measured quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Metric {
    Co,
    No2,
    So2,
    Humidity,
    Temperature,
    Pm25,
    Pm10,
    Ph,
}

/// Which payload a reading came from, and which metrics make it complete.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MetricGroup {
    /// Single air-quality device.
    Air,
    /// Air device plus water (pH) device on the same asset.
    AirWater,
}

const AIR_METRICS: &[Metric] = &[
    Metric::Co,
    Metric::No2,
    Metric::So2,
    Metric::Humidity,
    Metric::Temperature,
];

const AIR_WATER_METRICS: &[Metric] = &[
    Metric::Co,
    Metric::No2,
    Metric::So2,
    Metric::Humidity,
    Metric::Temperature,
    Metric::Ph,
];

impl MetricGroup {
    pub fn required_metrics(self) -> &'static [Metric] {
        match self {
            Self::Air => AIR_METRICS,
            Self::AirWater => AIR_WATER_METRICS,
        }
    }
}

/// One polled telemetry payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub group: MetricGroup,
    /// Present metrics only; absent ones are simply missing.
    pub metrics: BTreeMap<Metric, f64>,
    pub success: bool,
    pub message: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(group: MetricGroup) -> Self {
        Self {
            group,
            metrics: BTreeMap::new(),
            success: true,
            message: None,
            observed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric, value: Option<f64>) -> Self {
        if let Some(value) = value {
            self.metrics.insert(metric, value);
        }
        self
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    pub fn missing_metrics(&self) -> Vec<Metric> {
        self.group
            .required_metrics()
            .iter()
            .copied()
            .filter(|m| !self.metrics.contains_key(m))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.group
            .required_metrics()
            .iter()
            .all(|m| self.metrics.contains_key(m))
    }
}

/// What `latest` hands back to callers.
///
/// `data` is the fresh reading when `stale` is false, otherwise the last
/// complete one (or `None` if nothing has been observed yet).
#[derive(Debug, Clone, Serialize)]
pub struct LatestReading {
    pub group: MetricGroup,
    pub success: bool,
    pub stale: bool,
    pub message: Option<String>,
    pub data: Option<Arc<Reading>>,
}

impl LatestReading {
    pub(crate) fn fresh(reading: Arc<Reading>) -> Self {
        Self {
            group: reading.group,
            success: true,
            stale: false,
            message: reading.message.clone(),
            data: Some(reading),
        }
    }

    pub(crate) fn stale(
        group: MetricGroup,
        cached: Option<Arc<Reading>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            group,
            success: true,
            stale: true,
            message: Some(message.into()),
            data: cached,
        }
    }
}
