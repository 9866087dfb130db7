// ── API-to-domain type conversions ──
//
// Bridges `smartpole_api` wire payloads into `crate::model` types. Null
// metrics become absent entries; completeness is judged later by
// `Reading::is_complete`.

use smartpole_api::{AirSensorData, PoleSensorData};

use crate::model::{Metric, MetricGroup, Reading};

// ── Telemetry ──────────────────────────────────────────────────────

fn with_air_metrics(reading: Reading, data: &AirSensorData) -> Reading {
    reading
        .with_metric(Metric::Co, data.co)
        .with_metric(Metric::No2, data.no2)
        .with_metric(Metric::So2, data.so2)
        .with_metric(Metric::Humidity, data.humidity)
        .with_metric(Metric::Temperature, data.temperature)
        .with_metric(Metric::Pm25, data.pm25)
        .with_metric(Metric::Pm10, data.pm10)
}

impl From<AirSensorData> for Reading {
    fn from(data: AirSensorData) -> Self {
        let mut reading = with_air_metrics(Reading::new(MetricGroup::Air), &data);
        reading.success = data.success.unwrap_or(true);
        reading.message = data.message.filter(|m| !m.is_empty());
        reading
    }
}

impl From<PoleSensorData> for Reading {
    fn from(data: PoleSensorData) -> Self {
        let mut reading = with_air_metrics(Reading::new(MetricGroup::AirWater), &data.air)
            .with_metric(Metric::Ph, data.ph);
        reading.success = data.air.success.unwrap_or(true);
        reading.message = data.air.message.filter(|m| !m.is_empty());
        reading
    }
}
