// Console API wire types
//
// These mirror the JSON shapes the console sends and expects. They are
// deliberately loose (most fields defaulted / optional); `smartpole-core`
// decides what counts as a usable payload.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

// ── Authentication ──────────────────────────────────────────────────

/// Login body. The device identity fields are fixed placeholders: the
/// console requires them but does not act on them for dashboard clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub client_ver: &'static str,
    pub device_id: &'static str,
    pub device_type: &'static str,
    pub device_ver: &'static str,
    pub device_manufacturer: &'static str,
    pub device_model: &'static str,
    pub device_name: &'static str,
}

impl<'a> LoginRequest<'a> {
    pub(crate) fn new(username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            password,
            client_ver: env!("CARGO_PKG_VERSION"),
            device_id: "smartpole-dashboard",
            device_type: "web",
            device_ver: "1",
            device_manufacturer: "smartpole",
            device_model: "dashboard",
            device_name: "smartpole-dashboard",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub auth_header: Option<AuthHeader>,
}

/// Successful login payload: the bearer token plus the asset inventory
/// visible to the account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthHeader {
    pub token: SecretString,
    #[serde(default)]
    pub assets: Vec<RemoteAsset>,
}

/// An asset as the console reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    pub asset_id: i64,
    #[serde(default)]
    pub name: String,
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub devices: Vec<RemoteDevice>,
}

/// A device as the console reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDevice {
    pub device_id: i64,
    #[serde(default)]
    pub device_name: String,
}

// ── Telemetry ───────────────────────────────────────────────────────

/// `GetAirSensorDataByDeviceId` payload. Any metric may be null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirSensorData {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub co: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
}

/// `GetPoleSensorDataByDeviceId` payload: air metrics plus water pH.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoleSensorData {
    #[serde(flatten)]
    pub air: AirSensorData,
    #[serde(default, rename = "pH", alias = "ph")]
    pub ph: Option<f64>,
}
