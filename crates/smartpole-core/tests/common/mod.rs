// Shared fixtures for the core integration suites.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartpole_core::{
    Asset, ConnectionSettings, CoreError, CredentialStore, Dashboard, Device, MemoryStore,
    PasswordCipher, SyncConfig, TlsVerification,
};

/// Stores passwords as `enc:<plaintext>`.
pub struct PrefixCipher;

impl PasswordCipher for PrefixCipher {
    fn encrypt(&self, plaintext: &SecretString) -> Result<String, CoreError> {
        Ok(format!("enc:{}", plaintext.expose_secret()))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CoreError> {
        ciphertext
            .strip_prefix("enc:")
            .map(|p| SecretString::from(p.to_owned()))
            .ok_or_else(|| CoreError::ConfigurationInvalid {
                field: "password".into(),
                reason: "not encrypted".into(),
            })
    }
}

pub fn connection(server: &MockServer) -> ConnectionSettings {
    ConnectionSettings {
        endpoint: server.uri(),
        username: "operator".into(),
        password: "enc:s3cret".into(),
        timeout_secs: 1,
        tls: TlsVerification::SystemDefaults,
    }
}

pub fn config(server: &MockServer, assets: Vec<Asset>) -> SyncConfig {
    SyncConfig {
        connection: connection(server),
        assets,
    }
}

pub fn dashboard(config: SyncConfig) -> (Dashboard, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(config));
    let dashboard = Dashboard::new(
        Arc::clone(&store) as Arc<dyn CredentialStore>,
        Arc::new(PrefixCipher),
    );
    (dashboard, store)
}

/// One enabled asset with an air device (301) and a pH device (302).
pub fn pole_asset() -> Asset {
    let mut asset = Asset::discovered("12", "North Pole");
    asset.devices = vec![
        Device::discovered("301", "Air Sensor"),
        Device::discovered("302", "pH Probe"),
    ];
    asset
}

pub fn login_body(token: &str, assets: &[(i64, &str)]) -> Value {
    let assets: Vec<Value> = assets
        .iter()
        .map(|(id, name)| json!({ "assetId": id, "name": name }))
        .collect();
    json!({
        "success": true,
        "message": "",
        "authHeader": { "token": token, "assets": assets }
    })
}

pub async fn mount_login(server: &MockServer, token: &str, assets: &[(i64, &str)]) {
    Mock::given(method("POST"))
        .and(path("/doggoconsole/Authentication/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token, assets)))
        .mount(server)
        .await;
}

pub fn device_list(devices: &[(i64, &str)]) -> Value {
    let devices: Vec<Value> = devices
        .iter()
        .map(|(id, name)| json!({ "deviceId": id, "deviceName": name }))
        .collect();
    json!({ "success": true, "message": "", "devices": devices })
}

pub async fn mount_devices(server: &MockServer, asset_id: i64, devices: &[(i64, &str)]) {
    Mock::given(method("GET"))
        .and(path("/doggoconsole/SmartPole/GetDeviceListByAsset"))
        .and(query_param("assetId", asset_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_list(devices)))
        .mount(server)
        .await;
}

pub fn air_payload() -> Value {
    json!({ "co": 1, "no2": 2, "so2": 3, "humidity": 40, "temperature": 25 })
}

pub const AIR_PATH: &str = "/doggoconsole/TBData/GetAirSensorDataByDeviceId";
pub const POLE_PATH: &str = "/doggoconsole/TBData/GetPoleSensorDataByDeviceId";

/// Longer than the 1s client timeout in [`connection`].
pub const SLOW: Duration = Duration::from_secs(3);
