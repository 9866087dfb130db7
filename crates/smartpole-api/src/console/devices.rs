// Console device inventory endpoints

use tracing::debug;

use crate::console::client::ConsoleClient;
use crate::console::models::{DeviceListResponse, RemoteDevice};
use crate::error::Error;

impl ConsoleClient {
    /// List the devices registered under one asset.
    ///
    /// `GET /doggoconsole/SmartPole/GetDeviceListByAsset?assetId={id}`
    pub async fn device_list_by_asset(&self, asset_id: i64) -> Result<Vec<RemoteDevice>, Error> {
        debug!(asset_id, "listing devices");
        let resp: DeviceListResponse = self
            .get(
                "SmartPole/GetDeviceListByAsset",
                &[("assetId", asset_id.to_string())],
            )
            .await?;

        if resp.success {
            Ok(resp.devices)
        } else {
            Err(Error::Api {
                message: resp
                    .message
                    .unwrap_or_else(|| format!("device list for asset {asset_id} unavailable")),
            })
        }
    }
}
