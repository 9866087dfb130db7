// Console telemetry endpoints
//
// Latest-reading lookups. Completeness of the payload is not judged here;
// only an explicit `success: false` is treated as an error.

use tracing::debug;

use crate::console::client::ConsoleClient;
use crate::console::models::{AirSensorData, PoleSensorData};
use crate::error::Error;

impl ConsoleClient {
    /// Latest reading of a single air sensor.
    ///
    /// `GET /doggoconsole/TBData/GetAirSensorDataByDeviceId?deviceId={id}`
    pub async fn air_sensor_data(&self, device_id: i64) -> Result<AirSensorData, Error> {
        debug!(device_id, "fetching air sensor data");
        let data: AirSensorData = self
            .get(
                "TBData/GetAirSensorDataByDeviceId",
                &[("deviceId", device_id.to_string())],
            )
            .await?;
        reject_unsuccessful(data.success, data.message.as_deref())?;
        Ok(data)
    }

    /// Latest combined air + water reading of a pole.
    ///
    /// `GET /doggoconsole/TBData/GetPoleSensorDataByDeviceId?airDeviceId={a}&waterDeviceId={w}`
    pub async fn pole_sensor_data(
        &self,
        air_device_id: i64,
        water_device_id: i64,
    ) -> Result<PoleSensorData, Error> {
        debug!(air_device_id, water_device_id, "fetching pole sensor data");
        let data: PoleSensorData = self
            .get(
                "TBData/GetPoleSensorDataByDeviceId",
                &[
                    ("airDeviceId", air_device_id.to_string()),
                    ("waterDeviceId", water_device_id.to_string()),
                ],
            )
            .await?;
        reject_unsuccessful(data.air.success, data.air.message.as_deref())?;
        Ok(data)
    }
}

fn reject_unsuccessful(success: Option<bool>, message: Option<&str>) -> Result<(), Error> {
    if success == Some(false) {
        return Err(Error::Api {
            message: message.unwrap_or("sensor data unavailable").to_owned(),
        });
    }
    Ok(())
}
