// smartpole-api: Async Rust client for the doggo console telemetry API
//
// Wire-level only: URL construction, bearer auth header, envelope checks,
// and HTTP status classification. Session lifecycle and caching live in
// `smartpole-core`.

pub mod console;
pub mod error;
pub mod transport;

pub use console::ConsoleClient;
pub use console::models::{
    AirSensorData, AuthHeader, PoleSensorData, RemoteAsset, RemoteDevice,
};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
