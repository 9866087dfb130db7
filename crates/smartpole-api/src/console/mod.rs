// Doggo console API client
//
// Endpoint groups (auth, devices, telemetry) are implemented as inherent
// methods on `ConsoleClient` in separate files.

pub mod auth;
pub mod client;
pub mod devices;
pub mod models;
pub mod telemetry;

pub use client::ConsoleClient;
