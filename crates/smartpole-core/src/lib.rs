//! Session lifecycle, inventory sync, and telemetry fallback for the
//! doggo console.
//!
//! - **[`Dashboard`]**: facade over everything below. Reads the
//!   configuration from a [`CredentialStore`] on each call.
//!
//! - **[`SessionManager`]**: login state machine. The bearer token and the
//!   client carrying it live in one immutable [`Session`] swapped
//!   atomically; concurrent callers share a single in-flight login.
//!
//! - **[`DeviceAssetSync`]**: fetches device lists per asset and merges them
//!   into the local tree without clobbering user overrides.
//!
//! - **[`Telemetry`]**: serves the latest [`Reading`] per [`MetricGroup`],
//!   degrading to the last complete one on any failure.

pub mod config;
pub mod convert;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod session;
pub mod sync;
pub mod telemetry;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    ConnectionSettings, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS, ResolvedConnection, SyncConfig,
    TlsVerification,
};
pub use credentials::{ConfigWriter, CredentialStore, MemoryStore, PasswordCipher};
pub use dashboard::{ConnectionReport, Dashboard};
pub use error::{CoreError, ErrorKind};
pub use session::{Session, SessionManager, SessionState};
pub use sync::{AssetSyncError, DeviceAssetSync, SyncReport, merge_inventory};
pub use telemetry::{Telemetry, TelemetryCache};

pub use model::{
    Asset, DEFAULT_INTERVAL_MS, Device, DeviceRole, LatestReading, Metric, MetricGroup, Reading,
    RoleMatcher,
};
