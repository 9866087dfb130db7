// ── Dashboard facade ──
//
// Single entry point for consumers (the CLI, or an embedding service).
// Reads the configuration from the credential store on every call, so
// edits made through the store are picked up without a restart.

use std::sync::Arc;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConnectionSettings, SyncConfig};
use crate::credentials::{ConfigWriter, CredentialStore, PasswordCipher};
use crate::error::CoreError;
use crate::model::{Asset, Device, LatestReading, MetricGroup, RoleMatcher};
use crate::session::{SessionManager, SessionState};
use crate::sync::{DeviceAssetSync, SyncReport};
use crate::telemetry::Telemetry;

/// Result of a successful connection test.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionReport {
    pub endpoint: String,
    pub username: String,
    /// Assets visible to the account.
    pub assets: usize,
}

/// The main entry point for consumers.
///
/// Cheaply cloneable; clones share the session, the inventory sync, and
/// the telemetry cache.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    writer: Arc<ConfigWriter>,
    cipher: Arc<dyn PasswordCipher>,
    sessions: Arc<SessionManager>,
    sync: DeviceAssetSync,
    telemetry: Telemetry,
}

impl Dashboard {
    pub fn new(store: Arc<dyn CredentialStore>, cipher: Arc<dyn PasswordCipher>) -> Self {
        Self::with_roles(store, cipher, RoleMatcher::default())
    }

    /// Like [`new`](Self::new) with a custom device role matcher.
    pub fn with_roles(
        store: Arc<dyn CredentialStore>,
        cipher: Arc<dyn PasswordCipher>,
        roles: RoleMatcher,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(Arc::clone(&cipher)));
        let writer = Arc::new(ConfigWriter::new(store));
        Self {
            inner: Arc::new(DashboardInner {
                sync: DeviceAssetSync::new(Arc::clone(&writer)),
                telemetry: Telemetry::new(Arc::clone(&sessions), roles),
                writer,
                cipher,
                sessions,
            }),
        }
    }

    pub fn config(&self) -> Result<SyncConfig, CoreError> {
        self.inner.writer.get()
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.inner.sessions
    }

    pub fn session_state(&self) -> SessionState {
        self.inner.sessions.state()
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.inner.telemetry
    }

    // ── Session ──────────────────────────────────────────────────

    /// Log in with the stored settings and report what the account sees.
    ///
    /// Always performs a fresh login, even over a cached session.
    pub async fn test_connection(&self) -> Result<ConnectionReport, CoreError> {
        let config = self.config()?;
        let session = self.inner.sessions.refresh(&config).await?;
        Ok(ConnectionReport {
            endpoint: session.bound_endpoint().to_string(),
            username: config.connection.username,
            assets: session.assets().len(),
        })
    }

    // ── Inventory ────────────────────────────────────────────────

    /// Log in afresh, then discover and merge the asset/device tree.
    ///
    /// The login is forced so the asset inventory is the console's current
    /// one, not the list cached with an earlier session.
    pub async fn sync_assets(&self) -> Result<SyncReport, CoreError> {
        let config = self.config()?;
        let session = self.inner.sessions.refresh(&config).await?;
        let report = self.inner.sync.sync(&session).await?;

        if report
            .errors
            .iter()
            .any(|e| matches!(e.error, CoreError::Unauthorized))
        {
            self.inner.sessions.invalidate(&session);
        }
        Ok(report)
    }

    /// Every configured asset, orphaned and disabled ones included.
    pub fn assets(&self) -> Result<Vec<Asset>, CoreError> {
        Ok(self.config()?.assets)
    }

    pub fn enabled_assets(&self) -> Result<Vec<Asset>, CoreError> {
        Ok(self
            .config()?
            .assets
            .into_iter()
            .filter(|a| a.enabled)
            .collect())
    }

    pub fn enabled_devices(&self, asset_id: &str) -> Result<Vec<Device>, CoreError> {
        let config = self.config()?;
        let asset = config
            .asset(asset_id)
            .ok_or_else(|| CoreError::not_found("Asset", asset_id))?;
        Ok(asset.enabled_devices().cloned().collect())
    }

    pub fn set_asset_enabled(&self, asset_id: &str, enabled: bool) -> Result<(), CoreError> {
        self.inner.writer.modify(|config| {
            config
                .asset_mut(asset_id)
                .ok_or_else(|| CoreError::not_found("Asset", asset_id))?
                .enabled = enabled;
            Ok(())
        })?;
        info!(asset_id, enabled, "asset updated");
        Ok(())
    }

    pub fn set_device_enabled(
        &self,
        asset_id: &str,
        device_id: &str,
        enabled: bool,
    ) -> Result<(), CoreError> {
        self.inner.writer.modify(|config| {
            config
                .asset_mut(asset_id)
                .ok_or_else(|| CoreError::not_found("Asset", asset_id))?
                .device_mut(device_id)
                .ok_or_else(|| CoreError::not_found("Device", device_id))?
                .enabled = enabled;
            Ok(())
        })?;
        info!(asset_id, device_id, enabled, "device updated");
        Ok(())
    }

    // ── Connection settings ──────────────────────────────────────

    /// Replace the connection settings.
    ///
    /// With `password` set it is encrypted and replaces the stored one;
    /// otherwise `settings.password` is kept as given (already encrypted).
    /// The result is validated before it is persisted. A changed endpoint
    /// or credential drops the current session on next use.
    pub fn update_connection(
        &self,
        mut settings: ConnectionSettings,
        password: Option<&SecretString>,
    ) -> Result<(), CoreError> {
        if let Some(password) = password {
            settings.password = self.inner.cipher.encrypt(password)?;
        }

        let cipher = &*self.inner.cipher;
        let endpoint = self.inner.writer.modify(|config| {
            config.connection = settings;
            config.resolve(cipher)?;
            Ok(config.connection.endpoint.clone())
        })?;
        info!(endpoint = %endpoint, "connection settings updated");
        Ok(())
    }

    // ── Telemetry ────────────────────────────────────────────────

    pub async fn latest(&self, group: MetricGroup) -> Result<LatestReading, CoreError> {
        self.latest_until(group, &CancellationToken::new()).await
    }

    /// [`latest`](Self::latest), abandoning the request when `cancel` fires.
    pub async fn latest_until(
        &self,
        group: MetricGroup,
        cancel: &CancellationToken,
    ) -> Result<LatestReading, CoreError> {
        let config = match self.config() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "failed to load configuration");
                return Err(e);
            }
        };
        self.inner.telemetry.get_latest(group, &config, cancel).await
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("sessions", &self.inner.sessions)
            .finish_non_exhaustive()
    }
}
