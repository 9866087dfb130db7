// ── Runtime sync configuration ──
//
// What the core reads from (and hands back to) the credential store:
// connection settings plus the local asset/device tree. Core never touches
// disk; `smartpole-config` owns the file format.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::credentials::PasswordCipher;
use crate::error::CoreError;
use crate::model::Asset;

/// Upper bound for the per-request timeout.
pub const MAX_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsVerification {
    /// Bundled root store (strict).
    #[default]
    SystemDefaults,
    /// Additional CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed consoles).
    DangerAcceptInvalid,
}

/// Console connection settings as stored. `password` is ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    pub tls: TlsVerification,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            tls: TlsVerification::default(),
        }
    }
}

/// Everything the core needs from the credential store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub connection: ConnectionSettings,
    pub assets: Vec<Asset>,
}

/// A validated connection with the password decrypted.
///
/// Only obtainable through [`SyncConfig::resolve`], so holding one means
/// the configuration invariants hold.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub endpoint: Url,
    pub username: String,
    pub password: SecretString,
    pub timeout: Duration,
    pub tls: TlsVerification,
}

impl SyncConfig {
    /// Parse the endpoint as an absolute http(s) URL.
    pub fn endpoint_url(&self) -> Result<Url, CoreError> {
        let raw = self.connection.endpoint.trim();
        if raw.is_empty() {
            return Err(CoreError::invalid("endpoint", "endpoint is required"));
        }
        let url = Url::parse(raw)
            .map_err(|e| CoreError::invalid("endpoint", format!("invalid URL '{raw}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(CoreError::invalid(
                "endpoint",
                format!("'{raw}' is not an absolute http(s) URL"),
            ));
        }
        Ok(url)
    }

    /// Check every invariant and decrypt the password.
    pub fn resolve(&self, cipher: &dyn PasswordCipher) -> Result<ResolvedConnection, CoreError> {
        let endpoint = self.endpoint_url()?;

        let conn = &self.connection;
        if conn.username.trim().is_empty() {
            return Err(CoreError::invalid("username", "username is required"));
        }
        if conn.timeout_secs == 0 || conn.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(CoreError::invalid(
                "timeout_secs",
                format!(
                    "must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {}",
                    conn.timeout_secs
                ),
            ));
        }
        if conn.password.is_empty() {
            return Err(CoreError::invalid("password", "password is required"));
        }

        let password = cipher.decrypt(&conn.password)?;
        if password.expose_secret().is_empty() {
            return Err(CoreError::invalid("password", "password is required"));
        }

        Ok(ResolvedConnection {
            endpoint,
            username: conn.username.clone(),
            password,
            timeout: Duration::from_secs(conn.timeout_secs),
            tls: conn.tls.clone(),
        })
    }

    /// Boolean form of [`resolve`](Self::resolve).
    pub fn is_valid(&self, cipher: &dyn PasswordCipher) -> bool {
        self.resolve(cipher).is_ok()
    }

    pub fn asset(&self, asset_id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == asset_id)
    }

    pub fn asset_mut(&mut self, asset_id: &str) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.id == asset_id)
    }
}
