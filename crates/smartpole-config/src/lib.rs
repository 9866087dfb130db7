//! Settings file and password cipher for smartpole.
//!
//! The TOML file holds the console connection and the asset/device tree.
//! [`FileStore`] loads it through figment (defaults, then the file, then
//! `SMARTPOLE_*` environment overrides) and implements the core's
//! [`CredentialStore`]. [`AeadCipher`] implements [`PasswordCipher`].

pub mod cipher;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use smartpole_core::{
    Asset, ConnectionSettings, CoreError, CredentialStore, DEFAULT_TIMEOUT_SECS, SyncConfig,
    TlsVerification,
};

pub use cipher::AeadCipher;

/// Prefix for environment overrides; `__` separates nested keys
/// (`SMARTPOLE_CONNECTION__TIMEOUT_SECS=10`).
pub const ENV_PREFIX: &str = "SMARTPOLE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("cipher error: {0}")]
    Cipher(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::ConfigurationInvalid { field, reason },
            ConfigError::Figment(e) => Self::ConfigurationInvalid {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Cipher(reason) => Self::ConfigurationInvalid {
                field: "password".into(),
                reason,
            },
            other => Self::Persistence {
                message: other.to_string(),
            },
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// On-disk configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub connection: ConnectionSection,

    /// Discovered assets with their local overrides.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionSection {
    /// Console base URL (e.g. "https://console.example.com").
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub username: String,

    /// base64(nonce || ciphertext), see [`AeadCipher`].
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to an extra CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

impl ConnectionSection {
    /// `insecure` and `ca_cert` are alternative TLS policies; a file
    /// naming both is ambiguous and would lose `ca_cert` on the next save.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.insecure && self.ca_cert.is_some() {
            return Err(ConfigError::Validation {
                field: "connection.ca_cert".into(),
                reason: "cannot be combined with insecure = true; remove one of them".into(),
            });
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl From<ConfigFile> for SyncConfig {
    fn from(file: ConfigFile) -> Self {
        let conn = file.connection;
        let tls = if conn.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ca_path) = conn.ca_cert {
            TlsVerification::CustomCa(ca_path)
        } else {
            TlsVerification::SystemDefaults
        };

        Self {
            connection: ConnectionSettings {
                endpoint: conn.endpoint,
                username: conn.username,
                password: conn.password,
                timeout_secs: conn.timeout_secs,
                tls,
            },
            assets: file.assets,
        }
    }
}

impl From<&SyncConfig> for ConfigFile {
    fn from(config: &SyncConfig) -> Self {
        let conn = &config.connection;
        let (insecure, ca_cert) = match &conn.tls {
            TlsVerification::SystemDefaults => (false, None),
            TlsVerification::CustomCa(path) => (false, Some(path.clone())),
            TlsVerification::DangerAcceptInvalid => (true, None),
        };

        Self {
            connection: ConnectionSection {
                endpoint: conn.endpoint.clone(),
                username: conn.username.clone(),
                password: conn.password.clone(),
                timeout_secs: conn.timeout_secs,
                insecure,
                ca_cert,
            },
            assets: config.assets.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "smartpole", "smartpole").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("smartpole");
    p
}

// ── FileStore ───────────────────────────────────────────────────────

/// TOML-backed [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `explicit`, or at the platform default location.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        Self::new(explicit.unwrap_or_else(config_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load defaults, then the file (if present), then the environment.
    pub fn load(&self) -> Result<ConfigFile, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(ConfigFile::default()))
            .merge(Toml::file(&self.path))
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["CONFIG", "CIPHER_KEY"])
                    .split("__"),
            );

        let config: ConfigFile = figment.extract()?;
        config.connection.validate()?;
        debug!(path = %self.path.display(), assets = config.assets.len(), "configuration loaded");
        Ok(config)
    }

    /// Serialize to TOML and replace the file.
    ///
    /// Written to a sibling temp file first, then renamed over the target.
    pub fn save(&self, config: &ConfigFile) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let toml_str = toml::to_string_pretty(config)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        std::fs::write(&tmp, toml_str)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Result<SyncConfig, CoreError> {
        Ok(self.load()?.into())
    }

    fn persist(&self, config: &SyncConfig) -> Result<(), CoreError> {
        Ok(self.save(&ConfigFile::from(config))?)
    }
}
