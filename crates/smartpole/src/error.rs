//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use smartpole_config::ConfigError;
use smartpole_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration ({field}): {reason}")]
    #[diagnostic(
        code(smartpole::config_invalid),
        help(
            "Write the connection settings with: smartpole config init\n\
             Or inspect them with: smartpole config show"
        )
    )]
    ConfigInvalid { field: String, reason: String },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(smartpole::validation))]
    Validation { field: String, reason: String },

    #[error("Failed to save configuration: {message}")]
    #[diagnostic(
        code(smartpole::persistence),
        help("Check that the config directory is writable.")
    )]
    Persistence { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(smartpole::auth_failed),
        help(
            "Verify the username and password.\n\
             Run: smartpole config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Session rejected by the console")]
    #[diagnostic(
        code(smartpole::unauthorized),
        help("The token expired or was revoked. Run the command again to log in anew.")
    )]
    Unauthorized,

    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Could not reach the console: {detail}")]
    #[diagnostic(
        code(smartpole::connection_failed),
        help(
            "Check that the console is reachable from this host.\n\
             Try: smartpole test-connection -v"
        )
    )]
    ConnectionFailed { detail: String },

    #[error("Console did not respond within {seconds}s")]
    #[diagnostic(
        code(smartpole::timeout),
        help("Raise the timeout with: smartpole config set --timeout <SECONDS>")
    )]
    Timeout { seconds: u64 },

    #[error("Unexpected response from the console: {message}")]
    #[diagnostic(code(smartpole::malformed_response))]
    MalformedResponse { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(smartpole::not_found),
        help("List what is configured with: smartpole {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── General ──────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(smartpole::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(smartpole::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigInvalid { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::AuthFailed { .. } | Self::Unauthorized => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Persistence { .. }
            | Self::MalformedResponse { .. }
            | Self::Io(_)
            | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversion from CoreError ────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigurationInvalid { field, reason } => {
                Self::ConfigInvalid { field, reason }
            }
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Unauthorized => Self::Unauthorized,
            CoreError::Timeout { timeout_secs, .. } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Transport { detail, .. } => Self::ConnectionFailed { detail },
            CoreError::MalformedResponse { message } => Self::MalformedResponse { message },
            CoreError::NotFound { entity, id } => {
                let list_command = if entity == "Device" {
                    "devices <ASSET> --all".into()
                } else {
                    "assets --all".into()
                };
                Self::NotFound {
                    resource_type: entity,
                    identifier: id,
                    list_command,
                }
            }
            CoreError::Persistence { message } => Self::Persistence { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CoreError::from(err).into()
    }
}
