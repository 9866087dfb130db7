// ── Core error types ──
//
// Consumers never see reqwest errors or raw HTTP statuses. The
// `From<smartpole_api::Error>` impl folds wire failures into the handful
// of kinds the session, sync, and telemetry paths branch on.

use strum::Display;
use thiserror::Error;

/// Classification callers match on to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Missing or malformed endpoint, credentials, or timeout. Blocks
    /// every core operation until fixed; no network attempt is made.
    ConfigurationInvalid,
    /// Login rejected by the console.
    AuthenticationFailure,
    /// 401 on an authenticated call: the session is stale.
    Unauthorized,
    /// No response within the configured timeout.
    Timeout,
    /// Any other non-2xx or connection-level failure.
    TransportError,
    /// Body did not parse to the expected shape.
    MalformedResponse,
    /// Configured asset or device does not exist.
    NotFound,
    /// Writing the configuration back failed.
    Persistence,
}

/// Unified error type for the core crate.
///
/// `Clone` so one login outcome can be handed to every caller that waited
/// on it.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("Invalid configuration ({field}): {reason}")]
    ConfigurationInvalid { field: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session rejected by the console (HTTP 401)")]
    Unauthorized,

    #[error("Console did not respond within {timeout_secs}s: {reason}")]
    Timeout { timeout_secs: u64, reason: String },

    #[error("Transport error: {detail}")]
    Transport { status: Option<u16>, detail: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Failed to persist configuration: {message}")]
    Persistence { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationInvalid { .. } => ErrorKind::ConfigurationInvalid,
            Self::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailure,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_owned(),
            id: id.to_owned(),
        }
    }
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<smartpole_api::Error> for CoreError {
    fn from(err: smartpole_api::Error) -> Self {
        use smartpole_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::Unauthorized => Self::Unauthorized,
            Api::Timeout {
                timeout_secs,
                reason,
            } => Self::Timeout {
                timeout_secs,
                reason,
            },
            Api::Http { status, message } => Self::Transport {
                status: Some(status),
                detail: format!("HTTP {status}: {message}"),
            },
            // Timeouts already arrive as `Api::Timeout` with the client's limit.
            Api::Transport(e) => Self::Transport {
                status: e.status().map(|s| s.as_u16()),
                detail: e.to_string(),
            },
            Api::InvalidUrl(e) => Self::invalid("endpoint", e.to_string()),
            Api::Tls(msg) => Self::invalid("tls", msg),
            Api::Api { message } => Self::Transport {
                status: None,
                detail: message,
            },
            Api::Deserialization { message, body: _ } => Self::MalformedResponse { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_errors_map_to_kinds() {
        let cases = [
            (
                smartpole_api::Error::Authentication {
                    message: "nope".into(),
                },
                ErrorKind::AuthenticationFailure,
            ),
            (smartpole_api::Error::Unauthorized, ErrorKind::Unauthorized),
            (
                smartpole_api::Error::Timeout {
                    timeout_secs: 5,
                    reason: "deadline".into(),
                },
                ErrorKind::Timeout,
            ),
            (
                smartpole_api::Error::Http {
                    status: 500,
                    message: "boom".into(),
                },
                ErrorKind::TransportError,
            ),
            (
                smartpole_api::Error::Deserialization {
                    message: "eof".into(),
                    body: String::new(),
                },
                ErrorKind::MalformedResponse,
            ),
            (
                smartpole_api::Error::Tls("bad pem".into()),
                ErrorKind::ConfigurationInvalid,
            ),
        ];

        for (wire, kind) in cases {
            assert_eq!(CoreError::from(wire).kind(), kind);
        }
    }

    #[test]
    fn http_status_is_kept() {
        let err = CoreError::from(smartpole_api::Error::Http {
            status: 502,
            message: "bad gateway".into(),
        });
        match err {
            CoreError::Transport { status, detail } => {
                assert_eq!(status, Some(502));
                assert!(detail.contains("bad gateway"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn timeout_keeps_configured_seconds() {
        let err = CoreError::from(smartpole_api::Error::Timeout {
            timeout_secs: 7,
            reason: "operation timed out".into(),
        });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 7, .. }));
        assert!(err.to_string().contains("within 7s"));
    }
}
