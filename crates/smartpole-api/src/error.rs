use thiserror::Error;

/// Top-level error type for the `smartpole-api` crate.
///
/// Classifies every failure of a console call by what the caller can do
/// about it. `smartpole-core` maps these onto its error kinds.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by the console (`success: false` or HTTP 401 on login).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP 401 on an authenticated call. The bearer token is stale.
    #[error("Unauthorized -- bearer token rejected")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// No HTTP status could be obtained: connect failure or request timeout.
    #[error("No response within {timeout_secs}s: {reason}")]
    Timeout { timeout_secs: u64, reason: String },

    /// Non-2xx status other than 401.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Lower-level reqwest failure (request build, body read).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Console envelope ────────────────────────────────────────────
    /// The console answered 2xx but reported `success: false`.
    #[error("Console API error: {message}")]
    Api { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
