// Console HTTP client
//
// Wraps `reqwest::Client` with console URL construction and status
// classification. Endpoint modules (auth, devices, telemetry) are
// implemented as inherent methods in separate files so this module
// stays focused on transport mechanics.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Path prefix every console endpoint lives under.
const CONSOLE_PREFIX: &str = "doggoconsole";

/// Raw HTTP client for the doggo console API.
///
/// Bound to one base endpoint, one timeout, and at most one bearer token.
/// It never changes after construction: a new endpoint, timeout, or token
/// means a new client.
#[derive(Debug)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    authenticated: bool,
}

impl ConsoleClient {
    /// Create a client for `base_url` from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
            authenticated: transport.bearer_token.is_some(),
        })
    }

    /// The console base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout this client was built with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a bearer token is attached to outgoing requests.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{base}/doggoconsole/{path}`, tolerant of a trailing slash on base.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{CONSOLE_PREFIX}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Issue one request and parse the 2xx body as `T`.
    ///
    /// Exactly one attempt; the client timeout bounds it.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.classify_send(e))?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        self.request::<T, ()>(Method::GET, path, query, None).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// A send error never carries a status: either the request could not be
    /// built, or nothing came back in time.
    fn classify_send(&self, err: reqwest::Error) -> Error {
        if err.is_builder() {
            Error::Transport(err)
        } else {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
                reason: err.to_string(),
            }
        }
    }

    /// The client timeout also bounds the body read.
    fn classify_body(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
                reason: err.to_string(),
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    preview(&body).to_owned()
                },
            });
        }

        let body = resp.text().await.map_err(|e| self.classify_body(e))?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::TlsMode;

    fn client(base: &str) -> ConsoleClient {
        ConsoleClient::new(
            Url::parse(base).unwrap(),
            &TransportConfig::new(Duration::from_secs(5), TlsMode::System),
        )
        .unwrap()
    }

    #[test]
    fn url_joins_console_prefix() {
        let c = client("https://console.example.com");
        assert_eq!(
            c.url("SmartPole/GetDeviceListByAsset").unwrap().as_str(),
            "https://console.example.com/doggoconsole/SmartPole/GetDeviceListByAsset"
        );
    }

    #[test]
    fn url_keeps_base_path_and_trims_slashes() {
        let c = client("https://example.com/api/");
        assert_eq!(
            c.url("/Authentication/Login").unwrap().as_str(),
            "https://example.com/api/doggoconsole/Authentication/Login"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= 200);
        assert!(body.starts_with(cut));
    }

    #[test]
    fn client_without_bearer_is_anonymous() {
        let c = client("https://example.com");
        assert!(!c.is_authenticated());
        assert_eq!(c.timeout(), Duration::from_secs(5));
    }
}
