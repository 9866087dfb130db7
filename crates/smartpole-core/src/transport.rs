// ── Transport binding ──
//
// The (endpoint, timeout, TLS) triple a console client is built for.
// Clients are immutable; whenever the binding changes a new one is built
// and swapped in, carrying the current bearer token when the session
// survives the change.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use smartpole_api::{ConsoleClient, TlsMode, TransportConfig};

use crate::config::{ResolvedConnection, TlsVerification};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub endpoint: Url,
    pub timeout: Duration,
    pub tls: TlsVerification,
}

impl Binding {
    pub fn from_connection(conn: &ResolvedConnection) -> Self {
        Self {
            endpoint: conn.endpoint.clone(),
            timeout: conn.timeout,
            tls: conn.tls.clone(),
        }
    }

    /// Build a client for this binding, authenticated when `token` is set.
    pub fn build(&self, token: Option<&SecretString>) -> Result<Arc<ConsoleClient>, CoreError> {
        let mut transport = TransportConfig::new(self.timeout, tls_to_transport(&self.tls));
        if let Some(token) = token {
            transport = transport.with_bearer(token.clone());
        }
        let client = ConsoleClient::new(self.endpoint.clone(), &transport)?;
        Ok(Arc::new(client))
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
