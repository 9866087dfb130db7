// Console authentication
//
// Username/password login returning a bearer token. The token is not
// stored here: the caller builds a new authenticated client around it.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::console::client::ConsoleClient;
use crate::console::models::{AuthHeader, LoginRequest, LoginResponse};
use crate::error::Error;

impl ConsoleClient {
    /// Authenticate with the console.
    ///
    /// `POST /doggoconsole/Authentication/Login`
    ///
    /// A 2xx answer with `success: false` is a rejected login, and so is
    /// HTTP 401 on this endpoint. Every other failure keeps its transport
    /// classification.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AuthHeader, Error> {
        debug!(username, "logging in");

        let body = LoginRequest::new(username, password.expose_secret());
        let resp: LoginResponse = self
            .post("Authentication/Login", &body)
            .await
            .map_err(|e| match e {
                Error::Unauthorized => Error::Authentication {
                    message: "credentials rejected (HTTP 401)".into(),
                },
                other => other,
            })?;

        if !resp.success {
            return Err(Error::Authentication {
                message: resp
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "login rejected".into()),
            });
        }

        let header = resp.auth_header.ok_or_else(|| Error::Deserialization {
            message: "login succeeded without an authHeader".into(),
            body: String::new(),
        })?;

        if header.token.expose_secret().is_empty() {
            return Err(Error::Deserialization {
                message: "login succeeded with an empty token".into(),
                body: String::new(),
            });
        }

        debug!(assets = header.assets.len(), "login successful");
        Ok(header)
    }
}
