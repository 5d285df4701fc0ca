//! API credential resolution
//!
//! Token mode hands back the configured token without touching the network.
//! Login mode makes exactly one call to the session endpoint; any failure is
//! final for the run.

use argocd_api::{SessionReply, SessionRequest};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{AuthSettings, Config};
use crate::error::AuthError;
use crate::source::SessionTransport;

/// Bearer token for the Argo CD API. Lives for one run, never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    /// The raw token, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Resolves the credential for a run
pub struct CredentialProvider<'a> {
    transport: &'a dyn SessionTransport,
}

impl<'a> CredentialProvider<'a> {
    pub fn new(transport: &'a dyn SessionTransport) -> Self {
        CredentialProvider { transport }
    }

    /// Produce a usable credential for the configured auth mode.
    pub async fn resolve(&self, config: &Config) -> Result<Credential, AuthError> {
        match &config.auth {
            AuthSettings::Token(token) => {
                debug!("using pre-issued Argo CD API token");
                Ok(Credential::new(token.as_str()))
            }
            AuthSettings::Login { username, password } => {
                info!(server = %config.server, username = %username, "logging in to Argo CD");
                let reply = self
                    .transport
                    .exchange(&SessionRequest::new(username, password))
                    .await
                    .map_err(AuthError::Transport)?;
                parse_login_reply(&reply)
            }
        }
    }
}

/// Interpret a session endpoint reply.
///
/// The status code is checked first, so a rejected login is reported as
/// such whatever the body holds.
pub fn parse_login_reply(reply: &SessionReply) -> Result<Credential, AuthError> {
    if !reply.is_success() {
        warn!(status = reply.status, "Argo CD rejected the login request");
        return Err(AuthError::Rejected {
            status: reply.status,
        });
    }

    let response: LoginResponse =
        serde_json::from_str(&reply.body).map_err(AuthError::MalformedResponse)?;

    match response.token {
        Some(token) if !token.is_empty() => Ok(Credential::new(token)),
        _ => Err(AuthError::EmptyToken),
    }
}
