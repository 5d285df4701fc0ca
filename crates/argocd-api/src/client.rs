//! Argo CD REST client
//!
//! Talks to the Argo CD API server over HTTPS (or plain HTTP in insecure
//! mode). Authenticated calls carry the session token as a bearer token.

use crate::error::ApiError;
use crate::types::{Application, ErrorBody, RevisionMetadata, SessionReply, SessionRequest};
use crate::Result;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an unstructured error body kept in `ApiError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Connection settings for an [`ArgoCdClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Argo CD server address, `host[:port]` or a full URL
    pub server: String,
    /// Use plain HTTP for bare addresses and skip TLS certificate verification
    pub insecure: bool,
    /// Upper bound for a single request, connect included
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl ClientOptions {
    pub fn new(server: &str) -> Self {
        ClientOptions {
            server: server.to_string(),
            insecure: false,
            request_timeout: Duration::from_secs(10),
            user_agent: format!("kpcea/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Build the API base URL for a server address.
///
/// Bare addresses get `https://`, or `http://` when `insecure` is set. An
/// address that already names a scheme is taken as-is.
pub fn base_url(server: &str, insecure: bool) -> Result<Url> {
    let raw = if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        let scheme = if insecure { "http" } else { "https" };
        format!("{scheme}://{server}")
    };

    let url = Url::parse(&raw).map_err(|e| ApiError::InvalidServer {
        server: server.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidServer {
            server: server.to_string(),
            reason: "address cannot carry an API path".to_string(),
        });
    }
    Ok(url)
}

/// Client for the Argo CD API server
#[derive(Debug, Clone)]
pub struct ArgoCdClient {
    base_url: Url,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl ArgoCdClient {
    /// Create an unauthenticated client. No network traffic happens here.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let base_url = base_url(&options.server, options.insecure)?;
        let http = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .timeout(options.request_timeout)
            .danger_accept_invalid_certs(options.insecure)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(ArgoCdClient {
            base_url,
            auth_token: None,
            http,
        })
    }

    /// Attach the bearer token used by application calls
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path below the base URL, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidServer {
                server: self.base_url.to_string(),
                reason: "address cannot carry an API path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Exchange username/password for a session token.
    ///
    /// Returns the raw status and body whatever the status code; only
    /// transport failures are errors.
    pub async fn create_session(&self, request: &SessionRequest) -> Result<SessionReply> {
        let url = self.endpoint(&["api", "v1", "session"])?;
        debug!(url = %url, username = %request.username, "requesting Argo CD session");

        let response = self.http.post(url).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(SessionReply { status, body })
    }

    /// Fetch an application by name
    pub async fn get_application(&self, name: &str) -> Result<Application> {
        let url = self.endpoint(&["api", "v1", "applications", name])?;
        self.get_json(url).await
    }

    /// Fetch commit metadata for one revision of an application's source
    pub async fn get_revision_metadata(
        &self,
        name: &str,
        revision: &str,
    ) -> Result<RevisionMetadata> {
        let url = self.endpoint(&[
            "api",
            "v1",
            "applications",
            name,
            "revisions",
            revision,
            "metadata",
        ])?;
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");

        let mut request = self.http.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Pull a readable message out of an error response body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.message.is_empty() {
            return parsed.message;
        }
        if !parsed.error.is_empty() {
            return parsed.error;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "<empty body>".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
