//! Wire types for the subset of the Argo CD API used by KPCEA.
//!
//! Every field is defaulted: Argo CD omits empty fields from its JSON, and a
//! freshly created application may not carry a sync or health block yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/session`.
#[derive(Clone, Serialize)]
pub struct SessionRequest {
    pub username: String,
    pub password: String,
}

impl SessionRequest {
    pub fn new(username: &str, password: &str) -> Self {
        SessionRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl std::fmt::Debug for SessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Raw reply of the session endpoint: status code plus the unparsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReply {
    pub status: u16,
    pub body: String,
}

impl SessionReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        SessionReply {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An Argo CD `Application`, reduced to the fields KPCEA reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationStatus {
    #[serde(default)]
    pub sync: SyncStatus,
    #[serde(default)]
    pub health: HealthStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncStatus {
    /// "Synced", "OutOfSync" or "Unknown"
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub revision: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthStatus {
    /// "Healthy", "Progressing", "Degraded", "Suspended", "Missing" or "Unknown"
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Commit metadata for one revision of an application's source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetadata {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub signature_info: Option<String>,
}

/// Error body returned by the Argo CD API gateway.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}
