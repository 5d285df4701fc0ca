//! Application state as seen by one poll.

use chrono::{DateTime, Utc};

/// Sync status reported by Argo CD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    OutOfSync,
    Unknown,
    Other(String),
}

impl SyncState {
    pub fn as_str(&self) -> &str {
        match self {
            SyncState::Synced => "Synced",
            SyncState::OutOfSync => "OutOfSync",
            SyncState::Unknown => "Unknown",
            SyncState::Other(s) => s,
        }
    }
}

impl From<&str> for SyncState {
    fn from(s: &str) -> Self {
        match s {
            "Synced" => SyncState::Synced,
            "OutOfSync" => SyncState::OutOfSync,
            "Unknown" | "" => SyncState::Unknown,
            other => SyncState::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health status reported by Argo CD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Progressing,
    Degraded,
    Suspended,
    Missing,
    Unknown,
    Other(String),
}

impl HealthState {
    pub fn as_str(&self) -> &str {
        match self {
            HealthState::Healthy => "Healthy",
            HealthState::Progressing => "Progressing",
            HealthState::Degraded => "Degraded",
            HealthState::Suspended => "Suspended",
            HealthState::Missing => "Missing",
            HealthState::Unknown => "Unknown",
            HealthState::Other(s) => s,
        }
    }
}

impl From<&str> for HealthState {
    fn from(s: &str) -> Self {
        match s {
            "Healthy" => HealthState::Healthy,
            "Progressing" => HealthState::Progressing,
            "Degraded" => HealthState::Degraded,
            "Suspended" => HealthState::Suspended,
            "Missing" => HealthState::Missing,
            "Unknown" | "" => HealthState::Unknown,
            other => HealthState::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync, health and deployed revision of an application at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub sync: SyncState,
    pub health: HealthState,
    pub revision: String,
}

impl StatusSnapshot {
    pub fn new(sync: &str, health: &str, revision: &str) -> Self {
        StatusSnapshot {
            sync: SyncState::from(sync),
            health: HealthState::from(health),
            revision: revision.to_string(),
        }
    }

    /// Synced and Healthy: the status half of every promotion rule.
    pub fn is_synced_and_healthy(&self) -> bool {
        self.sync == SyncState::Synced && self.health == HealthState::Healthy
    }
}

impl From<&argocd_api::Application> for StatusSnapshot {
    fn from(app: &argocd_api::Application) -> Self {
        StatusSnapshot::new(
            &app.status.sync.status,
            &app.status.health.status,
            &app.status.sync.revision,
        )
    }
}

/// Commit metadata for a revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionMetadata {
    pub revision: String,
    pub message: String,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl RevisionMetadata {
    pub fn new(revision: &str, message: &str) -> Self {
        RevisionMetadata {
            revision: revision.to_string(),
            message: message.to_string(),
            author: None,
            date: None,
        }
    }

    pub fn from_api(revision: &str, meta: argocd_api::RevisionMetadata) -> Self {
        RevisionMetadata {
            revision: revision.to_string(),
            message: meta.message,
            author: Some(meta.author).filter(|a| !a.is_empty()),
            date: meta.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parsing() {
        assert_eq!(SyncState::from("Synced"), SyncState::Synced);
        assert_eq!(SyncState::from("OutOfSync"), SyncState::OutOfSync);
        assert_eq!(SyncState::from(""), SyncState::Unknown);
        assert_eq!(SyncState::from("synced"), SyncState::Other("synced".to_string()));

        assert_eq!(HealthState::from("Healthy"), HealthState::Healthy);
        assert_eq!(HealthState::from("Degraded"), HealthState::Degraded);
        assert_eq!(HealthState::from("Weird").to_string(), "Weird");
    }

    #[test]
    fn test_synced_and_healthy_needs_both() {
        assert!(StatusSnapshot::new("Synced", "Healthy", "abc").is_synced_and_healthy());
        assert!(!StatusSnapshot::new("OutOfSync", "Healthy", "abc").is_synced_and_healthy());
        assert!(!StatusSnapshot::new("Synced", "Progressing", "abc").is_synced_and_healthy());
    }

    #[test]
    fn test_snapshot_from_application() {
        let app: argocd_api::Application = serde_json::from_str(
            r#"{"status": {"sync": {"status": "OutOfSync", "revision": "def456"},
                           "health": {"status": "Progressing"}}}"#,
        )
        .unwrap();
        let snapshot = StatusSnapshot::from(&app);
        assert_eq!(snapshot, StatusSnapshot::new("OutOfSync", "Progressing", "def456"));
    }

    #[test]
    fn test_metadata_from_api_drops_empty_author() {
        let meta = RevisionMetadata::from_api(
            "abc123",
            argocd_api::RevisionMetadata {
                message: "JIRA-42 release".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(meta.revision, "abc123");
        assert_eq!(meta.message, "JIRA-42 release");
        assert!(meta.author.is_none());
    }
}
