//! In-memory fakes for the capability traits (testing only)
//!
//! `ScriptedStatusSource` and `FakeSessionTransport` stand in for a live
//! Argo CD server and count every call made against them.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use argocd_api::{ApiError, SessionReply, SessionRequest};
use async_trait::async_trait;

use crate::error::FetchError;
use crate::snapshot::{RevisionMetadata, StatusSnapshot};
use crate::source::{SessionTransport, StatusSource};

// ---------------------------------------------------------------------------
// ScriptedStatusSource
// ---------------------------------------------------------------------------

/// Status source replaying a fixed script of poll results.
///
/// Each `fetch_status` consumes the next scripted entry; the last entry
/// repeats once the script runs out. An empty script fails every fetch.
#[derive(Debug, Default)]
pub struct ScriptedStatusSource {
    statuses: Mutex<VecDeque<Result<StatusSnapshot, String>>>,
    metadata: Mutex<HashMap<String, Result<String, String>>>,
    status_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl ScriptedStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a successful poll
    pub fn then_status(self, sync: &str, health: &str, revision: &str) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Ok(StatusSnapshot::new(sync, health, revision)));
        self
    }

    /// Append a failed poll
    pub fn then_error(self, message: &str) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Commit message returned for `revision`
    pub fn with_metadata(self, revision: &str, message: &str) -> Self {
        self.metadata
            .lock()
            .unwrap()
            .insert(revision.to_string(), Ok(message.to_string()));
        self
    }

    /// Make the metadata fetch for `revision` fail
    pub fn with_metadata_error(self, revision: &str, message: &str) -> Self {
        self.metadata
            .lock()
            .unwrap()
            .insert(revision.to_string(), Err(message.to_string()));
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedStatusSource {
    async fn fetch_status(&self, _app_name: &str) -> Result<StatusSnapshot, FetchError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        match next {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(FetchError::Unavailable(message)),
            None => Err(FetchError::Unavailable("no scripted status".to_string())),
        }
    }

    async fn fetch_revision_metadata(
        &self,
        _app_name: &str,
        revision: &str,
    ) -> Result<RevisionMetadata, FetchError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let metadata = self.metadata.lock().unwrap();
        match metadata.get(revision) {
            Some(Ok(message)) => Ok(RevisionMetadata::new(revision, message)),
            Some(Err(message)) => Err(FetchError::Unavailable(message.clone())),
            None => {
                let message = format!("revision {revision} not found");
                Err(FetchError::Unavailable(message))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FakeSessionTransport
// ---------------------------------------------------------------------------

/// Session endpoint returning one canned reply (or transport error).
#[derive(Debug)]
pub struct FakeSessionTransport {
    reply: Result<SessionReply, String>,
    calls: AtomicUsize,
    last_username: Mutex<Option<String>>,
}

impl FakeSessionTransport {
    /// Answer every exchange with `status` and `body`
    pub fn replying(status: u16, body: &str) -> Self {
        FakeSessionTransport {
            reply: Ok(SessionReply::new(status, body)),
            calls: AtomicUsize::new(0),
            last_username: Mutex::new(None),
        }
    }

    /// Fail every exchange at the transport level
    pub fn failing(message: &str) -> Self {
        FakeSessionTransport {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_username: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_username(&self) -> Option<String> {
        self.last_username.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionTransport for FakeSessionTransport {
    async fn exchange(&self, request: &SessionRequest) -> Result<SessionReply, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_username.lock().unwrap() = Some(request.username.clone());
        self.reply.clone().map_err(ApiError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_repeats_last_entry() {
        let source = ScriptedStatusSource::new()
            .then_error("boom")
            .then_status("Synced", "Healthy", "abc");

        assert!(source.fetch_status("app").await.is_err());
        for _ in 0..3 {
            let snapshot = source.fetch_status("app").await.unwrap();
            assert_eq!(snapshot.revision, "abc");
        }
        assert_eq!(source.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let source = ScriptedStatusSource::new();
        assert!(source.fetch_status("app").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_revision_metadata_fails() {
        let source = ScriptedStatusSource::new().with_metadata("abc", "msg");
        assert!(source.fetch_revision_metadata("app", "zzz").await.is_err());
        assert_eq!(
            source.fetch_revision_metadata("app", "abc").await.unwrap().message,
            "msg"
        );
        assert_eq!(source.metadata_calls(), 2);
    }

    #[tokio::test]
    async fn test_session_transport_records_calls() {
        let transport = FakeSessionTransport::replying(200, r#"{"token":"t"}"#);
        let reply = transport
            .exchange(&SessionRequest::new("alice", "pw"))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.last_username().as_deref(), Some("alice"));
    }
}
