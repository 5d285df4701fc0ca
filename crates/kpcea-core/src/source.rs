//! Capability traits the core depends on, and their Argo CD implementations.
//!
//! - `StatusSource`: application status and revision metadata
//! - `SessionTransport`: username/password to raw session reply
//!
//! Scripted fakes live in the `fakes` module.

use std::sync::Arc;

use argocd_api::{ApiError, ArgoCdClient, SessionReply, SessionRequest};
use async_trait::async_trait;

use crate::error::FetchError;
use crate::snapshot::{RevisionMetadata, StatusSnapshot};

/// Read-only view of a managed application
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current sync/health/revision of an application.
    async fn fetch_status(&self, app_name: &str) -> Result<StatusSnapshot, FetchError>;

    /// Fetch commit metadata for one revision of an application.
    async fn fetch_revision_metadata(
        &self,
        app_name: &str,
        revision: &str,
    ) -> Result<RevisionMetadata, FetchError>;
}

/// Credential exchange against the session endpoint.
///
/// Returns whatever the server answered; deciding whether that answer holds
/// a token is up to the caller.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn exchange(&self, request: &SessionRequest) -> Result<SessionReply, ApiError>;
}

#[async_trait]
impl StatusSource for ArgoCdClient {
    async fn fetch_status(&self, app_name: &str) -> Result<StatusSnapshot, FetchError> {
        let app = self.get_application(app_name).await?;
        Ok(StatusSnapshot::from(&app))
    }

    async fn fetch_revision_metadata(
        &self,
        app_name: &str,
        revision: &str,
    ) -> Result<RevisionMetadata, FetchError> {
        let meta = self.get_revision_metadata(app_name, revision).await?;
        Ok(RevisionMetadata::from_api(revision, meta))
    }
}

#[async_trait]
impl SessionTransport for ArgoCdClient {
    async fn exchange(&self, request: &SessionRequest) -> Result<SessionReply, ApiError> {
        self.create_session(request).await
    }
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn fetch_status(&self, app_name: &str) -> Result<StatusSnapshot, FetchError> {
        (**self).fetch_status(app_name).await
    }

    async fn fetch_revision_metadata(
        &self,
        app_name: &str,
        revision: &str,
    ) -> Result<RevisionMetadata, FetchError> {
        (**self).fetch_revision_metadata(app_name, revision).await
    }
}
