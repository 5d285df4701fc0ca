//! argocd-api: Minimal Argo CD REST client for KPCEA
//!
//! Covers the three calls a promotion check needs:
//! - `POST /api/v1/session` to exchange a username/password for a token
//! - `GET /api/v1/applications/{name}` for sync/health/revision status
//! - `GET /api/v1/applications/{name}/revisions/{revision}/metadata` for commit metadata
//!
//! The client does not interpret login replies; that is left to the caller.

pub mod client;
pub mod error;
pub mod types;

pub use client::{base_url, ArgoCdClient, ClientOptions};
pub use error::ApiError;
pub use types::{
    Application, ApplicationStatus, HealthStatus, ObjectMeta, RevisionMetadata, SessionReply,
    SessionRequest, SyncStatus,
};

/// Result type for Argo CD API calls
pub type Result<T> = std::result::Result<T, ApiError>;
