//! KPCEA Core - promotion gate for Argo CD applications
//!
//! Resolves an API credential, then polls one application until it reaches
//! the promoted state or the deadline passes.
//!
//! ## Pieces
//!
//! - [`CredentialProvider`]: pre-issued token or username/password login
//! - [`StatusSource`]: fetch application status and revision metadata
//! - [`VerificationPolicy`]: exact revision match or commit message search
//! - [`ReconciliationLoop`]: bounded polling that ends in an [`Outcome`]
//!
//! [`run_promotion_check`] wires them together against a live Argo CD server.

pub mod auth;
pub mod config;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod policy;
pub mod reconcile;
pub mod snapshot;
pub mod source;
pub mod telemetry;

pub use auth::{parse_login_reply, Credential, CredentialProvider};
pub use config::{AuthMode, AuthSettings, Config, VerifyMode, VerifyTarget};
pub use error::{AuthError, ConfigError, FetchError, GateError, MetadataFetchError};
pub use gate::{run_promotion_check, run_with};
pub use policy::VerificationPolicy;
pub use reconcile::{Outcome, PollSettings, PollStats, ReconciliationLoop, MIN_RETRY_DELAY};
pub use snapshot::{HealthState, RevisionMetadata, StatusSnapshot, SyncState};
pub use source::{SessionTransport, StatusSource};
pub use telemetry::init_tracing;
