//! Verification policies: when does a snapshot count as promoted?
//!
//! Both variants require `Synced` + `Healthy`. `Exact` then compares the
//! deployed revision to the target; `SearchCommitMessage` fetches the commit
//! metadata for the deployed revision and looks for a literal,
//! case-sensitive substring in its message.

use tracing::debug;

use crate::config::{Config, VerifyTarget};
use crate::error::MetadataFetchError;
use crate::snapshot::StatusSnapshot;
use crate::source::StatusSource;

/// Promotion rule, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationPolicy {
    Exact { target_revision: String },
    SearchCommitMessage { substring: String },
}

impl VerificationPolicy {
    pub fn from_config(config: &Config) -> Self {
        match &config.verify {
            VerifyTarget::Exact { revision } => VerificationPolicy::Exact {
                target_revision: revision.clone(),
            },
            VerifyTarget::SearchCommitMessage { substring } => {
                VerificationPolicy::SearchCommitMessage {
                    substring: substring.clone(),
                }
            }
        }
    }

    /// Decide whether `snapshot` is promoted.
    ///
    /// Metadata is only fetched for a synced and healthy snapshot under
    /// `SearchCommitMessage`; a failed metadata fetch is returned as an error.
    pub async fn evaluate(
        &self,
        source: &dyn StatusSource,
        app_name: &str,
        snapshot: &StatusSnapshot,
    ) -> Result<bool, MetadataFetchError> {
        if !snapshot.is_synced_and_healthy() {
            return Ok(false);
        }

        match self {
            VerificationPolicy::Exact { target_revision } => {
                Ok(snapshot.revision == *target_revision)
            }
            VerificationPolicy::SearchCommitMessage { substring } => {
                let metadata = source
                    .fetch_revision_metadata(app_name, &snapshot.revision)
                    .await
                    .map_err(|source| MetadataFetchError {
                        revision: snapshot.revision.clone(),
                        source,
                    })?;

                let found = metadata.message.contains(substring.as_str());
                debug!(
                    revision = %snapshot.revision,
                    found,
                    "searched commit message for '{}'",
                    substring
                );
                Ok(found)
            }
        }
    }
}

impl std::fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationPolicy::Exact { target_revision } => {
                write!(f, "revision == '{}'", target_revision)
            }
            VerificationPolicy::SearchCommitMessage { substring } => {
                write!(f, "commit message contains '{}'", substring)
            }
        }
    }
}
