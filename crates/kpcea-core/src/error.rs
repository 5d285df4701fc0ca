//! Error types for kpcea-core
//!
//! A variant that wraps a cause exposes it through `source()` only; callers
//! render the chain (`{:#}` on an `anyhow::Error`) to show it.

use argocd_api::ApiError;
use thiserror::Error;

/// Invalid or missing configuration. Raised before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ARGOCD_SERVER and ARGOCD_APP_NAME must be set")]
    MissingTarget,

    #[error("ARGOCD_API_USERNAME and ARGOCD_API_PASSWORD must be set for LOGIN mode")]
    MissingCredentials,

    #[error("KPCEA_TARGET_REVISION must be set when verify mode is exact")]
    MissingTargetRevision,

    #[error("KPCEA_SEARCH_COMMIT_MSG must be set when KPCEA_VERIFY_MODE=SEARCH_COMMIT_MSG")]
    MissingSearchCommitMessage,

    #[error("provided {var} must be a number")]
    NotANumber { var: &'static str },
}

/// Failure to obtain an API token
#[derive(Error, Debug)]
pub enum AuthError {
    /// Session endpoint answered with a non-2xx status
    #[error("token request not accepted by ArgoCD (http {status})")]
    Rejected { status: u16 },

    /// Session endpoint answered 2xx but the body is not the expected JSON
    #[error("malformed login response from ArgoCD")]
    MalformedResponse(#[source] serde_json::Error),

    /// Well-formed response without a usable token
    #[error("unable to get API token from ArgoCD")]
    EmptyToken,

    /// The login request never produced a response
    #[error("login request to ArgoCD failed")]
    Transport(#[source] ApiError),
}

/// A single status or metadata fetch failed
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Source-specific failure without an API error behind it
    #[error("{0}")]
    Unavailable(String),
}

/// Revision metadata could not be fetched while evaluating commit-message
/// search. Fatal for the run.
#[derive(Error, Debug)]
#[error("failed to fetch metadata for revision '{revision}'")]
pub struct MetadataFetchError {
    pub revision: String,
    #[source]
    pub source: FetchError,
}

/// Fatal errors that abort a promotion check
#[derive(Error, Debug)]
pub enum GateError {
    #[error("authentication failed")]
    Auth(#[from] AuthError),

    #[error("failed to create Argo CD API client")]
    ClientInit(#[source] ApiError),

    #[error(transparent)]
    Metadata(#[from] MetadataFetchError),
}

impl GateError {
    /// Name of the stage that failed, for user-facing reports.
    pub fn stage(&self) -> &'static str {
        match self {
            GateError::Auth(_) => "auth",
            GateError::ClientInit(_) => "client-init",
            GateError::Metadata(_) => "metadata",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthError::Rejected { status: 401 }.to_string(),
            "token request not accepted by ArgoCD (http 401)"
        );
        assert_eq!(
            AuthError::EmptyToken.to_string(),
            "unable to get API token from ArgoCD"
        );
    }

    #[test]
    fn test_gate_error_stages() {
        let auth = GateError::from(AuthError::EmptyToken);
        assert_eq!(auth.stage(), "auth");

        let init = GateError::ClientInit(ApiError::InvalidServer {
            server: "bad host".to_string(),
            reason: "invalid domain character".to_string(),
        });
        assert_eq!(init.stage(), "client-init");

        let metadata = GateError::from(MetadataFetchError {
            revision: "abc123".to_string(),
            source: FetchError::Unavailable("boom".to_string()),
        });
        assert_eq!(metadata.stage(), "metadata");
        assert_eq!(
            metadata.to_string(),
            "failed to fetch metadata for revision 'abc123'"
        );
    }

    fn chain(err: &dyn std::error::Error) -> Vec<String> {
        let mut messages = vec![err.to_string()];
        let mut cause = err.source();
        while let Some(next) = cause {
            messages.push(next.to_string());
            cause = next.source();
        }
        messages
    }

    #[test]
    fn test_error_chain_names_each_cause_once() {
        let err = GateError::from(AuthError::Transport(ApiError::Transport(
            "connection refused".to_string(),
        )));
        assert_eq!(
            chain(&err),
            vec![
                "authentication failed",
                "login request to ArgoCD failed",
                "connection refused",
            ]
        );

        let err = GateError::from(MetadataFetchError {
            revision: "abc123".to_string(),
            source: FetchError::Api(ApiError::Status {
                status: 503,
                message: "repository unavailable".to_string(),
            }),
        });
        assert_eq!(
            chain(&err),
            vec![
                "failed to fetch metadata for revision 'abc123'",
                "Argo CD returned http 503: repository unavailable",
            ]
        );
    }

    #[test]
    fn test_not_a_number_names_variable() {
        let err = ConfigError::NotANumber {
            var: "KPCEA_TIMEOUT",
        };
        assert_eq!(err.to_string(), "provided KPCEA_TIMEOUT must be a number");
    }
}
