//! Error types for argocd-api
//!
//! Variants that wrap a cause keep it as `source()` and leave it out of
//! their own message, so a rendered chain names each cause once.

use thiserror::Error;

/// Errors that can occur while talking to the Argo CD API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server address cannot be turned into a base URL
    #[error("invalid Argo CD server address '{server}': {reason}")]
    InvalidServer { server: String, reason: String },

    /// HTTP client construction failed
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Request failed below HTTP (DNS, connect, TLS, request timeout)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Transport failure reported without a reqwest error behind it
    #[error("{0}")]
    Transport(String),

    /// Argo CD answered with a non-2xx status
    #[error("Argo CD returned http {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not decode
    #[error("invalid JSON in Argo CD response")]
    Json(#[from] serde_json::Error),
}
