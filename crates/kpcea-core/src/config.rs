//! Run configuration
//!
//! Built once at startup, from the process environment or any other
//! key/value lookup, and passed by reference to every component. Nothing
//! else in this crate reads environment variables.
//!
//! | Variable | Effect |
//! |---|---|
//! | `ARGOCD_SERVER` | controller address (required) |
//! | `ARGOCD_APP_NAME` | application to poll (required) |
//! | `ARGOCD_API_TOKEN` | pre-issued token, selects token mode |
//! | `ARGOCD_API_USERNAME` / `ARGOCD_API_PASSWORD` | login mode when no token |
//! | `KPCEA_VERIFY_MODE` | `SEARCH_COMMIT_MSG` selects substring search, else exact |
//! | `KPCEA_TARGET_REVISION` | revision to match in exact mode |
//! | `KPCEA_SEARCH_COMMIT_MSG` | substring to find in search mode |
//! | `KPCEA_TIMEOUT` | poll deadline in seconds (default 30) |
//! | `KPCEA_INTERVAL` | delay between polls in seconds (default 5) |
//! | `KPCEA_REQUEST_TIMEOUT` | per-request HTTP timeout in seconds (default 10) |
//! | `KPCEA_INSECURE` | `true` selects plain HTTP and skips TLS verification |

use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_SERVER: &str = "ARGOCD_SERVER";
pub const ENV_APP_NAME: &str = "ARGOCD_APP_NAME";
pub const ENV_API_TOKEN: &str = "ARGOCD_API_TOKEN";
pub const ENV_API_USERNAME: &str = "ARGOCD_API_USERNAME";
pub const ENV_API_PASSWORD: &str = "ARGOCD_API_PASSWORD";
pub const ENV_VERIFY_MODE: &str = "KPCEA_VERIFY_MODE";
pub const ENV_TARGET_REVISION: &str = "KPCEA_TARGET_REVISION";
pub const ENV_SEARCH_COMMIT_MSG: &str = "KPCEA_SEARCH_COMMIT_MSG";
pub const ENV_TIMEOUT: &str = "KPCEA_TIMEOUT";
pub const ENV_INTERVAL: &str = "KPCEA_INTERVAL";
pub const ENV_REQUEST_TIMEOUT: &str = "KPCEA_REQUEST_TIMEOUT";
pub const ENV_INSECURE: &str = "KPCEA_INSECURE";

/// `KPCEA_VERIFY_MODE` value that selects commit message search
pub const SEARCH_COMMIT_MSG_MODE: &str = "SEARCH_COMMIT_MSG";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Authentication tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Token,
    Login,
}

/// How to obtain an API token
#[derive(Clone, PartialEq, Eq)]
pub enum AuthSettings {
    /// Pre-issued token, used as-is
    Token(String),
    /// Exchange username and password at the session endpoint
    Login { username: String, password: String },
}

impl AuthSettings {
    pub fn mode(&self) -> AuthMode {
        match self {
            AuthSettings::Token(_) => AuthMode::Token,
            AuthSettings::Login { .. } => AuthMode::Login,
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthSettings::Token(_) => f.write_str("Token(<redacted>)"),
            AuthSettings::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Verification tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    Exact,
    SearchCommitMessage,
}

impl VerifyMode {
    /// Interpret a `KPCEA_VERIFY_MODE` value. Anything but
    /// `SEARCH_COMMIT_MSG` means exact matching.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(SEARCH_COMMIT_MSG_MODE) => VerifyMode::SearchCommitMessage,
            _ => VerifyMode::Exact,
        }
    }
}

/// What the deployed revision has to satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyTarget {
    Exact { revision: String },
    SearchCommitMessage { substring: String },
}

impl VerifyTarget {
    pub fn mode(&self) -> VerifyMode {
        match self {
            VerifyTarget::Exact { .. } => VerifyMode::Exact,
            VerifyTarget::SearchCommitMessage { .. } => VerifyMode::SearchCommitMessage,
        }
    }
}

/// Immutable configuration for one promotion check
#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub app_name: String,
    pub auth: AuthSettings,
    pub insecure: bool,
    pub verify: VerifyTarget,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Config with default timing and TLS verification on
    pub fn new(server: &str, app_name: &str, auth: AuthSettings, verify: VerifyTarget) -> Self {
        Config {
            server: server.to_string(),
            app_name: app_name.to_string(),
            auth,
            insecure: false,
            verify,
            poll_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth.mode()
    }

    pub fn verify_mode(&self) -> VerifyMode {
        self.verify.mode()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset for required variables. A non-empty
    /// token wins over username/password.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let server = non_empty(ENV_SERVER);
        let app_name = non_empty(ENV_APP_NAME);
        let (Some(server), Some(app_name)) = (server, app_name) else {
            return Err(ConfigError::MissingTarget);
        };

        let auth = match non_empty(ENV_API_TOKEN) {
            Some(token) => AuthSettings::Token(token),
            None => match (non_empty(ENV_API_USERNAME), non_empty(ENV_API_PASSWORD)) {
                (Some(username), Some(password)) => AuthSettings::Login { username, password },
                _ => return Err(ConfigError::MissingCredentials),
            },
        };

        let verify = match VerifyMode::from_env_value(lookup(ENV_VERIFY_MODE).as_deref()) {
            VerifyMode::Exact => VerifyTarget::Exact {
                revision: non_empty(ENV_TARGET_REVISION)
                    .ok_or(ConfigError::MissingTargetRevision)?,
            },
            VerifyMode::SearchCommitMessage => VerifyTarget::SearchCommitMessage {
                substring: non_empty(ENV_SEARCH_COMMIT_MSG)
                    .ok_or(ConfigError::MissingSearchCommitMessage)?,
            },
        };

        let poll_timeout = seconds(lookup(ENV_TIMEOUT), ENV_TIMEOUT, DEFAULT_TIMEOUT_SECS)?;
        let poll_interval = seconds(lookup(ENV_INTERVAL), ENV_INTERVAL, DEFAULT_INTERVAL_SECS)?;
        let request_timeout = seconds(
            lookup(ENV_REQUEST_TIMEOUT),
            ENV_REQUEST_TIMEOUT,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        // Only the literal "true" turns verification off
        let insecure = lookup(ENV_INSECURE).as_deref() == Some("true");

        Ok(Config {
            server,
            app_name,
            auth,
            insecure,
            verify,
            poll_timeout,
            poll_interval,
            request_timeout,
        })
    }
}

fn seconds(
    value: Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::NotANumber { var }),
    }
}
