//! Bounded polling loop that decides the promotion check.
//!
//! One sequential loop: check the deadline, fetch, evaluate, wait. The
//! deadline is fixed when the loop starts and only gates the start of a new
//! poll; a fetch already under way is allowed to finish.
//!
//! - failed fetch: logged, retried after `retry_delay` (never less than
//!   [`MIN_RETRY_DELAY`]), counts toward the timeout
//! - snapshot not promoted: wait `interval`, poll again
//! - snapshot promoted: `Outcome::Success`, no further polls
//! - metadata fetch failure from the policy: returned as an error

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::MetadataFetchError;
use crate::policy::VerificationPolicy;
use crate::snapshot::StatusSnapshot;
use crate::source::StatusSource;

/// Floor for the wait after a failed fetch.
pub const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Timing of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub interval: Duration,
    pub retry_delay: Duration,
}

impl PollSettings {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        PollSettings {
            timeout,
            interval,
            retry_delay: interval.max(MIN_RETRY_DELAY),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_timeout, config.poll_interval)
    }
}

/// Counters gathered over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Fetch attempts started, failed ones included
    pub polls: u32,
    pub failed_polls: u32,
    pub elapsed: Duration,
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A snapshot satisfied the policy
    Success {
        snapshot: StatusSnapshot,
        stats: PollStats,
    },
    /// Deadline reached first. `last_snapshot` is `None` if no fetch ever
    /// succeeded.
    TimedOut {
        last_snapshot: Option<StatusSnapshot>,
        stats: PollStats,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The promoted snapshot, or the most recent one seen before the deadline.
    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        match self {
            Outcome::Success { snapshot, .. } => Some(snapshot),
            Outcome::TimedOut { last_snapshot, .. } => last_snapshot.as_ref(),
        }
    }

    pub fn stats(&self) -> &PollStats {
        match self {
            Outcome::Success { stats, .. } | Outcome::TimedOut { stats, .. } => stats,
        }
    }
}

/// Polls one application until it is promoted or the deadline passes
pub struct ReconciliationLoop<'a> {
    source: &'a dyn StatusSource,
    policy: &'a VerificationPolicy,
    app_name: &'a str,
    settings: PollSettings,
}

impl<'a> ReconciliationLoop<'a> {
    pub fn new(
        source: &'a dyn StatusSource,
        policy: &'a VerificationPolicy,
        app_name: &'a str,
        settings: PollSettings,
    ) -> Self {
        ReconciliationLoop {
            source,
            policy,
            app_name,
            settings,
        }
    }

    pub async fn run(&self) -> Result<Outcome, MetadataFetchError> {
        let start = Instant::now();
        // A timeout too large to represent means no deadline
        let deadline = start.checked_add(self.settings.timeout);
        let mut stats = PollStats::default();
        let mut last_snapshot: Option<StatusSnapshot> = None;

        info!(
            app = %self.app_name,
            policy = %self.policy,
            timeout_secs = self.settings.timeout.as_secs(),
            interval_secs = self.settings.interval.as_secs(),
            "waiting for application to be promoted"
        );

        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                stats.elapsed = start.elapsed();
                info!(
                    app = %self.app_name,
                    polls = stats.polls,
                    failed_polls = stats.failed_polls,
                    "deadline reached before promotion"
                );
                return Ok(Outcome::TimedOut {
                    last_snapshot,
                    stats,
                });
            }

            stats.polls += 1;
            let snapshot = match self.source.fetch_status(self.app_name).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    stats.failed_polls += 1;
                    warn!(
                        app = %self.app_name,
                        attempt = stats.polls,
                        error = %err,
                        "failed to fetch application status, retrying"
                    );
                    sleep(self.settings.retry_delay).await;
                    continue;
                }
            };

            info!(
                attempt = stats.polls,
                sync = %snapshot.sync,
                health = %snapshot.health,
                revision = %snapshot.revision,
                "application status"
            );

            if self
                .policy
                .evaluate(self.source, self.app_name, &snapshot)
                .await?
            {
                stats.elapsed = start.elapsed();
                info!(app = %self.app_name, polls = stats.polls, "application promoted");
                return Ok(Outcome::Success { snapshot, stats });
            }

            last_snapshot = Some(snapshot);
            sleep(self.settings.interval).await;
        }
    }
}
