//! KPCEA - Kargo promotion check for Argo CD
//!
//! The `kpcea` command polls one Argo CD application until it reaches the
//! promoted state, for use as a pass/fail gate in a deployment pipeline.
//!
//! ## Exit codes
//!
//! - `0`: the application was promoted before the deadline
//! - `1`: deadline reached, or a fatal config/auth/client-init/metadata error
//!
//! All settings come from the environment; see `kpcea_core::config`.

use anyhow::{Context, Result};
use clap::Parser;
use kpcea_core::{run_promotion_check, Config, GateError, Outcome, StatusSnapshot};
use std::fmt::Write;
use std::process::ExitCode;
use tracing::{error, Level};

/// Terminal message for a check that did not pass
const NOT_PROMOTED: &str = "application not in expected state";

#[derive(Parser)]
#[command(name = "kpcea")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wait for an Argo CD application to reach its promoted state", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    kpcea_core::init_tracing(cli.json, level);

    match run().await {
        Ok(outcome) => {
            print!("{}", render_report(&outcome));
            ExitCode::from(exit_status(&outcome))
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<Outcome> {
    let config = Config::from_env().context("config")?;

    run_promotion_check(&config).await.map_err(tag_stage)
}

/// Prefix a fatal error with the stage that raised it. Causes stay in the
/// chain and are printed once each by `{:#}`.
fn tag_stage(err: GateError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(stage)
}

fn exit_status(outcome: &Outcome) -> u8 {
    if outcome.is_success() {
        0
    } else {
        1
    }
}

fn render_report(outcome: &Outcome) -> String {
    let mut out = String::new();
    let stats = outcome.stats();

    match outcome {
        Outcome::Success { snapshot, .. } => {
            let _ = writeln!(
                out,
                "Application promoted after {} poll(s) in {}s",
                stats.polls,
                stats.elapsed.as_secs()
            );
            write_snapshot(&mut out, snapshot);
        }
        Outcome::TimedOut { last_snapshot, .. } => {
            let _ = writeln!(out, "{}", NOT_PROMOTED);
            let _ = writeln!(
                out,
                "Gave up after {} poll(s) ({} failed) in {}s",
                stats.polls,
                stats.failed_polls,
                stats.elapsed.as_secs()
            );
            match last_snapshot {
                Some(snapshot) => write_snapshot(&mut out, snapshot),
                None => {
                    let _ = writeln!(out, "No application status could be fetched");
                }
            }
        }
    }

    out
}

fn write_snapshot(out: &mut String, snapshot: &StatusSnapshot) {
    let _ = writeln!(out, "Sync Status: {}", snapshot.sync);
    let _ = writeln!(out, "Sync Revision: {}", snapshot.revision);
    let _ = writeln!(out, "Health Status: {}", snapshot.health);
}

#[cfg(test)]
mod tests {
    use super::*;
    use argocd_api::ApiError;
    use clap::CommandFactory;
    use kpcea_core::{AuthError, FetchError, MetadataFetchError, PollStats};
    use std::time::Duration;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["kpcea", "-v", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json);
    }

    #[test]
    fn success_report_and_exit_code() {
        let outcome = Outcome::Success {
            snapshot: StatusSnapshot::new("Synced", "Healthy", "abc123"),
            stats: PollStats {
                polls: 2,
                failed_polls: 0,
                elapsed: Duration::from_secs(5),
            },
        };

        let report = render_report(&outcome);
        assert!(report.starts_with("Application promoted after 2 poll(s) in 5s"));
        assert!(report.contains("Sync Status: Synced"));
        assert!(report.contains("Sync Revision: abc123"));
        assert!(report.contains("Health Status: Healthy"));
        assert_eq!(exit_status(&outcome), 0);
    }

    #[test]
    fn timeout_report_and_exit_code() {
        let outcome = Outcome::TimedOut {
            last_snapshot: Some(StatusSnapshot::new("OutOfSync", "Healthy", "def456")),
            stats: PollStats {
                polls: 10,
                failed_polls: 1,
                elapsed: Duration::from_secs(10),
            },
        };

        let report = render_report(&outcome);
        assert!(report.starts_with(NOT_PROMOTED));
        assert!(report.contains("10 poll(s) (1 failed)"));
        assert!(report.contains("Sync Status: OutOfSync"));
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn timeout_without_any_snapshot() {
        let outcome = Outcome::TimedOut {
            last_snapshot: None,
            stats: PollStats::default(),
        };

        let report = render_report(&outcome);
        assert!(report.contains("No application status could be fetched"));
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn stage_tagged_error_names_each_cause_once() {
        let err = GateError::from(AuthError::Transport(ApiError::Transport(
            "connection refused".to_string(),
        )));
        let rendered = format!("{:#}", tag_stage(err));

        assert_eq!(
            rendered,
            "auth: authentication failed: login request to ArgoCD failed: connection refused"
        );
        for message in [
            "authentication failed",
            "login request to ArgoCD failed",
            "connection refused",
        ] {
            assert_eq!(rendered.matches(message).count(), 1, "{rendered}");
        }
    }

    #[test]
    fn metadata_error_renders_revision_and_cause() {
        let err = GateError::from(MetadataFetchError {
            revision: "abc123".to_string(),
            source: FetchError::Unavailable("revision not found".to_string()),
        });
        let rendered = format!("{:#}", tag_stage(err));

        assert_eq!(
            rendered,
            "metadata: failed to fetch metadata for revision 'abc123': revision not found"
        );
        assert_eq!(rendered.matches("revision not found").count(), 1);
    }

    #[test]
    fn client_init_error_keeps_api_status() {
        let err = GateError::ClientInit(ApiError::Status {
            status: 503,
            message: "unavailable".to_string(),
        });
        let rendered = format!("{:#}", tag_stage(err));

        assert_eq!(
            rendered,
            "client-init: failed to create Argo CD API client: \
             Argo CD returned http 503: unavailable"
        );
    }
}
