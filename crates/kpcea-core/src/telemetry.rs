//! Tracing setup for the `kpcea` binary.
//!
//! Logs go to stderr; stdout is left for the promotion report.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP stack crates kept at `warn` unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to kpcea and the
/// HTTP stack stays at `warn`. With `json`, every line is a JSON object.
/// Only the first call has any effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let (plain, structured) = if json {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        (None, Some(layer.json()))
    } else {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain)
        .with(structured)
        .try_init()
        .ok();
}

fn default_directives(level: Level) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    for target in QUIET_TARGETS {
        directives.push(format!("{target}=warn"));
    }
    directives.join(",")
}
