//! Diagnostics on stderr via `tracing`.
//!
//! `ZS_LOG` takes an `EnvFilter` directive (`ZS_LOG=zs=debug`,
//! `ZS_LOG=zs::watch=trace`). Without it the level is `info`, or `debug`
//! with `--debug`. Command results go to stdout through [`crate::output`],
//! so piping `zs var` or `zs build FILE` is never polluted by logs.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ZS_LOG";

fn default_directive(debug: bool) -> &'static str {
    if debug { "zs=debug" } else { "zs=info" }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
