//! Diagnostic logging.
//!
//! User-facing output is plain `println!`. This subscriber carries the
//! `tracing` diagnostics (spawned commands, cache hits and fallbacks) to
//! stderr. `RUST_LOG` takes precedence over `--verbose`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(verbose: bool) {
    let default_level = if verbose { "inox=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
