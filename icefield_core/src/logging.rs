//! Logging utilities for Icefield-wide output to stdout.
//!

// Re-exports for convenience
pub use tracing::metadata::LevelFilter;
pub use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{util::SubscriberInitExt, Layer};

/// The filter used when `RUST_LOG` isn't set.
const DEFAULT_FILTER: &str = "icefield_core=info,icefield_snowflake=info";

/// Set up basic logging
pub fn setup(level: Option<LevelFilter>) {
    // The user can specify a log level via an env var
    // (such as for testing).
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());
    let mut logging_layers = vec![tracing_subscriber::EnvFilter::new(env).boxed()];

    // The input level overrides any env vars.
    let layer = tracing_subscriber::fmt::layer()
        .with_filter(level.unwrap_or(LevelFilter::INFO))
        .boxed();
    logging_layers.push(layer);

    // try_init so that a host that already installed a subscriber keeps it.
    if tracing_subscriber::registry()
        .with(logging_layers)
        .try_init()
        .is_err()
    {
        debug!("a global subscriber was already installed");
        return;
    }

    debug!("logging set up");
}
