//! Logging setup for the command line interface.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs the global subscriber. Logs go to stderr so that command output on stdout stays
/// machine readable.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_subscriber(level: Level) -> Result<()> {
    Registry::default()
        .with(EnvFilter::new(level.as_str().to_lowercase()))
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
