use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Installs the global subscriber. Logs go to stderr so they never mix with
/// answers on stdout; `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "info" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::debug!(verbose, "logging initialized");
    Ok(())
}
