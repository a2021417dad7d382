//! Subscriber bootstrap for applications embedding the crate.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{NestedSetError, Result};

/// Installs a global `fmt` subscriber filtered by `filter` (`EnvFilter` syntax,
/// e.g. `"nestset=debug"`).
///
/// # Errors
/// [`NestedSetError::Config`] when the filter does not parse or a global
/// subscriber is already installed.
pub fn init_logging(filter: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(filter)
                .map_err(|e| NestedSetError::Config(format!("invalid log filter: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| NestedSetError::Config("logging already initialized".into()))
}
