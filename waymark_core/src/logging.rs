//! Logging bootstrap
//!
//! Library code only emits `tracing` events. Binaries (and tests that want
//! to see planner internals) call [`init_logging`] once to install a fmt
//! subscriber.

use crate::error::{WaymarkError, WaymarkResult};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when it is set.
/// Calling this more than once is a no-op.
pub fn init_logging(default_filter: &str) -> WaymarkResult<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| WaymarkError::Config(format!("invalid log filter '{default_filter}': {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| WaymarkError::Config(format!("failed to install subscriber: {e}")))?;

    let _ = INSTALLED.set(());
    Ok(())
}
