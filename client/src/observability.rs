//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "tessera_client=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Does nothing if the host application already installed a global
/// subscriber. Returns whether this call installed one.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init()
        .is_ok()
}
