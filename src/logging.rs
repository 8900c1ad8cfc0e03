use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "warn,easy_cleanup=debug";

/// Installs the diagnostics subscriber, writing to stderr.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`. `verbose` raises
/// this crate to `debug` regardless of `RUST_LOG`. Calling this twice is a
/// no-op.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}
