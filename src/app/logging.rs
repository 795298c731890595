//! Logging setup

use crate::app::config::AppConfig;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG`, when set and valid, replaces the
/// level derived from `-v` and the gear config.
pub fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2)
        .with_line_number(config.verbose >= 2)
        .init();

    debug!("topup-gear {} (verbosity {})", env!("CARGO_PKG_VERSION"), config.verbose);
    trace!("Arguments: {:?}", std::env::args().collect::<Vec<_>>());
}
