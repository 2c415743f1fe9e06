//! Logging setup
//!
//! Events go to stderr; stdout carries only command output.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter; overrides everything else
pub const LOG_ENV: &str = "STORAGECTL_LOG";

/// Filter directive for the given `-v` count and configured level
pub fn directive(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
