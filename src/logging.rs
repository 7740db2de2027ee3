//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG`, when set, takes precedence over `default_level` so operators
/// can tune per-module verbosity (e.g. `RUST_LOG=hypr=debug,tower_http=info`).
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initializing logging: {}", e))
}
