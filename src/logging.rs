//! Tracing setup. All diagnostics go to stderr; stdout carries only the
//! MCP protocol stream.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `RUST_LOG` overrides `default_level`.
pub fn init(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}
