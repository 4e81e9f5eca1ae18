//! Skillz Market MCP server (stdio).
//!
//! Configuration comes from the environment:
//!   SKILLZ_API_URL       API base URL (default https://api.skillzmarket.com)
//!   SKILLZ_PRIVATE_KEY   hex private key enabling paid skill calls (env only)
//!   SKILLZ_LOG           log filter when RUST_LOG is unset (default info)
//!   SKILLZ_TIMEOUT_SECS  HTTP request timeout for marketplace calls
//!
//! The non-secret settings also accept a `--long` flag override.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use skillz_mcp::config::ServerConfig;
use skillz_mcp::logging;
use skillz_mcp::market::{SkillzClient, SkillzClientConfig};
use skillz_mcp::mcp::McpServer;
use skillz_mcp::tools::ToolContext;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "skillz-mcp")]
#[command(version)]
#[command(about = "MCP server for the Skillz Market")]
struct Cli {
    /// Skillz Market API base URL.
    #[arg(long, env = "SKILLZ_API_URL")]
    api_url: Option<String>,

    /// Log level (debug, info, warn, error).
    #[arg(long, env = "SKILLZ_LOG", default_value = "info")]
    log_level: String,

    /// HTTP request timeout in seconds (0 disables).
    #[arg(long, env = "SKILLZ_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Never taken from argv, where other users could read it.
    let private_key = std::env::var("SKILLZ_PRIVATE_KEY").ok();

    let config = ServerConfig::new(cli.api_url, private_key)
        .with_log_level(cli.log_level)
        .with_request_timeout(cli.timeout_secs);

    logging::init(&config.log_level);

    let code = exit_code(run(config).await);

    // The stdin reader blocks a runtime thread that cannot be cancelled, so
    // leave without waiting for runtime shutdown.
    std::process::exit(code);
}

/// Log a fatal error once and map the outcome to a process exit status.
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            1
        }
    }
}

async fn run(config: ServerConfig) -> Result<()> {
    let wallet = config.wallet().context("Invalid SKILLZ_PRIVATE_KEY")?;

    let client = SkillzClient::new(SkillzClientConfig {
        api_url: config.api_url.clone(),
        wallet: wallet.clone(),
        timeout: config.request_timeout,
    })
    .context("Failed to create Skillz Market client")?;

    let server = McpServer::new(ToolContext::new(Arc::new(client), wallet.clone()));

    // Ctrl+C stops the read loop; EOF on stdin does the same.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    info!("Skillz Market MCP server running");
    info!("API: {}", config.api_url);
    match &wallet {
        Some(wallet) => info!("Wallet: {}", wallet.address),
        None => warn!("No wallet configured. Set SKILLZ_PRIVATE_KEY for paid skill calls."),
    }

    server.run(cancel).await
}
