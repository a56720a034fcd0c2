//! clj-kondo-mcp - MCP stdio server for clj-kondo
//!
//! Launched by an MCP client; the linter is resolved on `PATH` unless
//! `CLJ_KONDO_COMMAND` says otherwise.

use anyhow::{Context, Result};
use tracing::info;

use kondo_mcp::{LintHandler, McpServer, ServeExit, ServerConfig};

fn log_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.log_level))
        .with_writer(std::io::stderr)
        .init();

    info!(
        program = %config.runner.program(),
        parallel = config.parallel,
        "Using clj-kondo launcher"
    );

    let handler = LintHandler::new(config.runner).with_parallel(config.parallel);
    let mut server = McpServer::new(handler);
    let exit = server.run().await.context("MCP server stopped with an error")?;

    if exit == ServeExit::Interrupted {
        // The blocking stdin reader would otherwise hold the runtime open
        std::process::exit(0);
    }
    Ok(())
}
