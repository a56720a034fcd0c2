//! MCP (Model Context Protocol) server for clj-kondo
//!
//! This crate exposes the clj-kondo linter to MCP clients as a single tool,
//! `lint_clojure`, served over newline-delimited JSON-RPC 2.0 on stdio.
//!
//! # Features
//!
//! - Self-contained JSON-RPC 2.0 protocol implementation
//! - Async stdio-based transport using tokio
//! - One tool: `lint_clojure { target, configDir? }`
//!
//! # Example
//!
//! ```no_run
//! use kondo_mcp::{LintHandler, McpServer};
//! use kondo_runner::KondoRunner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = McpServer::new(LintHandler::new(KondoRunner::new()));
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;

// Re-exports for convenience
pub use config::ServerConfig;
pub use handler::{LintArgs, LintHandler};
pub use protocol::{Request, RequestId, Response, RpcError};
pub use server::{McpServer, ServeExit, ToolHandler};
pub use tools::{ToolContent, ToolDefinition, ToolResult, all_tools, get_tool};
