//! `lint_clojure` tool handler
//!
//! Validates tool arguments and hands them to [`KondoRunner`].

use async_trait::async_trait;
use kondo_runner::{KondoRunner, LintOptions};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::protocol::RpcError;
use crate::server::ToolHandler;
use crate::tools::{ToolResult, LINT_TOOL};

/// Arguments of `lint_clojure`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LintArgs {
    /// File, directory or classpath; `file` is the older name
    #[serde(alias = "file")]
    pub target: String,
    #[serde(rename = "configDir", default)]
    pub config_dir: Option<String>,
}

impl LintArgs {
    /// Validate raw tool arguments
    pub fn from_arguments(arguments: &Value) -> Result<Self, RpcError> {
        // serde would also fill a struct from a JSON array
        if !arguments.is_object() {
            return Err(RpcError::InvalidParams(
                "Invalid lint arguments: expected an object".to_string(),
            ));
        }

        LintArgs::deserialize(arguments)
            .map_err(|e| RpcError::InvalidParams(format!("Invalid lint arguments: {}", e)))
    }

    fn into_options(self, parallel: bool) -> LintOptions {
        let options = LintOptions::new(self.target).with_parallel(parallel);
        match self.config_dir {
            Some(dir) => options.with_config_dir(dir),
            None => options,
        }
    }
}

/// Tool handler backed by clj-kondo
#[derive(Debug, Clone)]
pub struct LintHandler {
    runner: KondoRunner,
    parallel: bool,
}

impl LintHandler {
    pub fn new(runner: KondoRunner) -> Self {
        LintHandler {
            runner,
            parallel: true,
        }
    }

    /// Toggle `--parallel` (on by default)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    async fn lint(&self, arguments: &Value) -> Result<ToolResult, RpcError> {
        let options = LintArgs::from_arguments(arguments)?.into_options(self.parallel);
        debug!(lint_target = %options.target, config_dir = ?options.config_dir, "Linting");

        match self.runner.lint(&options).await {
            Ok(text) => Ok(ToolResult::text(text)),
            Err(e) => {
                error!(error = %e, "clj-kondo run failed");
                Err(RpcError::InternalError(e.to_string()))
            }
        }
    }
}

impl Default for LintHandler {
    fn default() -> Self {
        LintHandler::new(KondoRunner::new())
    }
}

#[async_trait]
impl ToolHandler for LintHandler {
    async fn call(&self, name: &str, arguments: Value) -> Result<ToolResult, RpcError> {
        match name {
            LINT_TOOL => self.lint(&arguments).await,
            _ => Err(RpcError::UnknownTool(name.to_string())),
        }
    }
}
