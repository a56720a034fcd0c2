//! Startup configuration read from the environment

use kondo_runner::KondoRunner;

/// Linter launcher, e.g. `clojure -M:clj-kondo`
pub const COMMAND_ENV: &str = "CLJ_KONDO_COMMAND";
/// Set to `0`, `false`, `off` or `no` to drop `--parallel`
pub const PARALLEL_ENV: &str = "CLJ_KONDO_MCP_PARALLEL";
/// Log level used when `RUST_LOG` is unset
pub const LOG_LEVEL_ENV: &str = "CLJ_KONDO_MCP_LOG_LEVEL";

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub runner: KondoRunner,
    pub parallel: bool,
    /// `EnvFilter` directive string
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            runner: KondoRunner::new(),
            parallel: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let runner = lookup(COMMAND_ENV)
            .and_then(|cmd| KondoRunner::from_command_line(&cmd))
            .unwrap_or_default();

        let parallel = lookup(PARALLEL_ENV)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);

        let log_level = if let Some(v) = lookup("RUST_LOG") {
            v
        } else if let Some(v) = lookup(LOG_LEVEL_ENV) {
            match v.as_str() {
                "silent" => "off".to_string(),
                "fatal" => "error".to_string(),
                other => other.to_string(),
            }
        } else {
            DEFAULT_LOG_LEVEL.to_string()
        };

        ServerConfig {
            runner,
            parallel,
            log_level,
        }
    }
}
