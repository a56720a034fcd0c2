//! Types shared by the clj-kondo runner

/// Options for a single lint run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOptions {
    /// File, directory or classpath string handed to `--lint`
    pub target: String,
    /// Directory passed through `--config-dir`
    pub config_dir: Option<String>,
    /// Whether to pass `--parallel` (default: true)
    pub parallel: bool,
}

impl LintOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            config_dir: None,
            parallel: true,
        }
    }

    pub fn with_config_dir(mut self, config_dir: impl Into<String>) -> Self {
        self.config_dir = Some(config_dir.into());
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Raw result of a finished linter process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl LintOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// True when neither stream carried any text
    pub fn is_silent(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Runner errors
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("clj-kondo {} without producing any output", describe_exit(.code))]
    NoOutput { code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}
