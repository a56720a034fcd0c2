//! clj-kondo CLI runner implementation
//!
//! Spawns the linter with an argument vector (no shell) and captures both
//! output streams in full.

use crate::types::*;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Program name resolved on `PATH` when no launcher is configured
pub const DEFAULT_PROGRAM: &str = "clj-kondo";

/// clj-kondo CLI Runner
///
/// Holds only the launcher; every [`lint`](KondoRunner::lint) call spawns an
/// independent process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KondoRunner {
    program: String,
    /// Arguments placed before `--lint`, e.g. `-M:clj-kondo` for `clojure`
    leading_args: Vec<String>,
}

impl Default for KondoRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl KondoRunner {
    /// Create a runner for `clj-kondo` on `PATH`
    pub fn new() -> Self {
        Self::with_command(DEFAULT_PROGRAM, Vec::<String>::new())
    }

    /// Create a runner for an explicit launcher
    pub fn with_command<I, S>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace separated launcher such as `clojure -M:clj-kondo`
    ///
    /// Returns `None` for a blank command line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace();
        let program = words.next()?;
        Some(Self::with_command(program, words))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one run, launcher prefix included
    pub fn args(&self, options: &LintOptions) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push("--lint".to_string());
        args.push(options.target.clone());

        if let Some(dir) = &options.config_dir {
            args.push("--config-dir".to_string());
            args.push(dir.clone());
        }

        if options.parallel {
            args.push("--parallel".to_string());
        }

        args
    }

    /// Run the linter and return its raw output, whatever the exit status
    pub async fn output(&self, options: &LintOptions) -> Result<LintOutput, RunnerError> {
        let args = self.args(options);
        debug!(program = %self.program, ?args, "Starting clj-kondo");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = LintOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            code = ?output.code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "clj-kondo finished"
        );

        Ok(output)
    }

    /// Run the linter and return the report text
    pub async fn lint(&self, options: &LintOptions) -> Result<String, RunnerError> {
        let output = self.output(options).await?;

        if !output.success() {
            if output.is_silent() {
                error!(lint_target = %options.target, code = ?output.code, "clj-kondo failed without output");
            } else {
                warn!(lint_target = %options.target, code = ?output.code, "clj-kondo exited non-zero, returning its output");
            }
        }

        classify(output)
    }
}

/// Decide whether a finished run is a usable report.
///
/// clj-kondo uses non-zero exit codes both for "findings reported" and for
/// real failures. Any captured text counts as a report (stdout preferred,
/// stderr otherwise); a failed run that printed nothing is an error. A
/// successful run is always a report, even an empty one.
pub fn classify(output: LintOutput) -> Result<String, RunnerError> {
    let success = output.success();
    let LintOutput {
        code,
        stdout,
        stderr,
    } = output;

    let text = if stdout.is_empty() { stderr } else { stdout };

    if success || !text.is_empty() {
        Ok(text)
    } else {
        Err(RunnerError::NoOutput { code })
    }
}
