//! kondo-runner - clj-kondo CLI wrapper
//!
//! Executes `clj-kondo --lint <target> [--config-dir <dir>] --parallel` and
//! returns whatever the linter printed.
//!
//! clj-kondo exits non-zero whenever it reports findings, so a failing exit
//! status alone says nothing about whether the run was usable. [`classify`]
//! decides that from the captured output.
//!
//! # Example
//!
//! ```no_run
//! use kondo_runner::{KondoRunner, LintOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = KondoRunner::new();
//!
//!     let report = runner
//!         .lint(&LintOptions::new("/path/to/src").with_config_dir("/path/to/.clj-kondo"))
//!         .await?;
//!
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

mod runner;
mod types;

pub use runner::{classify, KondoRunner, DEFAULT_PROGRAM};
pub use types::*;
