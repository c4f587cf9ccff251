//! Instrument Library
//!
//! HTTP command executor. Runs shell commands in a fixed data directory with
//! timeout enforcement and per-stream output size limits, and reports the
//! outcome as a structured [`RunResult`].
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use instrument::{CommandRunner, Config};
//! use std::time::Duration;
//!
//! let runner = CommandRunner::new(&Config::default());
//! let result = runner.run("echo hello", Duration::from_secs(5)).await;
//! assert_eq!(result.exit_code, 0);
//! ```

pub mod config;
pub mod handlers;
pub mod output;
pub mod params;
pub mod runner;
pub mod server;
pub mod types;

// Re-export main types
pub use config::Overrides;
pub use params::{RunRequest, ValidationError};
pub use runner::CommandRunner;
pub use types::{Config, InstrumentError, RunResult};
