//! Type definitions for the instrument service

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Service configuration, loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Shell used to interpret commands (invoked as `<shell> -c <command>`)
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Working directory for every spawned command
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// How long to keep reading output after a timeout kill
    #[serde(default = "default_drain_grace")]
    pub drain_grace_secs: u64,
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_drain_grace() -> u64 {
    5
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            data_dir: default_data_dir(),
            drain_grace_secs: default_drain_grace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum output size per stream (stdout/stderr) in bytes
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

/// 10 MiB
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

fn default_max_output() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: default_max_output(),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Exit code reported when no valid process status was obtained
///
/// On Unix a real exit code is always 0-255, so the sentinel cannot collide
/// with one. Platforms that allow negative exit codes may report a genuine -1.
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// Outcome of one command run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
    #[serde(default)]
    pub truncated: bool,
}

impl RunResult {
    /// Degenerate result for a run that could not produce a process status
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: EXIT_CODE_UNAVAILABLE,
            timed_out: false,
            truncated: false,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures inside a single run. Never leaves the runner; see [`RunResult::failure`].
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Failed to read command output: {0}")]
    Read(#[source] std::io::Error),

    #[error("Output reader failed: {0}")]
    Reader(#[from] tokio::task::JoinError),

    #[error("Child {0} pipe was not captured")]
    MissingPipe(&'static str),
}

/// Startup errors
#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
