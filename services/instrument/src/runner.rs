//! Command runner
//!
//! Spawns one shell child per call, races it against the timeout, kills the
//! whole process group on expiry, and caps what it captured. Every failure is
//! folded into a [`RunResult`]; `run` never returns an error.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::output::{pump, CappedBuffer};
use crate::types::{Config, RunError, RunResult, EXIT_CODE_UNAVAILABLE};

/// Characters of the command included in log lines
const LOG_PREVIEW_CHARS: usize = 200;

type Reader = JoinHandle<std::io::Result<()>>;

/// Runs shell commands inside the data directory
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
    data_dir: PathBuf,
    max_output_bytes: usize,
    drain_grace: Duration,
}

impl CommandRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            shell: config.runner.shell.clone(),
            data_dir: config.runner.data_dir.clone(),
            max_output_bytes: config.limits.max_output_bytes,
            drain_grace: Duration::from_secs(config.runner.drain_grace_secs),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run `command` through the shell, bounded by `timeout`
    pub async fn run(&self, command: &str, timeout: Duration) -> RunResult {
        tracing::info!(
            "Command: {} (timeout={}s)",
            preview(command),
            timeout.as_secs()
        );
        let start = Instant::now();

        match self.execute(command, timeout).await {
            Ok(result) => {
                tracing::info!(
                    "Done: exit={} time={:.1}s timed_out={} truncated={}",
                    result.exit_code,
                    start.elapsed().as_secs_f64(),
                    result.timed_out,
                    result.truncated
                );
                result
            }
            Err(e) => {
                tracing::error!(
                    "Failed: {} time={:.1}s",
                    e,
                    start.elapsed().as_secs_f64()
                );
                RunResult::failure(e.to_string())
            }
        }
    }

    async fn execute(&self, command: &str, timeout: Duration) -> Result<RunResult, RunError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.data_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own group, so a timeout kill reaches everything the shell started.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut guard = ChildGuard::new(cmd.spawn().map_err(RunError::Spawn)?);

        let stdout = guard
            .child
            .stdout
            .take()
            .ok_or(RunError::MissingPipe("stdout"))?;
        let stderr = guard
            .child
            .stderr
            .take()
            .ok_or(RunError::MissingPipe("stderr"))?;

        let stdout_buf = Arc::new(Mutex::new(CappedBuffer::new(self.max_output_bytes)));
        let stderr_buf = Arc::new(Mutex::new(CappedBuffer::new(self.max_output_bytes)));
        let mut stdout_task = Some(spawn_reader(stdout, Arc::clone(&stdout_buf)));
        let mut stderr_task = Some(spawn_reader(stderr, Arc::clone(&stderr_buf)));

        // Done means the shell exited and both pipes hit EOF.
        let completion = async {
            let (status, (), ()) = tokio::try_join!(
                guard.wait(),
                join_reader(&mut stdout_task),
                join_reader(&mut stderr_task),
            )?;
            Ok::<_, RunError>(status)
        };

        let (status, timed_out) = match tokio::time::timeout(timeout, completion).await {
            Ok(status) => {
                let status = status?;
                guard.settle();
                (Some(status), false)
            }
            Err(_elapsed) => {
                let status = guard.kill().await;
                let drain = async {
                    join_reader(&mut stdout_task).await?;
                    join_reader(&mut stderr_task).await
                };
                match tokio::time::timeout(self.drain_grace, drain).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("Draining output after kill: {}", e),
                    Err(_) => {
                        tracing::warn!(
                            "Output pipes still open {}s after kill, keeping partial output",
                            self.drain_grace.as_secs()
                        );
                        let stuck = [stdout_task.take(), stderr_task.take()];
                        for task in stuck.into_iter().flatten() {
                            task.abort();
                        }
                    }
                }
                (status, true)
            }
        };

        let (stdout, stdout_truncated) = stdout_buf.lock().await.render();
        let (stderr, stderr_truncated) = stderr_buf.lock().await.render();

        Ok(RunResult {
            stdout,
            stderr,
            exit_code: status
                .and_then(|s| s.code())
                .unwrap_or(EXIT_CODE_UNAVAILABLE),
            timed_out,
            truncated: stdout_truncated || stderr_truncated,
        })
    }
}

fn spawn_reader<R>(reader: R, sink: Arc<Mutex<CappedBuffer>>) -> Reader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move { pump(reader, &sink).await })
}

/// Await a reader at most once; a finished slot is left empty
async fn join_reader(slot: &mut Option<Reader>) -> Result<(), RunError> {
    let Some(handle) = slot.as_mut() else {
        return Ok(());
    };
    let joined = handle.await;
    *slot = None;
    joined?.map_err(RunError::Read)
}

/// First [`LOG_PREVIEW_CHARS`] characters of a command
fn preview(command: &str) -> String {
    command.chars().take(LOG_PREVIEW_CHARS).collect()
}

// ============================================================================
// Child Guard
// ============================================================================

/// Owns a spawned child and kills its process group unless it settled
///
/// A child is settled once it exited with both pipes closed, or after
/// [`ChildGuard::kill`]. Dropping an unsettled guard (a cancelled request, an
/// early `?`) sends SIGKILL to the group; `kill_on_drop` on the command
/// covers the shell itself and lets tokio reap it.
struct ChildGuard {
    child: Child,
    pgid: Option<u32>,
    settled: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        let pgid = child.id();
        Self {
            child,
            pgid,
            settled: false,
        }
    }

    async fn wait(&mut self) -> Result<ExitStatus, RunError> {
        self.child.wait().await.map_err(RunError::Wait)
    }

    fn settle(&mut self) {
        self.settled = true;
    }

    /// SIGKILL the group, reap the shell, and return its status if one exists
    async fn kill(&mut self) -> Option<ExitStatus> {
        self.signal_group();
        if let Err(e) = self.child.start_kill() {
            // Already exited; wait() below returns the cached status.
            tracing::debug!("start_kill: {}", e);
        }
        self.settled = true;
        match self.child.wait().await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!("Failed to reap killed command: {}", e);
                None
            }
        }
    }

    #[cfg(unix)]
    fn signal_group(&self) {
        let Some(pgid) = self.pgid.and_then(|id| libc::pid_t::try_from(id).ok()) else {
            return;
        };
        // SAFETY: killpg takes no pointers; pgid is the group created by
        // process_group(0) for this child.
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc != 0 {
            tracing::debug!(
                "killpg({}) failed: {}",
                pgid,
                std::io::Error::last_os_error()
            );
        }
    }

    #[cfg(not(unix))]
    fn signal_group(&self) {}
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.signal_group();
        }
    }
}
