use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::util::RingBytes;

use super::traits::TaskRunner;
use super::types::{BatchTask, ExecutionOpts, OutcomeStatus, OutputMode, TaskOutcome};

/// Runs each task as an OS process and waits for it to exit.
pub struct ProcessRunner {
    workdir: Option<PathBuf>,
    timeout: Option<Duration>,
    output: OutputMode,
    capture_bytes: usize,
}

impl ProcessRunner {
    pub fn new(opts: &ExecutionOpts) -> Self {
        Self {
            workdir: opts.workdir.as_ref().map(PathBuf::from),
            timeout: opts.timeout,
            output: opts.output,
            capture_bytes: opts.capture_bytes,
        }
    }

    fn command(&self, task: &BatchTask) -> Command {
        let mut cmd = Command::new(&task.command.program);
        cmd.args(task.argv())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        // A timed-out task is killed as a whole group, grandchildren included.
        // Without a timeout the child stays in our group so Ctrl-C reaches it.
        #[cfg(unix)]
        if self.timeout.is_some() {
            cmd.process_group(0);
        }

        match self.output {
            OutputMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Capture => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }
        cmd
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(&ExecutionOpts::default())
    }
}

#[async_trait]
impl TaskRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, task: &BatchTask) -> TaskOutcome {
        let start = Instant::now();
        let elapsed_ms = |start: Instant| start.elapsed().as_millis() as u64;

        let mut child = match self.command(task).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    "Failed to start '{}' for {}: {}",
                    task.command.program,
                    task.input.path.display(),
                    e
                );
                return TaskOutcome::new(
                    task,
                    OutcomeStatus::SpawnFailed {
                        error: e.to_string(),
                    },
                    elapsed_ms(start),
                );
            }
        };

        // Captured streams are drained into bounded rings while the child
        // runs; inherited streams are `None` and pump nothing.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut stdout_ring = RingBytes::new(self.capture_bytes);
        let mut stderr_ring = RingBytes::new(self.capture_bytes);

        let waited = async {
            let (status, _, _) = tokio::join!(
                child.wait(),
                pump(stdout, &mut stdout_ring),
                pump(stderr, &mut stderr_ring),
            );
            status
        };

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, waited).await.ok(),
            None => Some(waited.await),
        };

        let Some(result) = result else {
            let after_ms = self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0);
            tracing::warn!(
                "Task {} ({}) timed out after {}ms",
                task.index,
                task.input.path.display(),
                after_ms
            );
            kill_process_tree(&mut child);
            if let Err(e) = child.wait().await {
                tracing::debug!("reaping timed-out task {} failed: {}", task.index, e);
            }
            return TaskOutcome::new(
                task,
                OutcomeStatus::TimedOut { after_ms },
                elapsed_ms(start),
            );
        };

        let exit = match result {
            Ok(exit) => exit,
            Err(e) => {
                return TaskOutcome::new(
                    task,
                    OutcomeStatus::SpawnFailed {
                        error: format!("wait failed: {e}"),
                    },
                    elapsed_ms(start),
                );
            }
        };

        let status = if exit.success() {
            OutcomeStatus::Succeeded
        } else {
            OutcomeStatus::Failed {
                exit_code: exit.code(),
            }
        };

        let mut outcome = TaskOutcome::new(task, status, elapsed_ms(start));
        if self.output == OutputMode::Capture {
            outcome.stdout_tail = Some(stdout_ring.to_lossy_string());
            outcome.stderr_tail = Some(stderr_ring.to_lossy_string());
        }

        if !outcome.is_success() {
            match outcome.stderr_tail.as_deref().map(str::trim) {
                Some(stderr) if !stderr.is_empty() => tracing::warn!(
                    "{} failed ({}): {}",
                    task.input.path.display(),
                    outcome.status,
                    stderr
                ),
                _ => tracing::warn!("{} failed ({})", task.input.path.display(), outcome.status),
            }
        }

        outcome
    }
}

async fn pump<R>(reader: Option<R>, ring: &mut RingBytes)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => ring.push(&buf[..n]),
            Err(e) => {
                tracing::debug!("output pump stopped: {}", e);
                break;
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    // The child leads its own group (process_group(0)); a negative pid
    // signals every member.
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(
            "killpg({}) failed: {}",
            pid,
            std::io::Error::last_os_error()
        );
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.start_kill();
}
