#[cfg(test)]
#[path = "supervisor_test.rs"]
mod tests;

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::domain::models::OrchestratorError;
use crate::domain::models::ProcessResult;

const KILL_GRACE: Duration = Duration::from_secs(2);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);
const STDERR_TAIL_BYTES: usize = 64 * 1024;

/// A supervised long-running child, e.g. a dev server. The child lives in
/// its own process group and is `kill_on_drop`, so it cannot outlive the
/// session even on an unclean exit.
#[derive(Debug)]
pub struct BackgroundHandle {
    child: Child,
    pub command: String,
    stderr_tail: Arc<Mutex<Vec<u8>>>,
}

impl BackgroundHandle {
    pub fn is_running(&mut self) -> bool {
        return matches!(self.child.try_wait(), Ok(None));
    }

    pub async fn stderr_tail(&self) -> String {
        let buf = self.stderr_tail.lock().await;
        return String::from_utf8_lossy(&buf).to_string();
    }

    pub async fn stop(mut self) -> Result<()> {
        Supervisor::terminate(&mut self.child).await;
        return Ok(());
    }
}

pub struct Supervisor {}

impl Supervisor {
    fn spawn(program: &str, args: &[&str], cwd: &Path) -> Result<Child> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .with_context(|| return format!("failed to spawn {program}"))?;

        return Ok(child);
    }

    /// Terminates the child's whole process group: SIGTERM first, SIGKILL
    /// after a grace period. Always reaps the child before returning.
    async fn terminate(child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(-(pid as i32), libc::SIGTERM);
            }
            if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
                return;
            }
            unsafe {
                libc::kill(-(pid as i32), libc::SIGKILL);
            }
        }

        let _ = child.kill().await;
        let _ = child.wait().await;
    }

    /// Runs a command to completion under a deadline, collecting output.
    /// On timeout the process tree is terminated and the result carries
    /// `timed_out = true`.
    pub async fn run(
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<ProcessResult> {
        tracing::debug!(program = program, args = ?args, cwd = ?cwd, "Running command");

        let mut child = Supervisor::spawn(program, args, cwd)?;

        let mut stdout_pipe = child.stdout.take().unwrap();
        let mut stderr_pipe = child.stderr.take().unwrap();
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf).await;
            return buf;
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf).await;
            return buf;
        });

        let mut timed_out = false;
        let exit_code = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status?.code(),
            Err(_) => {
                tracing::warn!(program = program, "Command hit its deadline, killing");
                timed_out = true;
                Supervisor::terminate(&mut child).await;
                None
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_task.await?).to_string();
        let stderr = String::from_utf8_lossy(&stderr_task.await?).to_string();

        return Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
        });
    }

    /// Like `run`, but converts timeouts and non-zero exits into typed
    /// errors so callers only handle the success path.
    pub async fn check(
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<ProcessResult> {
        let command = format!("{program} {}", args.join(" ")).trim().to_string();
        let res = Supervisor::run(program, args, cwd, timeout).await?;

        if res.timed_out {
            return Err(OrchestratorError::OperationTimedOut {
                command,
                seconds: timeout.as_secs(),
            }
            .into());
        }

        if !res.success() {
            return Err(OrchestratorError::BuildOrInstallFailed {
                command,
                exit_code: res.exit_code.unwrap_or(-1),
                stderr: res.stderr.clone(),
            }
            .into());
        }

        return Ok(res);
    }

    /// Starts a long-lived child and waits until `ready_url` answers or the
    /// startup window lapses. A child that dies during startup is reported
    /// with its captured stderr; a slow one is handed back still supervised.
    pub async fn start_background(
        program: &str,
        args: &[&str],
        cwd: &Path,
        ready_url: &str,
        startup_timeout: Duration,
    ) -> Result<BackgroundHandle> {
        let command = format!("{program} {}", args.join(" ")).trim().to_string();
        let mut child = Supervisor::spawn(program, args, cwd)?;

        // Drain output so a chatty server never blocks on a full pipe. Only
        // the stderr tail is kept for diagnostics.
        let mut stdout_pipe = child.stdout.take().unwrap();
        tokio::spawn(async move {
            let mut sink = [0u8; 4096];
            while let Ok(n) = stdout_pipe.read(&mut sink).await {
                if n == 0 {
                    break;
                }
            }
        });

        let stderr_tail = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = stderr_tail.clone();
        let mut stderr_pipe = child.stderr.take().unwrap();
        tokio::spawn(async move {
            let mut chunk = [0u8; 4096];
            while let Ok(n) = stderr_pipe.read(&mut chunk).await {
                if n == 0 {
                    break;
                }
                let mut buf = stderr_buf.lock().await;
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() > STDERR_TAIL_BYTES {
                    let excess = buf.len() - STDERR_TAIL_BYTES;
                    buf.drain(..excess);
                }
            }
        });

        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + startup_timeout;

        loop {
            if let Ok(Some(status)) = child.try_wait() {
                let tail = {
                    let buf = stderr_tail.lock().await;
                    String::from_utf8_lossy(&buf).to_string()
                };
                return Err(OrchestratorError::BuildOrInstallFailed {
                    command,
                    exit_code: status.code().unwrap_or(-1),
                    stderr: tail,
                }
                .into());
            }

            let res = client
                .get(ready_url)
                .timeout(Duration::from_secs(1))
                .send()
                .await;
            if res.is_ok() {
                tracing::info!(url = ready_url, "Background process is ready");
                break;
            }

            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(
                    url = ready_url,
                    "Background process not ready within startup window, continuing supervised"
                );
                break;
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        return Ok(BackgroundHandle {
            child,
            command,
            stderr_tail,
        });
    }
}
