// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Timed subprocess execution with combined output capture.

use funcbench_core::{Error, ExecutionError, ExecutionResult, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const READ_CHUNK: usize = 8 * 1024;

/// Runs external commands in an explicit working directory.
///
/// Stdout and stderr are merged into one buffer in arrival order. In verbose
/// mode the output is also streamed to the console as it arrives, and is then
/// left out of [`ExecutionError`] so it is not printed twice.
///
/// On unix each command leads its own process group. A terminal interrupt
/// therefore reaches only funcbench, and a timeout kills the command together
/// with everything it spawned.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    verbose: bool,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Runner without a timeout.
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            timeout: None,
        }
    }

    /// Bound every run by `timeout`. `None` or zero means unbounded.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Whether output is streamed to the console.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `program` with `args` in `cwd`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the process could not be started, [`Error::Execution`]
    /// on a non-zero exit or timeout.
    pub async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ExecutionResult> {
        let command_line = render_command(program, args);
        debug!(command = %command_line, cwd = %cwd.display(), "running command");

        let start = Instant::now();
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command.spawn()?;
        let pid = child.id();

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, tx));
        }

        let verbose = self.verbose;
        let mut output = Vec::new();
        let collect = async {
            while let Some(chunk) = rx.recv().await {
                if verbose {
                    let mut console = tokio::io::stdout();
                    let _ = console.write_all(&chunk).await;
                    let _ = console.flush().await;
                }
                output.extend_from_slice(&chunk);
            }
            child.wait().await
        };

        let status = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, collect).await.ok(),
            None => Some(collect.await),
        };

        let (status, timed_out) = match status {
            Some(status) => (Some(status?), false),
            None => {
                warn!(command = %command_line, "command timed out, killing it");
                kill_tree(&mut child, pid);
                let _ = child.wait().await;
                while let Ok(chunk) = rx.try_recv() {
                    output.extend_from_slice(&chunk);
                }
                (None, true)
            }
        };
        let elapsed = start.elapsed();
        let exit_code = status.and_then(|s| s.code());
        let output = String::from_utf8_lossy(&output).into_owned();

        match status {
            Some(status) if status.success() => {
                debug!(command = %command_line, elapsed_ms = elapsed.as_millis() as u64, "command finished");
                Ok(ExecutionResult {
                    output,
                    exit_code,
                    elapsed,
                    timed_out: false,
                })
            }
            _ => Err(Error::Execution(ExecutionError {
                command: command_line,
                elapsed,
                timed_out,
                exit_code,
                output: (!verbose).then_some(output),
            })),
        }
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child, pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = pid.and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw);
    match group.map(|group| killpg(group, Signal::SIGKILL)) {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            debug!(error = %e, "failed to kill process group, killing the command only");
            kill_child(child);
        }
        None => kill_child(child),
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child, _pid: Option<u32>) {
    kill_child(child);
}

fn kill_child(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to kill timed out command");
    }
}

async fn pump<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}

fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
