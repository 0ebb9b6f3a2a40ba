//! Shared subprocess management.
//!
//! Provides [`run_command`], the spawn + capture + timeout logic used by
//! every executor. Each executor builds a [`tokio::process::Command`] for its
//! interpreter and delegates the rest here.
//!
//! Stdin is null. Stdout and stderr are read concurrently and merged into a
//! single buffer in arrival order. The buffer is not capped: a script that
//! writes a lot holds that memory until the run finishes.
//!
//! On unix the interpreter leads its own process group, so a timeout or
//! cancellation kills everything the script forked along with it.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::executor::{RunOptions, ScriptError, ScriptOutput};

/// How long to keep collecting output after the process has gone away.
///
/// A background grandchild can inherit the pipes and keep them open after
/// the interpreter exits; past this grace the remaining output is dropped.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(5);

const READ_CHUNK_BYTES: usize = 8 * 1024;

enum Exit {
    Finished(ExitStatus),
    TimedOut(Duration),
    Cancelled,
    WaitFailed(std::io::Error),
}

/// Spawn `cmd`, capture its combined output, and enforce `options`.
pub async fn run_command(
    mut cmd: Command,
    options: &RunOptions,
) -> Result<ScriptOutput, ScriptError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    // Jobs still queued when the pool gives up on them never start.
    if options.cancel.is_cancelled() {
        return Err(ScriptError::Cancelled {
            elapsed_ms: 0,
            output: String::new(),
        });
    }

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|source| ScriptError::Spawn { program, source })?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump(stderr, tx.clone()));
    }
    drop(tx);

    let exit = wait_for_exit(&mut child, options).await;

    let mut collected = Vec::new();
    if tokio::time::timeout(OUTPUT_DRAIN_GRACE, drain(&mut rx, &mut collected))
        .await
        .is_err()
    {
        tracing::warn!("Output pipes still open after process exit, dropping the remainder");
    }
    let output = String::from_utf8_lossy(&collected).into_owned();
    let elapsed_ms = elapsed_ms(start);

    match exit {
        Exit::Finished(status) => Ok(ScriptOutput {
            output,
            success: status.success(),
            exit_code: status.code(),
            duration_ms: elapsed_ms,
        }),
        Exit::TimedOut(limit) => Err(ScriptError::Timeout {
            limit,
            elapsed_ms,
            output,
        }),
        Exit::Cancelled => Err(ScriptError::Cancelled { elapsed_ms, output }),
        Exit::WaitFailed(e) => Err(ScriptError::Io(e)),
    }
}

async fn wait_for_exit(child: &mut Child, options: &RunOptions) -> Exit {
    let deadline = async {
        match options.timeout {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                limit
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => Exit::Finished(status),
            Err(e) => Exit::WaitFailed(e),
        },
        limit = deadline => {
            kill(child).await;
            Exit::TimedOut(limit)
        }
        () = options.cancel.cancelled() => {
            kill(child).await;
            Exit::Cancelled
        }
    }
}

/// Kill the child's process group, then the child itself, and reap it.
async fn kill(child: &mut Child) {
    #[cfg(unix)]
    kill_process_group(child);
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "Failed to kill child process");
    }
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Some(pgid) = child.id().and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // Safety: killpg only sends a signal. The group was created at spawn
    // with the child as its leader, and the child has not been reaped yet.
    let ret = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if ret != 0 {
        tracing::warn!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "Failed to kill process group"
        );
    }
}

/// Forward every chunk read from `reader` until EOF or a read error.
async fn pump<R: AsyncRead + Unpin>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
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

async fn drain(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>, out: &mut Vec<u8>) {
    while let Some(chunk) = rx.recv().await {
        out.extend_from_slice(&chunk);
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
