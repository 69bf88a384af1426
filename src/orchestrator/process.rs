//! Lifecycle of a single history query process

use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// How a query process ended; pipes and handle are already released
#[derive(Debug)]
pub(crate) enum ProcessExit {
    Exited {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    SpawnFailed(io::Error),
    StreamFailed(io::Error),
    /// Killed and reaped after `abort` fired
    Terminated,
}

/// Spawn `command` with piped output, buffer both streams until exit, and
/// kill the process if `abort` fires first
pub(crate) async fn run_to_exit(mut command: Command, abort: CancellationToken) -> ProcessExit {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ProcessExit::SpawnFailed(e),
    };

    let collected = tokio::select! {
        biased;
        result = collect(&mut child) => Some(result),
        _ = abort.cancelled() => None,
    };

    match collected {
        Some(Ok((status, stdout, stderr))) => ProcessExit::Exited {
            status,
            stdout,
            stderr,
        },
        Some(Err(e)) => {
            terminate(&mut child).await;
            ProcessExit::StreamFailed(e)
        }
        None => {
            terminate(&mut child).await;
            ProcessExit::Terminated
        }
    }
}

/// Drain stdout and stderr concurrently, then wait for exit
///
/// Both pipes are read together so a process filling its stderr buffer can
/// never stall while stdout is being read. The pipes are dropped before the
/// wait, or with this future if it is abandoned.
async fn collect(child: &mut Child) -> io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    tokio::try_join!(
        drain(stdout_pipe.as_mut(), &mut stdout),
        drain(stderr_pipe.as_mut(), &mut stderr),
    )?;
    drop(stdout_pipe);
    drop(stderr_pipe);

    let status = child.wait().await?;
    Ok((status, stdout, stderr))
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buffer: &mut Vec<u8>) -> io::Result<()> {
    if let Some(pipe) = pipe {
        pipe.read_to_end(buffer).await?;
    }
    Ok(())
}

/// Kill the process and reap it so no zombie outlives the batch
async fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        // Already exited and reaped
        tracing::debug!("Kill skipped: {}", e);
    }
    if let Err(e) = child.wait().await {
        tracing::warn!("Failed to reap terminated history query: {}", e);
    }
}
