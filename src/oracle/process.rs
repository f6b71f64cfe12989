//! Bounded subprocess execution.
//!
//! Every child gets null stdin and piped stdout/stderr, and is killed if
//! it outlives its time limit. `kill_on_drop` covers the remaining exits
//! (a cancelled request, a panic in the caller).

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// Result of a bounded run.
#[derive(Debug)]
pub(crate) enum Bounded {
    Finished {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        elapsed: Duration,
    },
    TimedOut,
}

/// Spawn `cmd` and wait for it, at most `limit`.
///
/// Spawn failures are returned as `Err`; everything after a successful
/// spawn is an `Ok(Bounded)`.
pub(crate) async fn run_bounded(mut cmd: Command, limit: Duration) -> io::Result<Bounded> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let mut child = cmd.spawn()?;
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let finished = tokio::time::timeout(limit, async {
        let (out, err, status) = tokio::join!(
            drain(stdout_pipe.as_mut(), &mut stdout),
            drain(stderr_pipe.as_mut(), &mut stderr),
            child.wait(),
        );
        out.and(err).and(status)
    })
    .await;

    match finished {
        Ok(status) => Ok(Bounded::Finished {
            status: status?,
            stdout,
            stderr,
            elapsed: started.elapsed(),
        }),
        Err(_) => {
            // kill() waits for the child, so nothing is left unreaped.
            if let Err(e) = child.kill().await {
                debug!(error = %e, "child already gone at timeout");
            }
            Ok(Bounded::TimedOut)
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> io::Result<()> {
    match pipe {
        Some(p) => p.read_to_end(buf).await.map(|_| ()),
        None => Ok(()),
    }
}
