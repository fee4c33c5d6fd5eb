//! Child process plumbing shared by scripts and descriptor commands.
//!
//! [`capture`] spawns a prepared [`std::process::Command`] with three
//! independent pipes: a stdin writer fed from a scoped thread, and stdout and
//! stderr collected by [`Child::wait_with_output`]. The child is always
//! reaped before `capture` returns, whatever the outcome, so callers that go
//! on to reject the output (bad JSON, failed validation) never leak a
//! process or a pipe.
//!
//! Exit status is reported, not judged: [`Captured::check`] turns a non-zero
//! exit into [`ExecError::Exit`] for callers that care.

use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("command exited with {code}: {stderr}")]
    Exit { code: i32, stderr: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything a finished child produced.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    /// Exit code, or -1 when the child was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Fail with the exit code and verbatim stderr unless the child exited 0.
    pub fn check(self) -> Result<Self, ExecError> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(ExecError::Exit {
                code: self.code(),
                stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            })
        }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Attempts made when the executable is still held open for writing.
const BUSY_RETRIES: u32 = 5;

#[cfg(unix)]
const ETXTBSY: i32 = 26;

/// Spawn `cmd`, write `stdin` to it (or attach null stdin when `None`), and
/// wait for it to exit.
pub fn capture(mut cmd: Command, stdin: Option<&[u8]>) -> Result<Captured, ExecError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    debug!(
        program = %program,
        args = ?cmd.get_args().collect::<Vec<_>>(),
        dir = ?cmd.get_current_dir(),
        "spawning"
    );
    let mut child = spawn(&mut cmd).map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;

    let output = match (stdin, child.stdin.take()) {
        (Some(bytes), Some(pipe)) => thread::scope(|scope| {
            let writer = scope.spawn(move || feed(pipe, bytes));
            let output = child.wait_with_output();
            if let Ok(Err(err)) = writer.join() {
                warn!(program = %program, error = %err, "failed to write stdin");
            }
            output
        }),
        _ => child.wait_with_output(),
    }?;

    debug!(program = %program, status = %output.status, "exited");
    Ok(Captured {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

fn spawn(cmd: &mut Command) -> io::Result<Child> {
    let mut attempt = 0;
    loop {
        match cmd.spawn() {
            Err(err) if is_busy(&err) && attempt < BUSY_RETRIES => {
                attempt += 1;
                thread::sleep(Duration::from_millis(10 * u64::from(attempt)));
            }
            result => return result,
        }
    }
}

#[cfg(unix)]
fn is_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(ETXTBSY)
}

#[cfg(not(unix))]
fn is_busy(_err: &io::Error) -> bool {
    false
}

/// Write the payload and close the pipe. A child that exits without reading
/// its input is not an error.
fn feed(mut pipe: ChildStdin, bytes: &[u8]) -> io::Result<()> {
    match pipe.write_all(bytes) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}
