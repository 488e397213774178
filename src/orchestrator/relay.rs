//! Child process output relay
//!
//! Runs a command with stdout and stderr joined into one pipe and copies
//! each line to a sink as soon as it arrives. Lines are also captured so a
//! failed run can be reported with its output.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus};

use chrono::{DateTime, Utc};

/// Errors running a child process
#[derive(Debug, thiserror::Error)]
pub enum ChildError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {status}")]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        output: Vec<String>,
    },

    #[error("failed relaying output of '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ChildError {
    /// Output captured before the failure, if any.
    pub fn output(&self) -> &[String] {
        match self {
            ChildError::NonZeroExit { output, .. } => output,
            _ => &[],
        }
    }
}

/// A completed child run
#[derive(Debug, Clone)]
pub struct RelayReport {
    pub program: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Relayed lines without their line terminators
    pub lines: Vec<String>,
}

impl RelayReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Run `command`, relaying its joined output to `sink` line by line.
///
/// A non-zero exit is an error carrying the captured output.
pub fn run_relayed<W: Write>(command: Command, sink: &mut W) -> Result<RelayReport, ChildError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let started_at = Utc::now();

    let (mut child, output) = spawn_joined(command).map_err(|source| ChildError::Spawn {
        program: program.clone(),
        source,
    })?;

    let lines = match relay_lines(output, sink) {
        Ok(lines) => lines,
        Err(source) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ChildError::Io { program, source });
        }
    };

    let status = child.wait().map_err(|source| ChildError::Io {
        program: program.clone(),
        source,
    })?;

    if !status.success() {
        return Err(ChildError::NonZeroExit {
            program,
            status,
            output: lines,
        });
    }

    Ok(RelayReport {
        program,
        started_at,
        finished_at: Utc::now(),
        lines,
    })
}

fn relay_lines<R: Read, W: Write>(output: R, sink: &mut W) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(output);
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        sink.write_all(&buf)?;
        sink.flush()?;

        let line = String::from_utf8_lossy(&buf);
        lines.push(line.trim_end_matches(['\n', '\r']).to_string());
    }

    Ok(lines)
}

/// Spawn with stdout and stderr sharing one pipe so interleaving is
/// preserved. The command is dropped before returning: it holds the
/// parent's copies of the write end, and the read side only sees EOF once
/// every copy is closed.
#[cfg(unix)]
fn spawn_joined(mut command: Command) -> io::Result<(Child, Box<dyn Read + Send>)> {
    use std::fs::File;
    use std::process::Stdio;

    let (reader, writer) = nix::unistd::pipe().map_err(io::Error::from)?;
    set_cloexec(&reader)?;
    set_cloexec(&writer)?;
    let writer_for_stderr = writer.try_clone()?;

    command
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(writer_for_stderr));
    let child = command.spawn()?;
    drop(command);

    Ok((child, Box::new(File::from(reader))))
}

/// Keep a pipe end out of the child's exec image. The child still gets the
/// write end as its stdout/stderr: `dup2` onto fds 1 and 2 clears the flag.
#[cfg(unix)]
fn set_cloexec(fd: &std::os::fd::OwnedFd) -> io::Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use std::os::fd::AsRawFd;

    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(io::Error::from)?;
    Ok(())
}

#[cfg(not(unix))]
fn spawn_joined(mut command: Command) -> io::Result<(Child, Box<dyn Read + Send>)> {
    use std::process::Stdio;

    // No portable joined pipe here: stderr goes straight to the parent.
    command.stdout(Stdio::piped()).stderr(Stdio::inherit());
    let mut child = command.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "child stdout not captured"))?;

    Ok((child, Box::new(stdout)))
}
