use std::{
    io::Read,
    process::{Command, Output, Stdio},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use bitflags::bitflags;
use tracing::{debug, trace, Level};

use crate::result::CommandError;

pub const FFXXX_DEFAULT_ARGS: [&str; 3] = ["-hide_banner", "-loglevel", "error"];

/// How often a running child is checked for completion or cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(50);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDIN = 0b0000001;
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

/// Run a command, returning its raw output handle.
///
/// IO handles will be captured only if the caller required it or if the log level is Debug.
/// In that last case, `stdout` and `stderr` will be logged.
///
/// The function returns an error only if the command failed to execute.
/// If the program runs but returns a non-0 status code, it will not trigger an error.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output, CommandError> {
    let is_debug = tracing::enabled!(Level::DEBUG);
    let get_io = |capture| {
        if capture {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    };

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(get_io(capture.contains(Capture::STDIN)))
        .stdout(get_io(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(get_io(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let res = cmd.output().map_err(|source| CommandError::Spawn {
        program: program.to_owned(),
        source,
    })?;

    if is_debug {
        debug!("status: {}", res.status);
        debug!("stdout: {} bytes long", res.stdout.len());
        trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
        debug!("stderr: {} bytes long", res.stderr.len());
        trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    }

    Ok(res)
}

/// Run the command and verify that it has returned a success status code.
///
/// `stderr` is always captured to be part of the error.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output, CommandError> {
    let res = run_command(program, f, capture | Capture::STDERR)?;
    if res.status.success() {
        Ok(res)
    } else {
        Err(CommandError::Failed {
            program: program.to_owned(),
            status: res.status,
            stderr: String::from_utf8_lossy(&res.stderr).trim().to_owned(),
        })
    }
}

/// Run the command until it exits or `cancel` is raised, in which case the
/// child is killed.
///
/// `stderr` is always captured so it can be reported when the command fails.
pub fn run_cancellable<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    cancel: &AtomicBool,
) -> Result<(), CommandError> {
    let spawn_error = |source| CommandError::Spawn {
        program: program.to_owned(),
        source,
    };

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    debug!("Executing command: {cmd:?}");
    let mut child = cmd.spawn().map_err(spawn_error)?;

    // Drain stderr on the side, a full pipe would block the child forever
    let stderr = child.stderr.take();
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_end(&mut buf);
        }
        buf
    });

    let status = loop {
        if cancel.load(Ordering::Relaxed) {
            debug!("Cancellation requested, killing {program}");
            let _ = child.kill();
            let _ = child.wait();
            let _ = stderr_reader.join();
            return Err(CommandError::Cancelled(program.to_owned()));
        }

        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                return Err(spawn_error(err));
            }
        }
    };

    let stderr = stderr_reader.join().unwrap_or_default();
    let stderr = String::from_utf8_lossy(&stderr).trim().to_owned();
    debug!("status: {status}");
    trace!("stderr: {stderr:?}");

    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Failed {
            program: program.to_owned(),
            status,
            stderr,
        })
    }
}
