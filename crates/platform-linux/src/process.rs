//! External process helpers: bounded command execution and signal delivery.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use screencaster_common::error::{ScreencastError, ScreencastResult};
use wait_timeout::ChildExt;

/// Signals the supervisor sends to capture processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ask the process to finish its output and exit (Ctrl+C).
    Interrupt,
    Kill,
}

impl Signal {
    fn as_raw(self) -> libc::c_int {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Kill => libc::SIGKILL,
        }
    }
}

/// Deliver `signal` to `pid`. Returns whether the kernel accepted it.
///
/// Pid 0 and values outside `pid_t` are refused rather than signalling a
/// process group.
pub fn send_signal(pid: u32, signal: Signal) -> bool {
    let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw_pid <= 0 {
        return false;
    }
    unsafe { libc::kill(raw_pid, signal.as_raw()) == 0 }
}

/// Run `program` and return its stdout, killing it if it outlives `timeout`.
pub fn capture_output(program: &str, args: &[&str], timeout: Duration) -> ScreencastResult<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ScreencastError::platform(format!("Failed to run {program}: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ScreencastError::platform(format!("{program} stdout was not captured")))?;

    // Drain stdout concurrently so a chatty child never blocks on a full pipe.
    let reader = std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        buf
    });

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ScreencastError::platform(format!(
                "{program} did not finish within {timeout:?}"
            )));
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ScreencastError::platform(format!(
                "Failed to wait for {program}: {e}"
            )));
        }
    };

    let output = reader.join().unwrap_or_default();
    if !status.success() {
        return Err(ScreencastError::platform(format!(
            "{program} exited with {status}"
        )));
    }
    Ok(output)
}

/// Interrupt every running process named `name` (`killall -INT`).
///
/// Returns whether any process was signalled. Missing `killall` or no match
/// both count as "nothing signalled".
pub fn interrupt_by_name(name: &str) -> bool {
    Command::new("killall")
        .args(["-q", "-INT", name])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// This machine's host name, or `localhost` when it cannot be read.
pub fn hostname() -> String {
    ::hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
