//! Operating-system process access.
//!
//! [`ProcessControl`] is the seam between the supervisor and the process
//! table: enumeration for the stale sweep, signal delivery, and liveness
//! probes. [`SystemProcesses`] backs it with `sysinfo` and `nix`.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use thiserror::Error;

/// Point-in-time view of one OS process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub arguments: Vec<String>,
}

impl ProcessSnapshot {
    /// Returns `true` when any argument equals `argument`.
    pub fn has_argument(&self, argument: &str) -> bool {
        self.arguments.iter().any(|candidate| candidate == argument)
    }
}

/// Errors raised while signalling or probing a process.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("process with PID {pid} does not exist")]
    NoSuchProcess { pid: u32 },
    #[error("refusing to signal pid {pid}: {reason}")]
    InvalidPid { pid: u32, reason: &'static str },
    #[error("failed to signal pid {pid}: {source}")]
    Os {
        pid: u32,
        #[source]
        source: Errno,
    },
}

/// Access to the OS process table and signal delivery.
pub trait ProcessControl {
    /// Lists every visible process, one entry per thread group.
    fn snapshot(&self) -> Vec<ProcessSnapshot>;

    /// Delivers `signal` to `pid`.
    fn signal(&self, pid: u32, signal: Signal) -> Result<(), SignalError>;

    /// Reports whether `pid` still exists.
    fn is_alive(&self, pid: u32) -> Result<bool, SignalError>;
}

/// Process access backed by the host operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn snapshot(&self) -> Vec<ProcessSnapshot> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
        );
        // Linux reports each thread as a task carrying its leader's command
        // line. Signalling a task signals the whole group, so only leaders
        // may ever become sweep candidates.
        system
            .processes()
            .values()
            .filter(|process| process.thread_kind().is_none())
            .map(|process| ProcessSnapshot {
                pid: process.pid().as_u32(),
                parent_pid: process.parent().map(|parent| parent.as_u32()),
                name: process.name().to_string_lossy().into_owned(),
                arguments: process
                    .cmd()
                    .iter()
                    .map(|argument| argument.to_string_lossy().into_owned())
                    .collect(),
            })
            .collect()
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        match kill(to_nix_pid(pid)?, signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(SignalError::NoSuchProcess { pid }),
            Err(source) => Err(SignalError::Os { pid, source }),
        }
    }

    fn is_alive(&self, pid: u32) -> Result<bool, SignalError> {
        match kill(to_nix_pid(pid)?, None) {
            Ok(()) | Err(Errno::EPERM) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(source) => Err(SignalError::Os { pid, source }),
        }
    }
}

/// Converts a recorded PID into a signal target.
///
/// Zero and values beyond `i32::MAX` would address a process group rather
/// than a single process, so both are rejected.
fn to_nix_pid(pid: u32) -> Result<Pid, SignalError> {
    if pid == 0 {
        return Err(SignalError::InvalidPid {
            pid,
            reason: "pid 0 addresses the caller's process group",
        });
    }
    let raw = i32::try_from(pid).map_err(|_| SignalError::InvalidPid {
        pid,
        reason: "pid exceeds i32::MAX",
    })?;
    Ok(Pid::from_raw(raw))
}
