//! Stale-process reaping.
//!
//! A sweep looks for server processes that carry the launch signature but
//! are not owned by any PID file, typically instances orphaned by a crashed
//! supervisor or a removed PID file, and asks them to terminate.

use nix::sys::signal::Signal;
use tracing::{debug, info, warn};

use super::SUPERVISOR_TARGET;
use super::os::{ProcessControl, ProcessSnapshot, SignalError};

/// Argument prefix every server launch carries.
pub const LAUNCH_SIGNATURE: &str = "-Dsolr.";

/// Aggregate result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// PIDs that accepted SIGTERM.
    pub terminated: Vec<u32>,
    /// PIDs that vanished before the signal landed.
    pub vanished: Vec<u32>,
}

impl SweepReport {
    /// Number of processes signalled successfully.
    pub fn count(&self) -> usize {
        self.terminated.len()
    }
}

/// Terminates signature-matching processes that the supervisor does not own.
#[derive(Debug)]
pub struct StaleProcessReaper<'a, P> {
    processes: &'a P,
    own_pid: u32,
    protected_port: Option<u16>,
    owned_pids: Vec<u32>,
}

impl<'a, P: ProcessControl> StaleProcessReaper<'a, P> {
    pub fn new(processes: &'a P) -> Self {
        Self {
            processes,
            own_pid: std::process::id(),
            protected_port: None,
            owned_pids: Vec::new(),
        }
    }

    /// Never signal an instance listening on `port`.
    pub fn with_protected_port(mut self, port: Option<u16>) -> Self {
        self.protected_port = port;
        self
    }

    /// Never signal these PIDs; used for instances owned by sibling
    /// environments.
    pub fn with_owned_pids(mut self, pids: impl IntoIterator<Item = u32>) -> Self {
        self.owned_pids.extend(pids);
        self
    }

    /// Lists the processes a sweep would signal.
    pub fn candidates(&self, exclude: Option<u32>) -> Vec<ProcessSnapshot> {
        let protected = self
            .protected_port
            .map(|port| format!("-Djetty.port={port}"));
        self.processes
            .snapshot()
            .into_iter()
            .filter(|process| carries_signature(process))
            .filter(|process| process.pid != self.own_pid)
            .filter(|process| Some(process.pid) != exclude)
            .filter(|process| !self.owned_pids.contains(&process.pid))
            .filter(|process| {
                protected
                    .as_deref()
                    .is_none_or(|flag| !process.has_argument(flag))
            })
            .collect()
    }

    /// Sends SIGTERM to every candidate.
    ///
    /// Per-process failures never abort the sweep; they are logged and the
    /// sweep moves on.
    pub fn sweep(&self, exclude: Option<u32>) -> SweepReport {
        let mut report = SweepReport::default();
        for process in self.candidates(exclude) {
            match self.processes.signal(process.pid, Signal::SIGTERM) {
                Ok(()) => {
                    debug!(
                        target: SUPERVISOR_TARGET,
                        pid = process.pid,
                        name = %process.name,
                        "terminated stale process"
                    );
                    report.terminated.push(process.pid);
                }
                Err(SignalError::NoSuchProcess { pid }) => report.vanished.push(pid),
                Err(error) => warn!(
                    target: SUPERVISOR_TARGET,
                    pid = process.pid,
                    %error,
                    "failed to terminate stale process"
                ),
            }
        }
        info!(
            target: SUPERVISOR_TARGET,
            count = report.count(),
            vanished = report.vanished.len(),
            "stale process sweep finished"
        );
        report
    }
}

fn carries_signature(process: &ProcessSnapshot) -> bool {
    process
        .arguments
        .iter()
        .any(|argument| argument.starts_with(LAUNCH_SIGNATURE))
}
