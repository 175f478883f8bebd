//! Stop policies.
//!
//! SIGTERM is always delivered first. Under [`StopPolicy::Escalate`] the
//! supervisor then polls for the process to exit and sends SIGKILL once the
//! deadline passes.

use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use tracing::{debug, warn};

use super::SUPERVISOR_TARGET;
use super::os::{ProcessControl, SignalError};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How `stop` treats a process that ignores SIGTERM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Send SIGTERM and return immediately.
    #[default]
    Graceful,
    /// Send SIGKILL if the process is still alive after `timeout`.
    Escalate {
        /// Grace period granted after SIGTERM.
        timeout: Duration,
    },
}

impl StopPolicy {
    /// Escalates only when a timeout is supplied.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or(Self::Graceful, |timeout| Self::Escalate { timeout })
    }
}

/// What happened to the signalled process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// SIGTERM was delivered; exit was not awaited.
    Signalled,
    /// The process exited within the grace period.
    Exited,
    /// The process outlived the grace period and received SIGKILL.
    Killed,
}

/// Applies `policy` to a process that has already received SIGTERM.
pub(super) fn await_exit<P: ProcessControl>(
    processes: &P,
    pid: u32,
    policy: StopPolicy,
) -> Result<StopOutcome, SignalError> {
    let StopPolicy::Escalate { timeout } = policy else {
        return Ok(StopOutcome::Signalled);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if !processes.is_alive(pid)? {
            debug!(target: SUPERVISOR_TARGET, pid, "process exited after SIGTERM");
            return Ok(StopOutcome::Exited);
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
    warn!(
        target: SUPERVISOR_TARGET,
        pid,
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        "process ignored SIGTERM; sending SIGKILL"
    );
    match processes.signal(pid, Signal::SIGKILL) {
        Ok(()) => Ok(StopOutcome::Killed),
        Err(SignalError::NoSuchProcess { .. }) => Ok(StopOutcome::Exited),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use nix::sys::signal::Signal;

    use super::*;
    use crate::supervisor::os::ProcessSnapshot;

    /// Process table whose single process dies after a number of probes.
    struct Stubborn {
        probes_until_exit: Option<usize>,
        probes: Cell<usize>,
        killed: Cell<bool>,
    }

    impl Stubborn {
        fn new(probes_until_exit: Option<usize>) -> Self {
            Self {
                probes_until_exit,
                probes: Cell::new(0),
                killed: Cell::new(false),
            }
        }
    }

    impl ProcessControl for Stubborn {
        fn snapshot(&self) -> Vec<ProcessSnapshot> {
            Vec::new()
        }

        fn signal(&self, _pid: u32, signal: Signal) -> Result<(), SignalError> {
            if signal == Signal::SIGKILL {
                self.killed.set(true);
            }
            Ok(())
        }

        fn is_alive(&self, _pid: u32) -> Result<bool, SignalError> {
            let probes = self.probes.get() + 1;
            self.probes.set(probes);
            Ok(self
                .probes_until_exit
                .is_none_or(|limit| probes < limit))
        }
    }

    #[test]
    fn graceful_policy_does_not_wait() {
        let processes = Stubborn::new(None);
        let outcome = await_exit(&processes, 42, StopPolicy::Graceful).expect("await exit");
        assert_eq!(outcome, StopOutcome::Signalled);
        assert_eq!(processes.probes.get(), 0);
    }

    #[test]
    fn exited_process_is_not_killed() {
        let processes = Stubborn::new(Some(2));
        let policy = StopPolicy::Escalate {
            timeout: Duration::from_secs(2),
        };
        let outcome = await_exit(&processes, 42, policy).expect("await exit");
        assert_eq!(outcome, StopOutcome::Exited);
        assert!(!processes.killed.get());
    }

    #[test]
    fn stubborn_process_is_killed_after_deadline() {
        let processes = Stubborn::new(None);
        let policy = StopPolicy::Escalate {
            timeout: Duration::from_millis(50),
        };
        let outcome = await_exit(&processes, 42, policy).expect("await exit");
        assert_eq!(outcome, StopOutcome::Killed);
        assert!(processes.killed.get());
    }

    #[test]
    fn policy_follows_configured_timeout() {
        assert_eq!(StopPolicy::from_timeout(None), StopPolicy::Graceful);
        assert_eq!(
            StopPolicy::from_timeout(Some(Duration::from_secs(5))),
            StopPolicy::Escalate {
                timeout: Duration::from_secs(5)
            }
        );
    }
}
