//! Error surface of the supervisor.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use warden_config::LocatorError;

use super::bootstrap::BootstrapError;
use super::command::CommandError;
use super::logging_properties::LoggingPropertiesError;
use super::os::SignalError;
use super::pid_file::PidFileError;
use super::reaper::SweepReport;

/// Reasons `stop` found no instance to stop.
///
/// Callers decide whether this counts as success.
#[derive(Debug, Error)]
pub enum NotRunningError {
    /// No PID file exists for this environment.
    #[error("no PID file at {path}")]
    NoPidFile {
        /// Expected PID file location.
        path: Utf8PathBuf,
    },
    /// The PID file named a process that no longer exists.
    #[error("process with PID {pid} is no longer running")]
    ProcessGone {
        /// PID recorded in the removed PID file.
        pid: u32,
    },
    /// The PID file did not hold a usable PID.
    #[error("PID file at {path} does not hold a valid PID")]
    InvalidPid {
        /// Removed PID file location.
        path: Utf8PathBuf,
    },
}

/// Errors surfaced by [`Supervisor`](super::Supervisor) operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// `stop` found nothing to stop. The orphan sweep still ran.
    #[error("{reason}")]
    NotRunning {
        /// Why no instance was stopped.
        reason: NotRunningError,
        /// Result of the sweep that ran regardless.
        sweep: SweepReport,
    },
    /// Replacing the process image failed.
    #[error("failed to exec '{program}': {source}")]
    Exec {
        /// Program that could not be executed.
        program: String,
        #[source]
        source: io::Error,
    },
    /// Spawning the detached server failed.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that could not be spawned.
        program: String,
        #[source]
        source: io::Error,
    },
    /// A live instance already owns the PID file.
    #[error("solr already running with pid {pid}")]
    AlreadyRunning {
        /// PID recorded in the existing PID file.
        pid: u32,
    },
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    PidFile(#[from] PidFileError),
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    LoggingConfig(#[from] LoggingPropertiesError),
    #[error(transparent)]
    Signal(#[from] SignalError),
}

impl SupervisorError {
    pub(super) fn not_running(reason: NotRunningError, sweep: SweepReport) -> Self {
        Self::NotRunning { reason, sweep }
    }

    /// Returns `true` when the error only reports that nothing was running.
    pub fn is_not_running(&self) -> bool {
        matches!(self, Self::NotRunning { .. })
    }
}
