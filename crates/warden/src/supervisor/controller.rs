//! Start, stop, status, and sweep orchestration.
//!
//! The PID file is the single source of truth for "is an instance running,
//! and which one". `stop` trusts it without consulting the process table
//! first, and always removes it and sweeps for orphans once it was found.

use camino::Utf8Path;
use nix::sys::signal::Signal;
use tracing::{info, warn};
use warden_config::{Config, ProcessLocator, ReplicationRole};

use super::SUPERVISOR_TARGET;
use super::bootstrap::{Bootstrapper, SolrHomeBootstrapper};
use super::command::{CommandBuilder, LaunchCommand};
use super::error::{NotRunningError, SupervisorError};
use super::launcher::{Launcher, SystemLauncher};
use super::logging_properties::write_logging_properties;
use super::os::{ProcessControl, SignalError, SystemProcesses};
use super::pid_file::{PidFile, PidFileError, sibling_pids};
use super::reaper::{StaleProcessReaper, SweepReport};
use super::shutdown::{StopOutcome, StopPolicy, await_exit};

/// Observed state of the supervised instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    /// No PID file exists.
    Stopped,
    /// The PID file names a live process.
    Running { pid: u32 },
    /// The PID file names a process that no longer exists.
    Stale { pid: u32 },
}

/// Summary of a successful `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    /// PID read from the PID file and signalled.
    pub pid: u32,
    /// How the process responded to the stop policy.
    pub outcome: StopOutcome,
    /// Orphans terminated by the follow-up sweep.
    pub sweep: SweepReport,
}

/// Supervisor wired to the host operating system.
pub type SystemSupervisor = Supervisor<SolrHomeBootstrapper, SystemLauncher, SystemProcesses>;

/// Owns the lifecycle of one environment's server instance.
#[derive(Debug)]
pub struct Supervisor<B, L, P> {
    config: Config,
    locator: ProcessLocator,
    pid_file: PidFile,
    bootstrapper: B,
    launcher: L,
    processes: P,
    policy: StopPolicy,
    role: ReplicationRole,
}

impl SystemSupervisor {
    /// Builds a supervisor using the production collaborators.
    pub fn system(config: Config) -> Self {
        Self::new(config, SolrHomeBootstrapper, SystemLauncher, SystemProcesses)
    }
}

impl<B, L, P> Supervisor<B, L, P>
where
    B: Bootstrapper,
    L: Launcher,
    P: ProcessControl,
{
    /// Builds a supervisor with injected collaborators.
    ///
    /// The stop policy follows the configured `stop_timeout_secs` and the
    /// replication role is resolved once, here.
    pub fn new(config: Config, bootstrapper: B, launcher: L, processes: P) -> Self {
        let locator = ProcessLocator::from_config(&config);
        let pid_file = PidFile::new(locator.pid_path());
        let policy = StopPolicy::from_timeout(config.stop_timeout());
        let role = config.replication_role();
        Self {
            config,
            locator,
            pid_file,
            bootstrapper,
            launcher,
            processes,
            policy,
            role,
        }
    }

    pub fn with_policy(mut self, policy: StopPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the replication role advertised on launch.
    pub fn with_role(mut self, role: ReplicationRole) -> Self {
        self.role = role;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locator(&self) -> &ProcessLocator {
        &self.locator
    }

    pub fn pid_file(&self) -> &PidFile {
        &self.pid_file
    }

    /// Runs the setup collaborator unless the environment is production.
    ///
    /// Returns whether the collaborator ran.
    pub fn bootstrap(&self) -> Result<bool, SupervisorError> {
        if self.config.is_production() {
            info!(
                target: SUPERVISOR_TARGET,
                environment = %self.locator.environment(),
                "skipping bootstrap in production"
            );
            return Ok(false);
        }
        self.bootstrapper.bootstrap(&self.config, &self.locator)?;
        Ok(true)
    }

    /// Builds the launch command without touching the filesystem.
    pub fn launch_command(&self) -> Result<LaunchCommand, SupervisorError> {
        Ok(CommandBuilder::new(&self.config, &self.locator)
            .with_role(self.role)
            .with_logging_config(Some(self.locator.logging_config_path()))
            .build()?)
    }

    /// Starts the server in the foreground by replacing this process.
    ///
    /// The PID file is written before the exec because the server inherits
    /// this process's PID. Only returns on failure; the PID file is removed
    /// again when the exec fails.
    pub fn start(&self) -> SupervisorError {
        match self.prepare_start() {
            Ok(command) => self.exec(&command),
            Err(error) => error,
        }
    }

    /// Starts the server detached and records the child PID.
    pub fn start_detached(&self) -> Result<u32, SupervisorError> {
        self.ensure_not_running()?;
        self.bootstrap()?;
        let command = self.prepare_launch()?;
        let pid = self
            .launcher
            .spawn(&command, self.locator.log_path())
            .map_err(|source| SupervisorError::Spawn {
                program: command.program().to_owned(),
                source,
            })?;
        self.pid_file.write(pid)?;
        info!(
            target: SUPERVISOR_TARGET,
            pid,
            command = %command.shell_line(),
            log = %self.locator.log_path(),
            "solr started in background"
        );
        Ok(pid)
    }

    /// Stops the recorded instance.
    ///
    /// Once the PID file has been found it is always removed and a sweep
    /// excluding the recorded PID always runs, whatever the signal outcome.
    /// Without a usable PID file a sweep with no exclusion runs before the
    /// [`NotRunningError`] is returned. Every `NotRunning` error carries the
    /// sweep it triggered.
    pub fn stop(&self) -> Result<StopReport, SupervisorError> {
        let pid = match self.pid_file.read() {
            Ok(Some(pid)) => pid,
            Ok(None) => {
                let sweep = self.sweep(None);
                return Err(SupervisorError::not_running(
                    NotRunningError::NoPidFile {
                        path: self.pid_file.path().to_path_buf(),
                    },
                    sweep,
                ));
            }
            Err(PidFileError::Invalid { path, content }) => {
                warn!(
                    target: SUPERVISOR_TARGET,
                    file = %path,
                    %content,
                    "discarding unusable pid file"
                );
                let removed = self.pid_file.remove();
                let sweep = self.sweep(None);
                removed?;
                return Err(SupervisorError::not_running(
                    NotRunningError::InvalidPid { path },
                    sweep,
                ));
            }
            Err(error) => return Err(error.into()),
        };

        let signalled = self.terminate(pid);
        let removed = self.pid_file.remove();
        let sweep = self.sweep(Some(pid));
        let outcome = match signalled {
            Ok(outcome) => outcome,
            Err(SignalError::NoSuchProcess { pid }) => {
                return Err(SupervisorError::not_running(
                    NotRunningError::ProcessGone { pid },
                    sweep,
                ));
            }
            Err(error) => return Err(error.into()),
        };
        removed?;
        info!(target: SUPERVISOR_TARGET, pid, ?outcome, "solr stopped");
        Ok(StopReport {
            pid,
            outcome,
            sweep,
        })
    }

    /// Reports whether the recorded instance is alive.
    pub fn status(&self) -> Result<InstanceStatus, SupervisorError> {
        let Some(pid) = self.pid_file.read()? else {
            return Ok(InstanceStatus::Stopped);
        };
        if self.processes.is_alive(pid)? {
            Ok(InstanceStatus::Running { pid })
        } else {
            Ok(InstanceStatus::Stale { pid })
        }
    }

    /// Terminates orphaned instances, never touching `exclude`, sibling
    /// environments' instances, or the protected port.
    pub fn sweep(&self, exclude: Option<u32>) -> SweepReport {
        StaleProcessReaper::new(&self.processes)
            .with_protected_port(self.config.protected_port)
            .with_owned_pids(sibling_pids(&self.locator))
            .sweep(exclude)
    }

    /// Sweeps while protecting the PID recorded for this environment.
    pub fn sweep_unowned(&self) -> SweepReport {
        let recorded = self.pid_file.read().unwrap_or_else(|error| {
            warn!(target: SUPERVISOR_TARGET, %error, "ignoring unreadable pid file");
            None
        });
        self.sweep(recorded)
    }

    fn prepare_start(&self) -> Result<LaunchCommand, SupervisorError> {
        self.ensure_not_running()?;
        self.bootstrap()?;
        let command = self.prepare_launch()?;
        self.pid_file.write(std::process::id())?;
        Ok(command)
    }

    fn exec(&self, command: &LaunchCommand) -> SupervisorError {
        info!(
            target: SUPERVISOR_TARGET,
            command = %command.shell_line(),
            dir = command.working_dir().map_or("", Utf8Path::as_str),
            "starting solr in foreground"
        );
        let source = self.launcher.exec(command);
        if let Err(error) = self.pid_file.remove() {
            warn!(target: SUPERVISOR_TARGET, %error, "failed to remove pid file after exec failure");
        }
        SupervisorError::Exec {
            program: command.program().to_owned(),
            source,
        }
    }

    /// Creates runtime directories and the logging configuration, then
    /// builds the launch command.
    fn prepare_launch(&self) -> Result<LaunchCommand, SupervisorError> {
        self.locator.prepare()?;
        write_logging_properties(
            self.locator.logging_config_path(),
            self.locator.log_path(),
            self.config.java_log_level(),
        )?;
        self.launch_command()
    }

    /// Refuses to start over a live instance and clears stale PID files.
    fn ensure_not_running(&self) -> Result<(), SupervisorError> {
        let recorded = match self.pid_file.read() {
            Ok(recorded) => recorded,
            Err(PidFileError::Invalid { .. }) => {
                self.pid_file.remove()?;
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };
        let Some(pid) = recorded else {
            return Ok(());
        };
        if self.processes.is_alive(pid)? {
            return Err(SupervisorError::AlreadyRunning { pid });
        }
        warn!(target: SUPERVISOR_TARGET, pid, "removing stale pid file");
        self.pid_file.remove()?;
        Ok(())
    }

    fn terminate(&self, pid: u32) -> Result<StopOutcome, SignalError> {
        self.processes.signal(pid, Signal::SIGTERM)?;
        await_exit(&self.processes, pid, self.policy)
    }
}
