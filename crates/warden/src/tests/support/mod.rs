//! Test support utilities for supervisor coverage.
//!
//! Supplies recording collaborators and a temporary project layout so unit
//! tests and step definitions can drive a [`Supervisor`] without touching
//! real processes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::io;
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};
use nix::sys::signal::Signal;
use rstest::fixture;
use tempfile::TempDir;
use warden_config::{Config, ProcessLocator, ReplicationRole};

use crate::supervisor::{
    BootstrapError, Bootstrapper, LaunchCommand, Launcher, ProcessControl, ProcessSnapshot,
    SignalError, Supervisor,
};

pub(crate) type TestSupervisor =
    Supervisor<RecordingBootstrapper, RecordingLauncher, FakeProcesses>;

/// Counts bootstrap invocations.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingBootstrapper {
    calls: Rc<Cell<usize>>,
}

impl RecordingBootstrapper {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Bootstrapper for RecordingBootstrapper {
    fn bootstrap(&self, _config: &Config, _locator: &ProcessLocator) -> Result<(), BootstrapError> {
        self.calls.set(self.calls.get() + 1);
        Ok(())
    }
}

/// Records launches instead of running anything.
#[derive(Debug, Clone)]
pub(crate) struct RecordingLauncher {
    execs: Rc<RefCell<Vec<LaunchCommand>>>,
    spawns: Rc<RefCell<Vec<LaunchCommand>>>,
    spawn_pid: Rc<Cell<Option<u32>>>,
}

impl Default for RecordingLauncher {
    fn default() -> Self {
        Self {
            execs: Rc::default(),
            spawns: Rc::default(),
            spawn_pid: Rc::new(Cell::new(Some(5150))),
        }
    }
}

impl RecordingLauncher {
    pub fn execs(&self) -> Vec<LaunchCommand> {
        self.execs.borrow().clone()
    }

    pub fn spawns(&self) -> Vec<LaunchCommand> {
        self.spawns.borrow().clone()
    }

    /// Makes subsequent spawns fail.
    pub fn fail_spawns(&self) {
        self.spawn_pid.set(None);
    }
}

impl Launcher for RecordingLauncher {
    fn exec(&self, command: &LaunchCommand) -> io::Error {
        self.execs.borrow_mut().push(command.clone());
        io::Error::new(io::ErrorKind::NotFound, "exec disabled in tests")
    }

    fn spawn(&self, command: &LaunchCommand, _log_path: &Utf8Path) -> io::Result<u32> {
        self.spawns.borrow_mut().push(command.clone());
        self.spawn_pid
            .get()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "spawn disabled in tests"))
    }
}

#[derive(Debug, Default)]
struct ProcessTable {
    processes: Vec<ProcessSnapshot>,
    alive: BTreeSet<u32>,
    ignores_term: BTreeSet<u32>,
    signals: Vec<(u32, Signal)>,
    snapshots: usize,
}

/// In-memory process table that records every signal.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeProcesses {
    table: Rc<RefCell<ProcessTable>>,
}

impl FakeProcesses {
    /// Adds a live server process listening on `port`.
    pub fn add_solr(&self, pid: u32, port: u16) {
        let mut table = self.table.borrow_mut();
        table.processes.push(ProcessSnapshot {
            pid,
            parent_pid: Some(1),
            name: String::from("java"),
            arguments: vec![
                String::from("java"),
                format!("-Djetty.port={port}"),
                String::from("-Dsolr.solr.home=/srv/solr"),
                String::from("-jar"),
                String::from("start.jar"),
            ],
        });
        table.alive.insert(pid);
    }

    /// Makes `pid` survive SIGTERM.
    pub fn ignore_term(&self, pid: u32) {
        self.table.borrow_mut().ignores_term.insert(pid);
    }

    pub fn is_running(&self, pid: u32) -> bool {
        self.table.borrow().alive.contains(&pid)
    }

    pub fn signals(&self) -> Vec<(u32, Signal)> {
        self.table.borrow().signals.clone()
    }

    pub fn signalled(&self, pid: u32) -> bool {
        self.signals().iter().any(|(target, _)| *target == pid)
    }

    pub fn snapshots(&self) -> usize {
        self.table.borrow().snapshots
    }
}

impl ProcessControl for FakeProcesses {
    fn snapshot(&self) -> Vec<ProcessSnapshot> {
        let mut table = self.table.borrow_mut();
        table.snapshots += 1;
        let alive = table.alive.clone();
        table
            .processes
            .iter()
            .filter(|process| alive.contains(&process.pid))
            .cloned()
            .collect()
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        let mut table = self.table.borrow_mut();
        if !table.alive.contains(&pid) {
            return Err(SignalError::NoSuchProcess { pid });
        }
        table.signals.push((pid, signal));
        if signal == Signal::SIGKILL || !table.ignores_term.contains(&pid) {
            table.alive.remove(&pid);
        }
        Ok(())
    }

    fn is_alive(&self, pid: u32) -> Result<bool, SignalError> {
        Ok(self.table.borrow().alive.contains(&pid))
    }
}

/// Temporary project layout plus the collaborators wired into a supervisor.
pub(crate) struct Harness {
    _dir: TempDir,
    pub root: Utf8PathBuf,
    pub config: Config,
    pub bootstrapper: RecordingBootstrapper,
    pub launcher: RecordingLauncher,
    pub processes: FakeProcesses,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let config = Config {
            environment: String::from("test"),
            project_root: root.clone(),
            production_root: root.join("production"),
            solr_jar: Some(root.join("solr/start.jar")),
            ..Config::default()
        };
        Self {
            _dir: dir,
            root,
            config,
            bootstrapper: RecordingBootstrapper::default(),
            launcher: RecordingLauncher::default(),
            processes: FakeProcesses::default(),
        }
    }

    /// Builds a supervisor over the recording collaborators.
    ///
    /// The role is pinned so a `SOLR_MASTER` set on the host cannot leak in.
    pub fn supervisor(&self) -> TestSupervisor {
        Supervisor::new(
            self.config.clone(),
            self.bootstrapper.clone(),
            self.launcher.clone(),
            self.processes.clone(),
        )
        .with_role(ReplicationRole::Slave)
    }

    pub fn locator(&self) -> ProcessLocator {
        ProcessLocator::from_config(&self.config)
    }

    pub fn pid_path(&self) -> Utf8PathBuf {
        self.locator().pid_path().to_path_buf()
    }

    /// Writes raw content to this environment's PID file.
    pub fn write_pid_file(&self, content: &str) {
        let path = self.pid_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create pid dir");
        }
        std::fs::write(&path, content).expect("write pid file");
    }
}

#[fixture]
pub(crate) fn harness() -> Harness {
    Harness::new()
}
