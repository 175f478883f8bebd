//! Lifecycle supervision for a single Solr instance.
//!
//! The module is split into focused submodules so each concern remains small
//! and testable:
//! - [`command`] assembles the launch argument vector.
//! - [`pid_file`] persists the identity of the owned instance.
//! - [`runtime_file`] replaces PID and properties files atomically.
//! - [`os`] abstracts the process table and signal delivery.
//! - [`reaper`] terminates orphaned instances left behind by earlier runs.
//! - [`bootstrap`] prepares the Solr home and data directories.
//! - [`launcher`] replaces or spawns the server process.
//! - [`logging_properties`] renders the `java.util.logging` configuration.
//! - [`shutdown`] applies the stop escalation policy.
//! - [`controller`] orchestrates start, stop, status, and sweep.

mod bootstrap;
mod command;
mod controller;
mod error;
mod launcher;
mod logging_properties;
mod os;
mod pid_file;
mod reaper;
mod runtime_file;
mod shutdown;

pub(crate) const SUPERVISOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::supervisor");

pub use bootstrap::{BootstrapError, Bootstrapper, SolrHomeBootstrapper};
pub use command::{CommandBuilder, CommandError, LaunchCommand};
pub use controller::{InstanceStatus, StopReport, Supervisor, SystemSupervisor};
pub use error::{NotRunningError, SupervisorError};
pub use launcher::{Launcher, SystemLauncher};
pub use logging_properties::{LoggingPropertiesError, write_logging_properties};
pub use os::{ProcessControl, ProcessSnapshot, SignalError, SystemProcesses};
pub use pid_file::{PidFile, PidFileError, sibling_pids};
pub use reaper::{LAUNCH_SIGNATURE, StaleProcessReaper, SweepReport};
pub use shutdown::{StopOutcome, StopPolicy};
