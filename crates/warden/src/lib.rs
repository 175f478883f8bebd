//! Process supervisor for a local Solr server.
//!
//! The crate owns argument parsing, configuration loading, and the
//! [`supervisor`] that builds the launch command, tracks the running instance
//! through its PID file, and reaps orphaned instances. The runtime is written
//! so tests can substitute the configuration loader, the IO streams, and
//! every process-level collaborator.

use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use warden_config::Config;

mod cli;
mod config;
mod errors;
pub mod supervisor;
pub mod telemetry;


use cli::{Cli, CliCommand};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use config::{command_arguments, split_config_arguments};
pub(crate) use errors::AppError;
use supervisor::{
    Bootstrapper, InstanceStatus, Launcher, ProcessControl, Supervisor, SupervisorError,
    SystemSupervisor,
};

/// LSB exit status for "program is dead and the PID file exists".
const EXIT_STALE: u8 = 1;
/// LSB exit status for "program is not running".
const EXIT_STOPPED: u8 = 3;

/// Line-oriented writer pair handed to command handlers.
pub(crate) struct Output<'a, W: Write, E: Write> {
    stdout: &'a mut W,
    stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> Output<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        self.stdout.write_fmt(args).map_err(AppError::Io)?;
        self.stdout.write_all(b"\n").map_err(AppError::Io)?;
        self.stdout.flush().map_err(AppError::Io)
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        self.stderr.write_fmt(args).map_err(AppError::Io)?;
        self.stderr.write_all(b"\n").map_err(AppError::Io)?;
        self.stderr.flush().map_err(AppError::Io)
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(
        args,
        &mut Output::new(stdout, stderr),
        &OrthoConfigLoader,
        SystemSupervisor::system,
    )
}

/// Runs the CLI with an injected loader and supervisor factory.
pub(crate) fn run_with<I, W, E, C, F, B, L, P>(
    args: I,
    output: &mut Output<'_, W, E>,
    loader: &C,
    supervisor_for: F,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    C: ConfigLoader,
    F: FnOnce(Config) -> Supervisor<B, L, P>,
    B: Bootstrapper,
    L: Launcher,
    P: ProcessControl,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(command_arguments(&args, &split)) {
        Ok(cli) => cli,
        Err(error) => return report_usage(error, output),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| {
            telemetry::initialise(&config)?;
            Ok(supervisor_for(config))
        })
        .and_then(|supervisor| execute(cli.command, &supervisor, output));

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            let _ = output.stderr_line(format_args!("{error}"));
            ExitCode::FAILURE
        }
    }
}

/// Executes one lifecycle command against `supervisor`.
pub(crate) fn execute<W, E, B, L, P>(
    command: CliCommand,
    supervisor: &Supervisor<B, L, P>,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
    B: Bootstrapper,
    L: Launcher,
    P: ProcessControl,
{
    match command {
        CliCommand::Start { detach: false } => Err(supervisor.start().into()),
        CliCommand::Start { detach: true } => {
            let pid = supervisor.start_detached()?;
            output.stdout_line(format_args!("solr started with pid {pid}"))?;
            output.stdout_line(format_args!("log: {}", supervisor.locator().log_path()))?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Stop => match supervisor.stop() {
            Ok(report) => {
                output.stdout_line(format_args!("solr stopped (pid {})", report.pid))?;
                report_sweep(report.sweep.count(), output)?;
                Ok(ExitCode::SUCCESS)
            }
            // Nothing to stop is a notice, but the orphan sweep still counts.
            Err(SupervisorError::NotRunning { reason, sweep }) => {
                output.stderr_line(format_args!("solr is not running: {reason}"))?;
                report_sweep(sweep.count(), output)?;
                Ok(ExitCode::FAILURE)
            }
            Err(error) => Err(error.into()),
        },
        CliCommand::Status => status(supervisor, output),
        CliCommand::Bootstrap => {
            if supervisor.bootstrap()? {
                output.stdout_line(format_args!("bootstrap complete"))?;
            } else {
                output.stdout_line(format_args!("bootstrap skipped in production"))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Sweep => {
            let report = supervisor.sweep_unowned();
            report_sweep(report.count(), output)?;
            if report.count() == 0 {
                output.stdout_line(format_args!("no stale processes found"))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Command => {
            let command = supervisor.launch_command()?;
            output.stdout_line(format_args!("{}", command.shell_line()))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn status<W, E, B, L, P>(
    supervisor: &Supervisor<B, L, P>,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
    B: Bootstrapper,
    L: Launcher,
    P: ProcessControl,
{
    let environment = supervisor.locator().environment();
    match supervisor.status()? {
        InstanceStatus::Running { pid } => {
            output.stdout_line(format_args!("solr ({environment}) is running with pid {pid}"))?;
            Ok(ExitCode::SUCCESS)
        }
        InstanceStatus::Stale { pid } => {
            output.stdout_line(format_args!(
                "solr ({environment}) is not running; stale pid file names {pid}"
            ))?;
            Ok(ExitCode::from(EXIT_STALE))
        }
        InstanceStatus::Stopped => {
            output.stdout_line(format_args!("solr ({environment}) is stopped"))?;
            Ok(ExitCode::from(EXIT_STOPPED))
        }
    }
}

fn report_sweep<W: Write, E: Write>(
    count: usize,
    output: &mut Output<'_, W, E>,
) -> Result<(), AppError> {
    if count > 0 {
        output.stdout_line(format_args!("terminated {count} stale solr process(es)"))?;
    }
    Ok(())
}

/// Help and version requests go to stdout and succeed; real usage errors
/// go to stderr.
fn report_usage<W: Write, E: Write>(error: clap::Error, output: &mut Output<'_, W, E>) -> ExitCode {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let rendered = error.render().to_string();
            let _ = output.stdout_line(format_args!("{}", rendered.trim_end()));
            ExitCode::SUCCESS
        }
        _ => {
            let usage = AppError::CliUsage(error).to_string();
            let _ = output.stderr_line(format_args!("{}", usage.trim_end()));
            ExitCode::FAILURE
        }
    }
}
