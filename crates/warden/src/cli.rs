//! CLI argument definitions for the warden.

use clap::{Parser, Subcommand};

const CONFIGURATION_HELP: &str = "\
Configuration flags go before the command, for example
`warden --environment production --port 8983 start --detach`.
Every flag also reads from a WARDEN_* environment variable and from the
TOML file named by --config-path.";

/// Supervises a local Solr server: start, stop, and reap orphaned instances.
#[derive(Parser, Debug)]
#[command(
    name = "warden",
    version,
    disable_help_subcommand = true,
    after_help = CONFIGURATION_HELP
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Lifecycle commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Starts Solr, replacing this process unless `--detach` is given.
    Start {
        /// Runs Solr in the background and records its PID.
        #[arg(long)]
        detach: bool,
    },
    /// Stops the recorded instance and reaps orphaned ones.
    Stop,
    /// Reports whether the recorded instance is running.
    Status,
    /// Prepares the Solr home and data directories.
    Bootstrap,
    /// Terminates orphaned Solr instances without stopping the recorded one.
    Sweep,
    /// Prints the launch command without running it.
    Command,
}
