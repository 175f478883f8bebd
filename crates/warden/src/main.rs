//! CLI entrypoint for the Solr process warden.
//!
//! The binary delegates to [`warden::run`], which loads configuration, parses
//! the lifecycle command, and drives the supervisor.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    warden::run(std::env::args_os(), &mut stdout, &mut stderr)
}
