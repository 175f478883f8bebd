//! Launch command assembly.
//!
//! [`CommandBuilder`] turns a configuration snapshot plus the environment
//! facts (production or not, replication role, logging properties) into an
//! ordered argument vector. Every optional flag is omitted when its source
//! value is absent or blank.

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use warden_config::{Config, ProcessLocator, ReplicationRole};

/// Errors raised while assembling the launch command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no server jar configured; set solr_jar or install_dir")]
    MissingJar,
    #[error("server jar path '{path}' has no file name")]
    JarWithoutFileName { path: Utf8PathBuf },
}

/// Fully resolved launch command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: String,
    arguments: Vec<String>,
    working_dir: Option<Utf8PathBuf>,
}

impl LaunchCommand {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Directory the command runs from: the jar's parent directory.
    pub fn working_dir(&self) -> Option<&Utf8Path> {
        self.working_dir.as_deref()
    }

    /// Returns `true` when `argument` appears in the argument list.
    pub fn contains(&self, argument: &str) -> bool {
        self.arguments.iter().any(|candidate| candidate == argument)
    }

    /// Renders the command as a single shell-quoted line.
    pub fn shell_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(&self.arguments))
    }

    /// Builds a [`Command`] executing the program directly, without a shell.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.arguments);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Assembles the launch command for one configuration snapshot.
#[derive(Debug)]
pub struct CommandBuilder<'a> {
    config: &'a Config,
    locator: &'a ProcessLocator,
    role: ReplicationRole,
    logging_config: Option<&'a Utf8Path>,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a Config, locator: &'a ProcessLocator) -> Self {
        Self {
            config,
            locator,
            role: config.replication_role(),
            logging_config: None,
        }
    }

    /// Overrides the replication role detected from the environment.
    pub fn with_role(mut self, role: ReplicationRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_logging_config(mut self, path: Option<&'a Utf8Path>) -> Self {
        self.logging_config = path;
        self
    }

    pub fn build(&self) -> Result<LaunchCommand, CommandError> {
        let config = self.config;
        let jar = config.solr_jar().ok_or(CommandError::MissingJar)?;
        let jar_name = jar
            .file_name()
            .ok_or_else(|| CommandError::JarWithoutFileName { path: jar.clone() })?
            .to_owned();

        let mut arguments = Vec::new();
        push_flag(&mut arguments, "-Xms", config.min_memory.as_deref());
        push_flag(&mut arguments, "-Xmx", config.max_memory.as_deref());
        push_flag(
            &mut arguments,
            "-Djetty.port=",
            config.port.map(|port| port.to_string()).as_deref(),
        );
        push_flag(
            &mut arguments,
            "-Djetty.host=",
            config.bind_address.as_deref(),
        );
        push_flag(
            &mut arguments,
            "-Dsolr.solr.home=",
            config.solr_home().map(Utf8Path::as_str),
        );
        push_flag(
            &mut arguments,
            "-Dsolr.data.dir=",
            self.locator.data_dir().map(Utf8Path::as_str),
        );
        if config.is_production() {
            arguments.push(String::from("-Dsolr.enable.replication=true"));
        }
        match self.role {
            ReplicationRole::Master => arguments.push(String::from("-Dsolr.enable.master=true")),
            ReplicationRole::Slave => arguments.push(String::from("-Dsolr.enable.slave=true")),
        }
        push_flag(
            &mut arguments,
            "-Djava.util.logging.config.file=",
            self.logging_config.map(Utf8Path::as_str),
        );
        arguments.push(String::from("-jar"));
        arguments.push(jar_name);

        Ok(LaunchCommand {
            program: config.java.clone(),
            arguments,
            working_dir: jar
                .parent()
                .filter(|parent| !parent.as_str().is_empty())
                .map(Utf8Path::to_path_buf),
        })
    }
}

fn push_flag(arguments: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        arguments.push(format!("{flag}{value}"));
    }
}
