//! Configuration loading helpers for the warden CLI.
//!
//! Configuration flags must precede the subcommand. They are separated from
//! the command tokens here so `ortho_config` only ever sees the flags it
//! understands while clap parses the rest.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use warden_config::Config;

use crate::AppError;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `warden_config::Config`.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--environment",
    "--project-root",
    "--production-root",
    "--pid-dir",
    "--solr-home",
    "--data-dir",
    "--install-dir",
    "--solr-jar",
    "--java",
    "--bind-address",
    "--port",
    "--min-memory",
    "--max-memory",
    "--log-level",
    "--master",
    "--protected-port",
    "--stop-timeout-secs",
    "--log-filter",
    "--log-format",
];

/// Configuration flags that never take a value.
const VALUELESS_FLAGS: &[&str] = &["--master"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if !CONFIG_CLI_FLAGS.contains(&flag) {
        return FlagAction::Skip;
    }
    FlagAction::Include {
        needs_value: !has_inline_value && !VALUELESS_FLAGS.contains(&flag),
    }
}

pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some(program) = args.first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut index = 1;
    while let Some(argument) = args.get(index) {
        let FlagAction::Include { needs_value } = classify(argument) else {
            break;
        };
        config_arguments.push(argument.clone());
        index += 1;
        if needs_value && let Some(value) = args.get(index) {
            config_arguments.push(value.clone());
            index += 1;
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start: index,
    }
}

/// Rebuilds the argument list clap parses: the program name followed by the
/// command tokens.
pub(crate) fn command_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.get(split.command_start..).unwrap_or_default())
        .cloned()
        .collect()
}
