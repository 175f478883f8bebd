//! Derives environment-qualified runtime paths for the supervised server.
//!
//! The PID file, the log file, and the generated logging properties all embed
//! the environment name so several environments can share one project root
//! without clobbering each other. Derivation is pure; only
//! [`ProcessLocator::prepare`] touches the filesystem.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::{Config, Environment};

/// Prefix shared by every PID and log file the warden manages.
pub const PID_FILE_PREFIX: &str = "sunspot-solr";

/// Canonical runtime paths for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLocator {
    environment: Environment,
    pid_dir: Utf8PathBuf,
    pid_path: Utf8PathBuf,
    log_path: Utf8PathBuf,
    logging_config_path: Utf8PathBuf,
    data_dir: Option<Utf8PathBuf>,
}

impl ProcessLocator {
    /// Derives the runtime paths from a configuration snapshot.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let environment = config.environment();
        let pid_dir = pid_directory(config, &environment);
        let pid_path = pid_dir.join(format!("{PID_FILE_PREFIX}-{environment}.pid"));
        let logging_config_path =
            pid_dir.join(format!("{PID_FILE_PREFIX}-{environment}.logging.properties"));
        let log_path = config
            .project_root
            .join("log")
            .join(format!("{PID_FILE_PREFIX}-{environment}.log"));
        let data_dir = if environment.is_production() {
            Some(config.production_root.join("data").join("production"))
        } else {
            config.data_dir.clone()
        };
        Self {
            environment,
            pid_dir,
            pid_path,
            log_path,
            logging_config_path,
            data_dir,
        }
    }

    /// Creates the PID and log directories.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::CreateDirectory`] when a directory cannot be
    /// created.
    pub fn prepare(&self) -> Result<(), LocatorError> {
        create_directory(&self.pid_dir)?;
        if let Some(log_dir) = self.log_path.parent() {
            create_directory(log_dir)?;
        }
        Ok(())
    }

    /// Environment these paths belong to.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Directory holding PID files.
    #[must_use]
    pub fn pid_dir(&self) -> &Utf8Path {
        &self.pid_dir
    }

    /// Path to this environment's PID file.
    #[must_use]
    pub fn pid_path(&self) -> &Utf8Path {
        &self.pid_path
    }

    /// Path to the server log file.
    #[must_use]
    pub fn log_path(&self) -> &Utf8Path {
        &self.log_path
    }

    /// Path where the generated `logging.properties` is written.
    #[must_use]
    pub fn logging_config_path(&self) -> &Utf8Path {
        &self.logging_config_path
    }

    /// Index data directory, if one applies.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Utf8Path> {
        self.data_dir.as_deref()
    }

    /// Returns `true` when `name` is the PID file of another environment.
    #[must_use]
    pub fn is_sibling_pid_file(&self, name: &str) -> bool {
        let own = self.pid_path.file_name();
        name.starts_with(PID_FILE_PREFIX)
            && name.ends_with(".pid")
            && Some(name) != own
    }
}

fn pid_directory(config: &Config, environment: &Environment) -> Utf8PathBuf {
    if environment.is_production() {
        return config.production_root.join("pids");
    }
    config
        .pid_dir
        .clone()
        .unwrap_or_else(|| config.project_root.join("tmp").join("pids"))
}

fn create_directory(path: &Utf8Path) -> Result<(), LocatorError> {
    fs::create_dir_all(path).map_err(|source| LocatorError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors raised while preparing runtime directories.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// Creating a runtime directory failed.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
