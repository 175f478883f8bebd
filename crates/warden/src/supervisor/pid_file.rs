//! PID file persistence.
//!
//! The PID file is the supervisor's only record of which instance it owns.
//! Its presence means "possibly running"; liveness is checked separately.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use warden_config::ProcessLocator;

use super::SUPERVISOR_TARGET;
use super::runtime_file::replace_runtime_file;

/// Errors raised while reading, writing, or removing a PID file.
#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("failed to read pid file '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pid file '{path}' does not hold a usable pid (found {content:?})")]
    Invalid { path: Utf8PathBuf, content: String },
    #[error("failed to write pid file '{path}': {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove pid file '{path}': {source}")]
    Remove {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle on one environment's PID file.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: Utf8PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the recorded PID.
    ///
    /// Returns `Ok(None)` when no PID file exists. The leading decimal digits
    /// are parsed so trailing newlines or annotations are tolerated.
    pub fn read(&self) -> Result<Option<u32>, PidFileError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => parse_pid(&content).map(Some).ok_or_else(|| {
                PidFileError::Invalid {
                    path: self.path.clone(),
                    content: content.trim().to_owned(),
                }
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PidFileError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Records `pid`, replacing any previous content atomically.
    pub fn write(&self, pid: u32) -> Result<(), PidFileError> {
        replace_runtime_file(&self.path, &format!("{pid}\n")).map_err(
            |source| PidFileError::Write {
                path: self.path.clone(),
                source,
            },
        )?;
        info!(
            target: SUPERVISOR_TARGET,
            pid,
            file = %self.path,
            "pid file written"
        );
        Ok(())
    }

    /// Deletes the PID file; a missing file is not an error.
    ///
    /// Returns whether a file was removed.
    pub fn remove(&self) -> Result<bool, PidFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(target: SUPERVISOR_TARGET, file = %self.path, "pid file removed");
                Ok(true)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(PidFileError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Collects the PIDs recorded by other environments sharing the PID
/// directory.
///
/// Unreadable or malformed files are skipped; an owned PID that cannot be
/// read simply loses its protection from the sweep.
pub fn sibling_pids(locator: &ProcessLocator) -> Vec<u32> {
    let Ok(entries) = fs::read_dir(locator.pid_dir()) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| locator.is_sibling_pid_file(name))
        })
        .filter_map(|entry| fs::read_to_string(entry.path()).ok())
        .filter_map(|content| parse_pid(&content))
        .collect()
}

fn parse_pid(content: &str) -> Option<u32> {
    let trimmed = content.trim_start();
    let digits = trimmed
        .find(|character: char| !character.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits.parse::<u32>().ok().filter(|pid| *pid != 0)
}
