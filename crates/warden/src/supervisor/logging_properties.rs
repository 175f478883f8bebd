//! `java.util.logging` configuration for the launched server.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::debug;
use warden_config::JavaLogLevel;

use super::SUPERVISOR_TARGET;
use super::runtime_file::replace_runtime_file;

/// Failure to persist the generated logging configuration.
#[derive(Debug, Error)]
#[error("failed to write logging configuration '{path}': {source}")]
pub struct LoggingPropertiesError {
    path: Utf8PathBuf,
    #[source]
    source: io::Error,
}

/// Writes a properties file routing server logs to `log_path` at `level`.
///
/// The file is replaced atomically so a concurrently starting server never
/// reads a truncated configuration.
pub fn write_logging_properties(
    target: &Utf8Path,
    log_path: &Utf8Path,
    level: JavaLogLevel,
) -> Result<(), LoggingPropertiesError> {
    let contents = render(log_path, level);
    replace_runtime_file(target, &contents).map_err(|source| {
        LoggingPropertiesError {
            path: target.to_path_buf(),
            source,
        }
    })?;
    debug!(
        target: SUPERVISOR_TARGET,
        file = %target,
        %level,
        "logging configuration written"
    );
    Ok(())
}

fn render(log_path: &Utf8Path, level: JavaLogLevel) -> String {
    format!(
        "handlers = java.util.logging.FileHandler\n\
         .level = {level}\n\
         java.util.logging.FileHandler.level = {level}\n\
         java.util.logging.FileHandler.pattern = {pattern}\n\
         java.util.logging.FileHandler.append = true\n\
         java.util.logging.FileHandler.formatter = java.util.logging.SimpleFormatter\n",
        pattern = escape(log_path.as_str()),
    )
}

// Properties files treat backslashes as escapes and `%` as a FileHandler
// pattern placeholder.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "%%")
}
