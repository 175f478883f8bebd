use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// `java.util.logging` level handed to the server's file handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum JavaLogLevel {
    /// Detailed tracing output.
    Fine,
    /// Informational messages.
    Info,
    /// Potential problems.
    Warning,
    /// Serious failures.
    Severe,
}

impl JavaLogLevel {
    /// Maps an application verbosity (0 = debug … 5 = unknown) onto a
    /// `java.util.logging` level.
    ///
    /// Values outside the table fall back to [`JavaLogLevel::Info`].
    #[must_use]
    pub const fn from_verbosity(level: u8) -> Self {
        match level {
            0 => Self::Fine,
            2 => Self::Warning,
            3 | 4 => Self::Severe,
            _ => Self::Info,
        }
    }
}
