use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Environment assumed when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Root under which production PID files and index data live.
pub const DEFAULT_PRODUCTION_ROOT: &str = "/var/lib/sunspot-solr";

/// Executable used to launch the server artefact.
pub const DEFAULT_JAVA: &str = "java";

/// Jar started from the distribution directory when no explicit jar is set.
pub const DEFAULT_JAR_NAME: &str = "start.jar";

/// Verbosity used when none is configured; maps to `INFO`.
pub const DEFAULT_LOG_LEVEL: u8 = 1;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binary.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binary.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Project root used for non-production runtime files.
#[must_use]
pub fn default_project_root() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

/// Root used for production runtime files.
#[must_use]
pub fn default_production_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_PRODUCTION_ROOT)
}
