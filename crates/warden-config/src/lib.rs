//! Shared configuration for the Solr process warden.
//!
//! [`Config`] is loaded through `ortho_config`, which layers the built-in
//! defaults, a TOML file (`--config-path` or `WARDEN_CONFIG_PATH`),
//! `WARDEN_*` environment variables, and command-line flags. The supervisor
//! treats the loaded value as a read-only snapshot: nothing in the workspace
//! reaches for ambient configuration once it has been loaded.
//!
//! [`ProcessLocator`] derives the environment-qualified runtime paths (PID
//! file, log file, generated logging properties) from a configuration
//! snapshot.

mod defaults;
mod environment;
mod locator;
mod logging;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ENVIRONMENT, DEFAULT_JAR_NAME, DEFAULT_JAVA, DEFAULT_LOG_FILTER, DEFAULT_LOG_LEVEL,
    DEFAULT_PRODUCTION_ROOT, default_log_filter, default_log_format, default_production_root,
    default_project_root,
};
pub use environment::{Environment, MASTER_ENV_VAR, ReplicationRole};
pub use locator::{LocatorError, PID_FILE_PREFIX, ProcessLocator};
pub use logging::{JavaLogLevel, LogFormat, LogFormatParseError};

/// Launch and supervision settings for a single Solr instance.
///
/// Optional fields are omitted from the launch command when absent; they are
/// never rendered as empty values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WARDEN")]
pub struct Config {
    /// Run environment name; `production` switches to the fixed layout.
    #[ortho_config(default = String::from(DEFAULT_ENVIRONMENT))]
    pub environment: String,
    /// Application root holding `tmp/pids` and `log/`.
    #[ortho_config(default = default_project_root())]
    pub project_root: Utf8PathBuf,
    /// Root holding PID files and index data in production.
    #[ortho_config(default = default_production_root())]
    pub production_root: Utf8PathBuf,
    /// Overrides the non-production PID directory.
    pub pid_dir: Option<Utf8PathBuf>,
    /// Solr home directory passed as `solr.solr.home`.
    pub solr_home: Option<Utf8PathBuf>,
    /// Index data directory outside production.
    pub data_dir: Option<Utf8PathBuf>,
    /// Server distribution providing `start.jar` and the Solr home template.
    pub install_dir: Option<Utf8PathBuf>,
    /// Explicit jar to launch; defaults to `start.jar` in `install_dir`.
    pub solr_jar: Option<Utf8PathBuf>,
    /// Executable used to run the jar.
    #[ortho_config(default = String::from(DEFAULT_JAVA))]
    pub java: String,
    /// Address Jetty binds to.
    pub bind_address: Option<String>,
    /// Port Jetty listens on.
    pub port: Option<u16>,
    /// Initial heap size, for example `256M`.
    pub min_memory: Option<String>,
    /// Maximum heap size, for example `512M`.
    pub max_memory: Option<String>,
    /// Application verbosity mapped onto a `java.util.logging` level.
    #[ortho_config(default = DEFAULT_LOG_LEVEL)]
    pub log_level: u8,
    /// Forces the replication master role.
    #[ortho_config(default = false)]
    pub master: bool,
    /// Port whose instance the stale-process sweep must never signal.
    pub protected_port: Option<u16>,
    /// Seconds to wait after SIGTERM before escalating to SIGKILL.
    pub stop_timeout_secs: Option<u64>,
    /// Tracing filter expression for the warden's own logs.
    #[ortho_config(default = String::from(DEFAULT_LOG_FILTER))]
    pub log_filter: String,
    /// Output format for the warden's own logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: String::from(DEFAULT_ENVIRONMENT),
            project_root: default_project_root(),
            production_root: default_production_root(),
            pid_dir: None,
            solr_home: None,
            data_dir: None,
            install_dir: None,
            solr_jar: None,
            java: String::from(DEFAULT_JAVA),
            bind_address: None,
            port: None,
            min_memory: None,
            max_memory: None,
            log_level: DEFAULT_LOG_LEVEL,
            master: false,
            protected_port: None,
            stop_timeout_secs: None,
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Returns the configured run environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        Environment::new(self.environment.as_str())
    }

    /// Returns `true` when running in production.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment().is_production()
    }

    /// Resolves the jar to launch.
    ///
    /// An explicit `solr_jar` wins; otherwise `start.jar` inside the
    /// distribution directory is used. Returns `None` when neither is set.
    #[must_use]
    pub fn solr_jar(&self) -> Option<Utf8PathBuf> {
        self.solr_jar.clone().or_else(|| {
            self.install_dir
                .as_deref()
                .map(|dir| dir.join(DEFAULT_JAR_NAME))
        })
    }

    /// Returns the configured Solr home.
    #[must_use]
    pub fn solr_home(&self) -> Option<&Utf8Path> {
        self.solr_home.as_deref()
    }

    /// Maps the configured verbosity onto a `java.util.logging` level.
    #[must_use]
    pub const fn java_log_level(&self) -> JavaLogLevel {
        JavaLogLevel::from_verbosity(self.log_level)
    }

    /// Returns the SIGKILL escalation deadline, if configured.
    #[must_use]
    pub fn stop_timeout(&self) -> Option<Duration> {
        self.stop_timeout_secs.map(Duration::from_secs)
    }

    /// Returns the replication role, combining the `master` setting with
    /// the [`MASTER_ENV_VAR`] signal.
    #[must_use]
    pub fn replication_role(&self) -> ReplicationRole {
        if self.master {
            ReplicationRole::Master
        } else {
            ReplicationRole::detect()
        }
    }

    /// Returns the configured tracing filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_jar_wins_over_install_dir() {
        let config = Config {
            solr_jar: Some(Utf8PathBuf::from("/opt/custom/solr.jar")),
            install_dir: Some(Utf8PathBuf::from("/opt/solr")),
            ..Config::default()
        };
        assert_eq!(
            config.solr_jar(),
            Some(Utf8PathBuf::from("/opt/custom/solr.jar"))
        );
    }

    #[test]
    fn jar_defaults_to_start_jar_in_install_dir() {
        let config = Config {
            install_dir: Some(Utf8PathBuf::from("/opt/solr")),
            ..Config::default()
        };
        assert_eq!(
            config.solr_jar(),
            Some(Utf8PathBuf::from("/opt/solr/start.jar"))
        );
    }

    #[test]
    fn jar_is_absent_without_sources() {
        assert_eq!(Config::default().solr_jar(), None);
    }

    #[test]
    fn stop_timeout_is_opt_in() {
        assert_eq!(Config::default().stop_timeout(), None);
        let config = Config {
            stop_timeout_secs: Some(3),
            ..Config::default()
        };
        assert_eq!(config.stop_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn master_setting_forces_master_role() {
        let config = Config {
            master: true,
            ..Config::default()
        };
        assert_eq!(config.replication_role(), ReplicationRole::Master);
    }
}
