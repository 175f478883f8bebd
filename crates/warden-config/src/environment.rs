use std::convert::Infallible;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::defaults::DEFAULT_ENVIRONMENT;

/// Environment variable whose presence selects the replication master role.
pub const MASTER_ENV_VAR: &str = "SOLR_MASTER";

const PRODUCTION: &str = "production";

/// Named run environment (for example `development` or `production`).
///
/// The name qualifies every runtime artefact so environments sharing a
/// project root never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Environment(String);

impl Environment {
    /// Builds an environment from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the environment name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the production environment.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.0 == PRODUCTION
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(DEFAULT_ENVIRONMENT)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(value.trim()))
    }
}

/// Replication role advertised to the server on launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationRole {
    /// Serves index updates to slaves.
    Master,
    /// Pulls index updates from a master.
    Slave,
}

impl ReplicationRole {
    /// Selects the role from an explicit master signal.
    #[must_use]
    pub const fn from_signal(master: bool) -> Self {
        if master { Self::Master } else { Self::Slave }
    }

    /// Reads the master signal from [`MASTER_ENV_VAR`].
    #[must_use]
    pub fn detect() -> Self {
        Self::from_signal(env::var_os(MASTER_ENV_VAR).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_production_is_production() {
        assert!(Environment::new("production").is_production());
        assert!(!Environment::new("staging").is_production());
        assert!(!Environment::default().is_production());
    }

    #[test]
    fn parsing_trims_whitespace() {
        let parsed: Environment = " test ".parse().unwrap_or_default();
        assert_eq!(parsed.as_str(), "test");
    }

    #[test]
    fn master_signal_selects_role() {
        assert_eq!(ReplicationRole::from_signal(true), ReplicationRole::Master);
        assert_eq!(ReplicationRole::from_signal(false), ReplicationRole::Slave);
    }
}
