//! Solr home and runtime directory preparation.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use warden_config::{Config, ProcessLocator};

use super::SUPERVISOR_TARGET;

/// Errors raised while preparing the server's directories.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A required directory could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Copying the Solr home template failed.
    #[error("failed to copy '{from}' to '{to}': {source}")]
    Copy {
        /// Template entry being copied.
        from: Utf8PathBuf,
        /// Destination entry.
        to: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The template contained a path that is not valid UTF-8.
    #[error("template entry under '{dir}' has a non UTF-8 name")]
    NonUtf8Entry {
        /// Directory holding the offending entry.
        dir: Utf8PathBuf,
    },
}

/// Prepares the server's on-disk layout before launch.
pub trait Bootstrapper {
    /// Runs the idempotent setup step.
    fn bootstrap(&self, config: &Config, locator: &ProcessLocator) -> Result<(), BootstrapError>;
}

/// Creates the data and PID directories and seeds the Solr home from the
/// distribution template when it has no configuration yet.
///
/// Existing files are never overwritten.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolrHomeBootstrapper;

impl Bootstrapper for SolrHomeBootstrapper {
    fn bootstrap(&self, config: &Config, locator: &ProcessLocator) -> Result<(), BootstrapError> {
        create_dir(locator.pid_dir())?;
        if let Some(data_dir) = locator.data_dir() {
            create_dir(data_dir)?;
        }
        let (Some(home), Some(install_dir)) = (config.solr_home(), config.install_dir.as_deref())
        else {
            return Ok(());
        };
        if home.join("conf").is_dir() {
            debug!(target: SUPERVISOR_TARGET, home = %home, "solr home already configured");
            return Ok(());
        }
        let template = install_dir.join("solr");
        if !template.is_dir() {
            debug!(
                target: SUPERVISOR_TARGET,
                template = %template,
                "no solr home template in distribution"
            );
            return Ok(());
        }
        let copied = copy_tree(&template, home)?;
        info!(
            target: SUPERVISOR_TARGET,
            home = %home,
            count = copied,
            "seeded solr home from distribution"
        );
        Ok(())
    }
}

fn create_dir(path: &Utf8Path) -> Result<(), BootstrapError> {
    fs::create_dir_all(path).map_err(|source| BootstrapError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Recursively copies `from` into `to`, skipping files that already exist.
///
/// Returns the number of files copied.
fn copy_tree(from: &Utf8Path, to: &Utf8Path) -> Result<usize, BootstrapError> {
    create_dir(to)?;
    let copy_error = |source| BootstrapError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    let mut copied = 0;
    for entry in fs::read_dir(from).map_err(copy_error)? {
        let entry = entry.map_err(copy_error)?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| BootstrapError::NonUtf8Entry {
                dir: from.to_path_buf(),
            })?;
        let source = from.join(&name);
        let destination = to.join(&name);
        if entry.file_type().map_err(copy_error)?.is_dir() {
            copied += copy_tree(&source, &destination)?;
        } else if !destination.exists() {
            fs::copy(&source, &destination).map_err(|error| BootstrapError::Copy {
                from: source.clone(),
                to: destination.clone(),
                source: error,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct Layout {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn layout() -> Layout {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let template = root.join("dist/solr/conf");
        fs::create_dir_all(&template).expect("create template");
        fs::write(template.join("schema.xml"), "<schema/>").expect("write schema");
        fs::write(template.join("solrconfig.xml"), "<config/>").expect("write config");
        Layout { _dir: dir, root }
    }

    fn config_for(layout: &Layout) -> Config {
        Config {
            project_root: layout.root.clone(),
            solr_home: Some(layout.root.join("home")),
            data_dir: Some(layout.root.join("data")),
            install_dir: Some(layout.root.join("dist")),
            ..Config::default()
        }
    }

    #[rstest]
    fn seeds_missing_home(layout: Layout) {
        let config = config_for(&layout);
        let locator = ProcessLocator::from_config(&config);

        SolrHomeBootstrapper
            .bootstrap(&config, &locator)
            .expect("bootstrap");

        assert!(layout.root.join("home/conf/schema.xml").is_file());
        assert!(layout.root.join("data").is_dir());
        assert!(locator.pid_dir().is_dir());
    }

    #[rstest]
    fn leaves_configured_home_untouched(layout: Layout) {
        let config = config_for(&layout);
        let locator = ProcessLocator::from_config(&config);
        let conf = layout.root.join("home/conf");
        fs::create_dir_all(&conf).expect("create conf");
        fs::write(conf.join("schema.xml"), "custom").expect("write custom schema");

        SolrHomeBootstrapper
            .bootstrap(&config, &locator)
            .expect("bootstrap");

        assert_eq!(
            fs::read_to_string(conf.join("schema.xml")).expect("read schema"),
            "custom"
        );
        assert!(!conf.join("solrconfig.xml").exists());
    }

    #[rstest]
    fn copy_never_overwrites(layout: Layout) {
        let home = layout.root.join("home");
        fs::create_dir_all(home.join("conf")).expect("create conf");
        fs::write(home.join("conf/schema.xml"), "custom").expect("write custom schema");

        let copied = copy_tree(&layout.root.join("dist/solr"), &home).expect("copy tree");

        assert_eq!(copied, 1);
        assert_eq!(
            fs::read_to_string(home.join("conf/schema.xml")).expect("read schema"),
            "custom"
        );
    }

    #[rstest]
    fn is_idempotent(layout: Layout) {
        let config = config_for(&layout);
        let locator = ProcessLocator::from_config(&config);
        SolrHomeBootstrapper
            .bootstrap(&config, &locator)
            .expect("first bootstrap");
        SolrHomeBootstrapper
            .bootstrap(&config, &locator)
            .expect("second bootstrap");
        assert!(layout.root.join("home/conf/solrconfig.xml").is_file());
    }

    #[rstest]
    fn without_template_only_creates_directories(layout: Layout) {
        let config = Config {
            install_dir: None,
            ..config_for(&layout)
        };
        let locator = ProcessLocator::from_config(&config);
        SolrHomeBootstrapper
            .bootstrap(&config, &locator)
            .expect("bootstrap");
        assert!(!layout.root.join("home").exists());
        assert!(layout.root.join("data").is_dir());
    }
}
