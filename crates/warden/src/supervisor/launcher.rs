//! Process launch strategies.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::Stdio;

use camino::Utf8Path;

use super::command::LaunchCommand;

/// Starts the server process.
pub trait Launcher {
    /// Replaces the current process image with `command`.
    ///
    /// Only returns when the exec itself failed.
    fn exec(&self, command: &LaunchCommand) -> io::Error;

    /// Spawns `command` detached from the caller and returns its PID.
    ///
    /// Standard output and error are appended to `log_path`.
    fn spawn(&self, command: &LaunchCommand, log_path: &Utf8Path) -> io::Result<u32>;
}

/// Launcher backed by `execvp(3)` and `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn exec(&self, command: &LaunchCommand) -> io::Error {
        command.to_command().exec()
    }

    fn spawn(&self, command: &LaunchCommand, log_path: &Utf8Path) -> io::Result<u32> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        let child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log)
            // A fresh process group keeps terminal signals aimed at the
            // supervisor away from the server.
            .process_group(0)
            .spawn()?;
        Ok(child.id())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;
    use warden_config::{Config, ProcessLocator, ReplicationRole};

    use super::*;
    use crate::supervisor::command::CommandBuilder;

    #[test]
    fn spawn_appends_output_to_log() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let log_path = root.join("solr.log");
        fs::write(&log_path, "previous\n").expect("seed log");

        // `echo` stands in for the JVM: it prints its arguments and exits.
        let config = Config {
            java: "echo".to_owned(),
            solr_jar: Some(root.join("start.jar")),
            ..Config::default()
        };
        let locator = ProcessLocator::from_config(&config);
        let command = CommandBuilder::new(&config, &locator)
            .with_role(ReplicationRole::Slave)
            .build()
            .expect("build command");

        let pid = SystemLauncher
            .spawn(&command, &log_path)
            .expect("spawn echo");
        assert!(pid > 0);

        let mut contents = String::new();
        for _ in 0..50 {
            contents = fs::read_to_string(&log_path).expect("read log");
            if contents.contains("start.jar") {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(contents.starts_with("previous\n"), "log: {contents}");
        assert!(contents.contains("-Dsolr.enable.slave=true -jar start.jar"));
    }

    #[test]
    fn spawn_reports_missing_program() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let config = Config {
            java: root.join("no-such-java").into_string(),
            solr_jar: Some(root.join("start.jar")),
            ..Config::default()
        };
        let locator = ProcessLocator::from_config(&config);
        let command = CommandBuilder::new(&config, &locator)
            .build()
            .expect("build command");

        let result = SystemLauncher.spawn(&command, &root.join("solr.log"));
        assert!(result.is_err());
    }
}
