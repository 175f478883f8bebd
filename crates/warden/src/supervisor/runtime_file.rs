//! Private runtime files: PID files and generated logging properties.
//!
//! Other processes may read these files at any moment, so a write stages
//! the new contents in a hidden sibling and renames it over the target.
//! The runtime directory is created on demand because operators routinely
//! clear `tmp/pids` between runs.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;

use camino::Utf8Path;
use tempfile::Builder;

/// Runtime files are readable by their owner only.
const RUNTIME_FILE_MODE: u32 = 0o600;

/// Replaces `path` with `contents`.
pub(super) fn replace_runtime_file(path: &Utf8Path, contents: &str) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let name = path.file_name().unwrap_or("runtime");
    let mut staged = Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .permissions(Permissions::from_mode(RUNTIME_FILE_MODE))
        .tempfile_in(directory)?;
    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}
