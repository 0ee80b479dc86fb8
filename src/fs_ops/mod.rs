//! Filesystem helpers shared by the store modules.

mod helpers;

pub use helpers::{io_error_with_help, io_error_with_help_io};

use std::fs;
use std::io;
use std::path::Path;

/// Create `dir` (and parents) if missing, then apply `mode` when it was newly created.
/// An existing directory keeps its permissions.
pub fn ensure_dir_with_mode(dir: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("'{}' exists but is not a directory", dir.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            match fs::create_dir_all(dir) {
                Ok(()) => {}
                // Lost a race with another creator; fine as long as it is a dir now.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => return Ok(()),
                Err(e) => return Err(e),
            }
            fs::set_permissions(dir, fs::Permissions::from_mode(mode))
        }
        Err(e) => Err(e),
    }
}

/// True when something (of any type, dangling symlinks included) exists at `path`.
pub fn entry_exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
