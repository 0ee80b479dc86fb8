//! Default path helpers and symlink checks.
//! Resolves the config file (env override or platform config dir) and the default log file.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file (or a directory holding `config.xml`).
pub const CONFIG_ENV: &str = "A2O_MIGRATE_CONFIG";
/// Per-user directory name under the platform config/data dirs.
pub const APP_DIR: &str = "a2o_migrate";
pub const CONFIG_FILE_NAME: &str = "config.xml";
pub const LOG_FILE_NAME: &str = "a2o_migrate.log";

/// Config path: `$A2O_MIGRATE_CONFIG` if set, else `<config dir>/a2o_migrate/config.xml`.
///
/// A relative override is resolved against the current directory; an override
/// naming an existing directory means `config.xml` inside it.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV) {
        let mut p = PathBuf::from(raw);
        if p.is_relative() {
            p = env::current_dir().ok()?.join(p);
        }
        if p.is_dir() {
            p.push(CONFIG_FILE_NAME);
        }
        return Some(p);
    }
    if let Some(base) = config_dir() {
        Some(base.join(APP_DIR).join(CONFIG_FILE_NAME))
    } else {
        env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config").join(APP_DIR).join(CONFIG_FILE_NAME))
    }
}

/// Default log file under the platform data dir. The directory is created by
/// the logger, not here.
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(base) = data_dir() {
        Some(base.join(APP_DIR).join(LOG_FILE_NAME))
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join(APP_DIR)
                .join(LOG_FILE_NAME)
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}
