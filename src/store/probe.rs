//! Store root probes.
//! Each probe returns the root path on success or a tagged `StoreRootMissing` error,
//! so the caller can abort before touching any layer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{MigrateError, StoreKind};

/// Check for `<engine_dir>/aufs`.
pub fn check_aufs_root(engine_dir: &Path) -> Result<PathBuf, MigrateError> {
    check_root(engine_dir, StoreKind::Aufs)
}

/// Check for `<engine_dir>/overlay2`.
pub fn check_overlay_root(engine_dir: &Path) -> Result<PathBuf, MigrateError> {
    check_root(engine_dir, StoreKind::Overlay2)
}

fn check_root(engine_dir: &Path, kind: StoreKind) -> Result<PathBuf, MigrateError> {
    let root = engine_dir.join(kind.dir_name());
    debug!(store = %kind, root = %root.display(), "checking if store root exists");
    match fs::metadata(&root) {
        Ok(meta) if meta.is_dir() => Ok(root),
        Ok(_) => Err(MigrateError::StoreRootMissing { kind, path: root }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(MigrateError::StoreRootMissing { kind, path: root })
        }
        Err(source) => Err(MigrateError::StoreRootUnreadable {
            kind,
            path: root,
            source,
        }),
    }
}
