//! Shared fixtures: a throwaway engine dir with both stores, plus capability probes.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use a2o_migrate::platform::mknod_whiteout;
use a2o_migrate::LayerId;

pub struct Engine {
    pub td: TempDir,
    pub aufs: PathBuf,
    pub overlay: PathBuf,
}

impl Engine {
    pub fn new() -> Self {
        let td = tempfile::tempdir().expect("create tempdir");
        let aufs = td.path().join("aufs");
        let overlay = td.path().join("overlay2");
        fs::create_dir_all(aufs.join("layers")).expect("create aufs/layers");
        fs::create_dir_all(&overlay).expect("create overlay2");
        Self { td, aufs, overlay }
    }

    pub fn dir(&self) -> &Path {
        self.td.path()
    }

    /// Write `aufs/layers/<id>` and create `overlay2/<id>/diff`.
    pub fn layer(&self, id: &str, parents: &[&str]) -> LayerId {
        let mut record = parents.join("\n");
        if !record.is_empty() {
            record.push('\n');
        }
        fs::write(self.aufs.join("layers").join(id), record).expect("write ancestry");
        fs::create_dir_all(self.diff(id)).expect("create diff");
        LayerId::from(id)
    }

    pub fn diff(&self, id: &str) -> PathBuf {
        self.overlay.join(id).join("diff")
    }

    pub fn link_of(&self, id: &str) -> String {
        fs::read_to_string(self.overlay.join(id).join("link")).expect("read link record")
    }

    pub fn lower_of(&self, id: &str) -> Option<String> {
        fs::read_to_string(self.overlay.join(id).join("lower")).ok()
    }
}

/// True when this process may create device nodes (root or CAP_MKNOD).
pub fn can_mknod() -> bool {
    let td = tempfile::tempdir().expect("create tempdir");
    mknod_whiteout(&td.path().join("probe")).is_ok()
}

/// First opaque xattr key the tempdir filesystem accepts, if any.
/// `trusted.*` needs CAP_SYS_ADMIN; `user.*` needs xattr support on tmpfs/ext4.
pub fn usable_opaque_xattr() -> Option<&'static str> {
    let td = tempfile::tempdir().expect("create tempdir");
    ["trusted.overlay.opaque", "user.overlay.opaque"]
        .into_iter()
        .find(|key| xattr::set(td.path(), key, b"y").is_ok())
}

pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}
