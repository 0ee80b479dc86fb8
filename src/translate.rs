//! Whiteout translation: aufs markers to overlay2 markers inside one diff tree.
//!
//! | aufs                         | overlay2                                  |
//! |------------------------------|-------------------------------------------|
//! | `dir/.wh.<name>`             | `dir/<name>` as a 0/0 character device    |
//! | `dir/.wh..wh..opq`           | xattr `trusted.overlay.opaque=y` on `dir` |
//! | `.wh..wh.*` (plnk, aufs ...) | left in place, reported                   |
//!
//! The tree is walked once to collect markers, then the rewrites are applied,
//! so the walk never sees entries it created. Each rewrite creates the overlay
//! marker before removing the aufs one; an interrupted run leaves both and can
//! be repeated. Nothing is rolled back on error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::aufs::{classify, EntryClass};
use crate::fs_ops::io_error_with_help_io;
use crate::overlay::OPAQUE_XATTR;
use crate::platform::{is_whiteout_device, mknod_whiteout, set_opaque_xattr};

/// What a translation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Deletion markers rewritten as whiteout devices.
    pub whiteouts: usize,
    /// Directories marked opaque.
    pub opaque_dirs: usize,
    /// aufs bookkeeping entries (`.wh..wh.*`) that were left untranslated.
    pub untranslated_meta: Vec<PathBuf>,
}

impl TranslationReport {
    pub fn is_empty(&self) -> bool {
        self.whiteouts == 0 && self.opaque_dirs == 0 && self.untranslated_meta.is_empty()
    }
}

#[derive(Debug)]
enum Rewrite {
    Opaque { marker: PathBuf, dir: PathBuf },
    Whiteout { marker: PathBuf, target: PathBuf },
}

/// Rewrites aufs whiteouts in a diff tree.
#[derive(Debug, Clone)]
pub struct WhiteoutTranslator {
    opaque_xattr: String,
}

impl Default for WhiteoutTranslator {
    fn default() -> Self {
        Self {
            opaque_xattr: OPAQUE_XATTR.to_string(),
        }
    }
}

impl WhiteoutTranslator {
    /// Translator writing opacity under `opaque_xattr` (e.g. `user.overlay.opaque`
    /// for overlay mounts using `userxattr`).
    pub fn new(opaque_xattr: impl Into<String>) -> Self {
        Self {
            opaque_xattr: opaque_xattr.into(),
        }
    }

    pub fn opaque_xattr(&self) -> &str {
        &self.opaque_xattr
    }

    /// Translate every marker under `diff_dir`.
    pub fn translate(&self, diff_dir: &Path) -> io::Result<TranslationReport> {
        let meta = fs::metadata(diff_dir).map_err(io_error_with_help_io("open diff dir", diff_dir))?;
        if !meta.is_dir() {
            return Err(io_error_with_help_io("open diff dir", diff_dir)(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        let mut report = TranslationReport::default();
        let rewrites = self.collect(diff_dir, &mut report)?;

        for rewrite in rewrites {
            match rewrite {
                Rewrite::Opaque { marker, dir } => {
                    set_opaque_xattr(&dir, &self.opaque_xattr)
                        .map_err(io_error_with_help_io("set opaque xattr", &dir))?;
                    remove_marker(&marker)?;
                    trace!(dir = %dir.display(), "marked directory opaque");
                    report.opaque_dirs += 1;
                }
                Rewrite::Whiteout { marker, target } => {
                    create_whiteout(&target)?;
                    remove_marker(&marker)?;
                    trace!(path = %target.display(), "converted whiteout");
                    report.whiteouts += 1;
                }
            }
        }

        debug!(
            diff = %diff_dir.display(),
            whiteouts = report.whiteouts,
            opaque_dirs = report.opaque_dirs,
            untranslated_meta = report.untranslated_meta.len(),
            "translated whiteouts"
        );
        Ok(report)
    }

    fn collect(&self, diff_dir: &Path, report: &mut TranslationReport) -> io::Result<Vec<Rewrite>> {
        let mut rewrites = Vec::new();
        let mut walker = WalkDir::new(diff_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(diff_dir).to_path_buf();
                io_error_with_help_io("walk diff tree", &path)(io::Error::from(e))
            })?;
            let path = entry.path();
            let parent = path.parent().unwrap_or(diff_dir);

            match classify(entry.file_name()) {
                EntryClass::OpaqueMarker => rewrites.push(Rewrite::Opaque {
                    marker: path.to_path_buf(),
                    dir: parent.to_path_buf(),
                }),
                EntryClass::Meta => {
                    // Hardlink bookkeeping (.wh..wh.plnk) has no overlay2 equivalent yet.
                    warn!(path = %path.display(), "leaving aufs meta entry untranslated");
                    report.untranslated_meta.push(path.to_path_buf());
                    if entry.file_type().is_dir() {
                        walker.skip_current_dir();
                    }
                }
                EntryClass::Whiteout { target } => {
                    rewrites.push(Rewrite::Whiteout {
                        marker: path.to_path_buf(),
                        target: parent.join(target),
                    });
                    // The whole marker goes away; nothing below it is content.
                    if entry.file_type().is_dir() {
                        walker.skip_current_dir();
                    }
                }
                EntryClass::Ordinary => {}
            }
        }
        Ok(rewrites)
    }
}

/// Create the overlay whiteout at `target`, accepting one left by an earlier run.
fn create_whiteout(target: &Path) -> io::Result<()> {
    match mknod_whiteout(target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if is_whiteout_device(target).map_err(io_error_with_help_io("inspect whiteout", target))? {
                Ok(())
            } else {
                Err(io_error_with_help_io("create whiteout", target)(e))
            }
        }
        Err(e) => Err(io_error_with_help_io("create whiteout", target)(e)),
    }
}

fn remove_marker(marker: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(marker).map_err(io_error_with_help_io("inspect marker", marker))?;
    if meta.is_dir() {
        fs::remove_dir_all(marker).map_err(io_error_with_help_io("remove marker", marker))
    } else {
        fs::remove_file(marker).map_err(io_error_with_help_io("remove marker", marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_tree_is_untouched() {
        let td = tempdir().unwrap();
        fs::create_dir_all(td.path().join("etc")).unwrap();
        fs::write(td.path().join("etc/hosts"), b"127.0.0.1").unwrap();
        let report = WhiteoutTranslator::default().translate(td.path()).unwrap();
        assert!(report.is_empty());
        assert_eq!(fs::read(td.path().join("etc/hosts")).unwrap(), b"127.0.0.1");
    }

    #[test]
    fn meta_dirs_are_reported_and_not_descended() {
        let td = tempdir().unwrap();
        let plnk = td.path().join(".wh..wh.plnk");
        fs::create_dir_all(&plnk).unwrap();
        // Would be a whiteout if the walker descended.
        fs::write(plnk.join(".wh.inner"), b"").unwrap();
        let report = WhiteoutTranslator::default().translate(td.path()).unwrap();
        assert_eq!(report.untranslated_meta, vec![plnk.clone()]);
        assert_eq!(report.whiteouts, 0);
        assert!(plnk.join(".wh.inner").exists());
    }

    #[test]
    fn missing_diff_dir_fails() {
        let td = tempdir().unwrap();
        let err = WhiteoutTranslator::default()
            .translate(&td.path().join("absent"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn custom_xattr_key_is_kept() {
        let t = WhiteoutTranslator::new("user.overlay.opaque");
        assert_eq!(t.opaque_xattr(), "user.overlay.opaque");
        assert_eq!(WhiteoutTranslator::default().opaque_xattr(), OPAQUE_XATTR);
    }
}
