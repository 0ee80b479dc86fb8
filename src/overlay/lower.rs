//! Lower chain strings (`l/<ref>:l/<ref>...`) and their `<id>/lower` file.

use std::io;
use std::path::Path;
use tracing::debug;

use super::{layer_dir, LINK_DIR, LOWER_FILE, WORK_DIR};
use crate::fs_ops::{ensure_dir_with_mode, io_error_with_help_io};
use crate::platform::atomic_write;
use crate::store::{LayerId, LinkRef};

/// Append `link` to an existing lower chain.
///
/// ```
/// use a2o_migrate::{append_lower, LinkRef};
///
/// assert_eq!(append_lower("", &LinkRef::from("a")), "l/a");
/// assert_eq!(append_lower("l/a", &LinkRef::from("b")), "l/a:l/b");
/// ```
pub fn append_lower(lower: &str, link: &LinkRef) -> String {
    if lower.is_empty() {
        format!("{LINK_DIR}/{link}")
    } else {
        format!("{lower}:{LINK_DIR}/{link}")
    }
}

/// Fold links into a lower chain, keeping their order.
pub fn build_lower<'a>(links: impl IntoIterator<Item = &'a LinkRef>) -> String {
    links
        .into_iter()
        .fold(String::new(), |lower, link| append_lower(&lower, link))
}

/// Persist `lower` to `<overlay>/<layer>/lower` and create the layer's `work` dir.
///
/// Root layers have no lower chain; an empty `lower` writes nothing.
pub fn write_lower(overlay_root: &Path, layer: &LayerId, lower: &str) -> io::Result<()> {
    if lower.is_empty() {
        return Ok(());
    }
    let dir = layer_dir(overlay_root, layer);
    let lower_path = dir.join(LOWER_FILE);
    atomic_write(&lower_path, lower.as_bytes(), 0o644)
        .map_err(io_error_with_help_io("write lower file", &lower_path))?;

    let work = dir.join(WORK_DIR);
    ensure_dir_with_mode(&work, 0o700).map_err(io_error_with_help_io("create work dir", &work))?;

    debug!(layer = %layer, lower, "wrote lower chain");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn build_lower_keeps_order() {
        let links = [LinkRef::from("A"), LinkRef::from("B"), LinkRef::from("C")];
        assert_eq!(build_lower(&links), "l/A:l/B:l/C");
    }

    #[test]
    fn build_lower_of_nothing_is_empty() {
        assert_eq!(build_lower(&[] as &[LinkRef]), "");
    }

    #[test]
    fn write_lower_creates_file_and_work_dir() {
        let td = tempdir().unwrap();
        let layer = LayerId::from("child");
        fs::create_dir_all(td.path().join("child")).unwrap();
        write_lower(td.path(), &layer, "l/AAA").unwrap();
        assert_eq!(
            fs::read_to_string(td.path().join("child/lower")).unwrap(),
            "l/AAA"
        );
        assert!(td.path().join("child/work").is_dir());
    }

    #[test]
    fn write_lower_skips_root_layers() {
        let td = tempdir().unwrap();
        let layer = LayerId::from("root");
        fs::create_dir_all(td.path().join("root")).unwrap();
        write_lower(td.path(), &layer, "").unwrap();
        assert!(!td.path().join("root/lower").exists());
        assert!(!td.path().join("root/work").exists());
    }
}
