//! Ancestry records under `<aufs>/layers/<id>`.
//!
//! Each record lists the layer's ancestors, one id per line, nearest parent
//! first. An empty record marks a root layer; a missing record is an error.
//! Nothing here checks that the listed ancestors exist or form a DAG; the
//! layer graph in `migrate` owns that.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

use crate::fs_ops::io_error_with_help_io;
use crate::store::LayerId;

/// Directory of ancestry records inside the aufs root.
pub const LAYERS_DIR: &str = "layers";

/// Ordered ancestors of one layer, nearest parent first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AncestryChain {
    parents: Vec<LayerId>,
}

impl AncestryChain {
    pub fn new(parents: Vec<LayerId>) -> Self {
        Self { parents }
    }

    /// Parse record contents. Blank lines are skipped; order and duplicates are kept.
    pub fn parse(contents: &str) -> Self {
        let parents = contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(LayerId::from)
            .collect();
        Self { parents }
    }

    pub fn parents(&self) -> &[LayerId] {
        &self.parents
    }

    /// True for a root layer (no ancestors).
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayerId> {
        self.parents.iter()
    }
}

impl<'a> IntoIterator for &'a AncestryChain {
    type Item = &'a LayerId;
    type IntoIter = std::slice::Iter<'a, LayerId>;

    fn into_iter(self) -> Self::IntoIter {
        self.parents.iter()
    }
}

/// Path of the ancestry record for `layer`.
pub fn ancestry_path(aufs_root: &Path, layer: &LayerId) -> PathBuf {
    aufs_root.join(LAYERS_DIR).join(layer.as_str())
}

/// Read and parse the ancestry record of `layer`.
pub fn read_ancestry(aufs_root: &Path, layer: &LayerId) -> io::Result<AncestryChain> {
    let path = ancestry_path(aufs_root, layer);
    let contents =
        fs::read_to_string(&path).map_err(io_error_with_help_io("read ancestry record", &path))?;
    let chain = AncestryChain::parse(&contents);
    trace!(layer = %layer, parents = chain.len(), "read ancestry record");
    Ok(chain)
}

/// List every layer that has an ancestry record, sorted by id.
/// Hidden entries (editor/temporary files) and non-files are ignored.
pub fn list_layers(aufs_root: &Path) -> io::Result<Vec<LayerId>> {
    let dir = aufs_root.join(LAYERS_DIR);
    let entries = fs::read_dir(&dir).map_err(io_error_with_help_io("list layers", &dir))?;

    let mut layers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_error_with_help_io("list layers", &dir))?;
        let file_type = entry
            .file_type()
            .map_err(io_error_with_help_io("stat layer record", &entry.path()))?;
        if !file_type.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().map(str::to_owned) else {
            warn!(
                name = %file_name.to_string_lossy(),
                dir = %dir.display(),
                "skipping layer record with a non-UTF-8 name; it will not be migrated"
            );
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        layers.push(LayerId::from(name));
    }
    layers.sort();
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blank_lines() {
        let chain = AncestryChain::parse("a\n\nb\n\n");
        assert_eq!(chain.parents(), &[LayerId::from("a"), LayerId::from("b")]);
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(AncestryChain::parse("").is_root());
        assert!(AncestryChain::parse("\n\n").is_root());
    }

    #[test]
    fn parse_accepts_crlf_and_keeps_duplicates() {
        let chain = AncestryChain::parse("a\r\nb\r\na\r\n");
        let ids: Vec<&str> = chain.iter().map(LayerId::as_str).collect();
        assert_eq!(ids, ["a", "b", "a"]);
    }
}
