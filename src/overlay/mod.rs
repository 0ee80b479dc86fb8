//! overlay2 store layout.

pub mod link;
pub mod lower;

use std::path::{Path, PathBuf};

use crate::store::LayerId;

/// Shared directory of indirection symlinks, one per layer.
pub const LINK_DIR: &str = "l";
/// Per-layer file holding the layer's link id.
pub const LINK_FILE: &str = "link";
/// Per-layer content directory (the indirection symlinks point here).
pub const DIFF_DIR: &str = "diff";
/// Per-layer file holding the lower chain.
pub const LOWER_FILE: &str = "lower";
/// Per-layer overlay work directory, created next to `lower`.
pub const WORK_DIR: &str = "work";
/// Length of generated link ids.
pub const ID_LENGTH: usize = 26;
/// Default xattr used to mark a directory opaque.
pub const OPAQUE_XATTR: &str = "trusted.overlay.opaque";

/// `<overlay>/<layer>`
pub fn layer_dir(overlay_root: &Path, layer: &LayerId) -> PathBuf {
    overlay_root.join(layer.as_str())
}

/// `<overlay>/<layer>/diff`
pub fn diff_dir(overlay_root: &Path, layer: &LayerId) -> PathBuf {
    layer_dir(overlay_root, layer).join(DIFF_DIR)
}

/// `<overlay>/<layer>/link`
pub fn link_file(overlay_root: &Path, layer: &LayerId) -> PathBuf {
    layer_dir(overlay_root, layer).join(LINK_FILE)
}

/// `<overlay>/l`
pub fn link_dir(overlay_root: &Path) -> PathBuf {
    overlay_root.join(LINK_DIR)
}
