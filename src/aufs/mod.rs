//! aufs store layout: whiteout naming rules and the ancestry records.

pub mod ancestry;

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

/// Prefix of every aufs whiteout entry.
pub const WHITEOUT_PREFIX: &str = ".wh.";
/// Prefix of aufs internal bookkeeping entries (hardlink tracking, aufs dirs).
pub const WHITEOUT_META_PREFIX: &str = ".wh..wh.";
/// Marker placed inside a directory to make it opaque.
pub const OPAQUE_DIR_MARKER: &str = ".wh..wh..opq";

/// How an entry name inside a diff tree is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass<'a> {
    /// `.wh..wh..opq`: the containing directory is opaque.
    OpaqueMarker,
    /// `.wh..wh.*` other than the opaque marker.
    Meta,
    /// `.wh.<name>`: `<name>` was deleted in this layer.
    Whiteout { target: &'a OsStr },
    /// Regular content.
    Ordinary,
}

/// Strip every leading whiteout prefix, the way aufs itself resolves names.
fn strip_whiteout_prefix(mut name: &[u8]) -> &[u8] {
    while let Some(rest) = name.strip_prefix(WHITEOUT_PREFIX.as_bytes()) {
        name = rest;
    }
    name
}

/// Classify an entry name. The opaque marker also carries the meta and whiteout
/// prefixes, so it must be tested first. Works on raw bytes; entry names need not be UTF-8.
pub fn classify(name: &OsStr) -> EntryClass<'_> {
    let bytes = name.as_bytes();
    if bytes == OPAQUE_DIR_MARKER.as_bytes() {
        EntryClass::OpaqueMarker
    } else if bytes.starts_with(WHITEOUT_META_PREFIX.as_bytes()) {
        EntryClass::Meta
    } else if bytes.starts_with(WHITEOUT_PREFIX.as_bytes()) {
        EntryClass::Whiteout {
            target: OsStr::from_bytes(strip_whiteout_prefix(bytes)),
        }
    } else {
        EntryClass::Ordinary
    }
}
