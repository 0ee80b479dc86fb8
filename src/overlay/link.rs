//! Link allocation: the `<id>/link` record and its `l/<ref>` symlink.
//!
//! Allocation is idempotent per layer: once a record exists it is returned as
//! is, without touching anything else. That read-if-exists path is also what
//! makes ancestors allocated earlier (or by a previous run) reusable.
//!
//! A failure after the record was written is not rolled back, and the
//! read-if-exists path does not verify the symlink. A store interrupted
//! between the two writes keeps a record without an indirection entry;
//! `LinkAllocationFailed::record_written` reports that case.

use rand::Rng;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{link_dir, link_file, DIFF_DIR, ID_LENGTH};
use crate::errors::MigrateError;
use crate::fs_ops::{ensure_dir_with_mode, entry_exists, io_error_with_help_io};
use crate::platform::atomic_write;
use crate::store::{LayerId, LinkRef};

/// RFC 4648 base32 alphabet, as used for overlay2 link ids.
const ID_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
/// Fresh ids drawn before giving up on finding an unused one.
const MAX_ID_ATTEMPTS: usize = 8;

/// Generate a random link id of `ID_LENGTH` base32 characters.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Ensure `layer` has a link id backed by `l/<id> -> ../<layer>/diff`, and return it.
pub fn allocate_link(overlay_root: &Path, layer: &LayerId) -> Result<LinkRef, MigrateError> {
    let record = link_file(overlay_root, layer);
    let fail = |record_written: bool| {
        move |source: io::Error| MigrateError::LinkAllocationFailed {
            layer: layer.clone(),
            record_written,
            source,
        }
    };

    if entry_exists(&record)
        .map_err(io_error_with_help_io("check link record", &record))
        .map_err(fail(false))?
    {
        let link = read_link_record(&record).map_err(fail(false))?;
        debug!(layer = %layer, link = %link, "reusing existing link");
        return Ok(link);
    }

    let links = link_dir(overlay_root);
    ensure_dir_with_mode(&links, 0o700)
        .map_err(io_error_with_help_io("create link directory", &links))
        .map_err(fail(false))?;

    let (link, entry) = unused_link(&links).map_err(fail(false))?;

    atomic_write(&record, link.as_str().as_bytes(), 0o644)
        .map_err(io_error_with_help_io("write link record", &record))
        .map_err(fail(false))?;

    let target = symlink_target(layer);
    symlink(&target, &entry)
        .map_err(io_error_with_help_io("create link symlink", &entry))
        .map_err(fail(true))?;

    info!(layer = %layer, link = %link, "allocated layer link");
    Ok(link)
}

/// Read an existing `<id>/link` record. Surrounding whitespace is ignored;
/// an empty record is invalid rather than an empty reference.
pub fn read_link_record(record: &Path) -> io::Result<LinkRef> {
    let raw = fs::read_to_string(record).map_err(io_error_with_help_io("read link record", record))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(io_error_with_help_io("read link record", record)(io::Error::new(
            io::ErrorKind::InvalidData,
            "link record is empty",
        )));
    }
    Ok(LinkRef::from(trimmed))
}

/// Relative symlink target for a layer's indirection entry: `../<layer>/diff`.
pub fn symlink_target(layer: &LayerId) -> PathBuf {
    Path::new("..").join(layer.as_str()).join(DIFF_DIR)
}

/// Draw ids until one has no entry under `links` yet.
fn unused_link(links: &Path) -> io::Result<(LinkRef, PathBuf)> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate_id();
        let entry = links.join(&id);
        if !entry_exists(&entry).map_err(io_error_with_help_io("check link entry", &entry))? {
            return Ok((LinkRef::new(id), entry));
        }
        debug!(link = %id, "link id already taken; drawing another");
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "no unused link id under '{}' after {MAX_ID_ATTEMPTS} attempts",
            links.display()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_use_base32_alphabet() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)), "bad id {id}");
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn symlink_target_is_relative_to_link_dir() {
        assert_eq!(
            symlink_target(&LayerId::from("abc")),
            PathBuf::from("../abc/diff")
        );
    }
}
