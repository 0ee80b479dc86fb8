//! I/O helper utilities.
//!
//! Adapters that enrich io::Error with the failing operation, the path and a
//! hint for the errors a store migration typically hits (privileges for device
//! nodes and trusted xattrs, unsupported xattrs, read-only stores).
//!
//! Usage:
//!   // in functions returning anyhow::Result<_>
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;
//!
//!   // in functions returning io::Result<_>
//!   fs::read_to_string(p).map_err(io_error_with_help_io("read link record", p))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Format a human-friendly message with op/path plus hints.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        match code {
            libc::EPERM => {
                msg.push_str(" (operation not permitted; device nodes and trusted.* xattrs need root or CAP_MKNOD/CAP_SYS_ADMIN)");
            }
            libc::EACCES => {
                msg.push_str(" (permission denied; check ownership and write permissions)");
            }
            libc::ENOENT => {
                msg.push_str(" (path not found; verify the layer exists in this store)");
            }
            libc::EEXIST => {
                msg.push_str(" (already exists; a previous run may have left this entry)");
            }
            libc::ENOTSUP => {
                msg.push_str(" (not supported; the filesystem under the store lacks xattr support)");
            }
            libc::ENOSPC => {
                msg.push_str(" (insufficient space on device)");
            }
            libc::EROFS => {
                msg.push_str(" (read-only filesystem; cannot write here)");
            }
            libc::ELOOP => {
                msg.push_str(" (too many symbolic link levels; possible symlink cycle)");
            }
            libc::ENAMETOOLONG => {
                msg.push_str(" (filename or path too long)");
            }
            libc::EMFILE | libc::ENFILE => {
                msg.push_str(" (open file limit reached; close files or raise limits)");
            }
            _ => {}
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => {
                msg.push_str(" (permission denied; check ownership and write permissions)");
            }
            io::ErrorKind::NotFound => {
                msg.push_str(" (path not found; verify the layer exists in this store)");
            }
            io::ErrorKind::AlreadyExists => {
                msg.push_str(" (already exists; a previous run may have left this entry)");
            }
            io::ErrorKind::InvalidData => {
                msg.push_str(" (unexpected contents; the store may be corrupt)");
            }
            _ => {}
        }
    }

    msg
}

/// Adapter for anyhow::Result code.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Adapter for io::Result code. Keeps the original ErrorKind and OS code
/// semantics visible through the kind while enriching the message.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}
