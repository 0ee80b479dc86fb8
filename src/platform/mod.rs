//! Platform-specific helpers.
//! Everything that needs raw syscalls (device nodes, xattrs, modes on create) lives
//! here so the store modules stay free of `unsafe` and libc types.

mod common_unix;
mod temp;
mod unix;

pub use common_unix::atomic_write;
pub use unix::{
    is_whiteout_device, mknod_whiteout, open_log_file_secure_append, set_dir_mode_0700,
    set_file_mode_0600, set_opaque_xattr, write_config_secure_new_0600,
};
