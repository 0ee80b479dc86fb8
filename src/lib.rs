//! Core library for `a2o_migrate`.
//!
//! Rewrites the structural metadata of an aufs layer store into the overlay2
//! layout: per-layer indirection links, lower chains and whiteout markers.
//! Diff contents are never copied or rewritten.
//!
//! The binary (`a2o-migrate`) is a thin shell over [`Migrator`]; library users
//! can drive the same steps directly:
//!
//! ```no_run
//! use a2o_migrate::{Migrator, MigrateOptions, LayerId};
//!
//! let migrator = Migrator::new("/var/lib/docker/aufs", "/var/lib/docker/overlay2", MigrateOptions::default());
//! let report = migrator.run(&[LayerId::from("base"), LayerId::from("child")]);
//! assert!(report.is_success());
//! ```

#[cfg(not(unix))]
compile_error!("a2o_migrate only supports Unix targets (device nodes and xattrs are required)");

pub mod aufs;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod migrate;
pub mod output;
pub mod overlay;
pub mod platform;
pub mod shutdown;
pub mod store;
pub mod translate;

pub use aufs::ancestry::{list_layers, read_ancestry, AncestryChain};
pub use config::{
    default_config_path, default_log_path, load_config_from_xml_path, path_has_symlink_ancestor,
    Config, FailurePolicy, LogLevel,
};
pub use errors::{MigrateError, StoreKind};
pub use migrate::{
    LayerGraph, LayerOutcome, LayerStatus, MigrateOptions, MigratedLayer, MigrationPlan,
    MigrationReport, Migrator, Stage,
};
pub use overlay::link::allocate_link;
pub use overlay::lower::{append_lower, build_lower, write_lower};
pub use store::probe::{check_aufs_root, check_overlay_root};
pub use store::{LayerId, LinkRef};
pub use translate::{TranslationReport, WhiteoutTranslator};
