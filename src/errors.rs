//! Typed error definitions for a2o_migrate.
//! One variant per failure mode of the migration, so callers can decide per layer
//! whether to abort or skip, and logs can carry a stable code and kind.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::LayerId;

/// Which side of the migration a store root belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Aufs,
    Overlay2,
}

impl StoreKind {
    /// Directory name of the store under the engine directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            StoreKind::Aufs => "aufs",
            StoreKind::Overlay2 => "overlay2",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("{kind} root does not exist: {}", path.display())]
    StoreRootMissing { kind: StoreKind, path: PathBuf },

    #[error("cannot inspect {kind} root {}: {source}", path.display())]
    StoreRootUnreadable {
        kind: StoreKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ancestry of layer {layer} is unreadable: {source}")]
    AncestryUnreadable {
        layer: LayerId,
        #[source]
        source: io::Error,
    },

    #[error("layer {layer} is part of an ancestry cycle")]
    AncestryCycle { layer: LayerId },

    #[error("link allocation for layer {layer} failed: {source}")]
    LinkAllocationFailed {
        layer: LayerId,
        /// The link record reached the disk before the failure (not rolled back).
        record_written: bool,
        #[source]
        source: io::Error,
    },

    #[error("whiteout translation for layer {layer} failed: {source}")]
    TranslationFailed {
        layer: LayerId,
        #[source]
        source: io::Error,
    },

    #[error("writing lower chain of layer {layer} failed: {source}")]
    LowerPersistFailed {
        layer: LayerId,
        #[source]
        source: io::Error,
    },

    #[error("layer {layer} skipped: ancestor {ancestor} did not migrate")]
    AncestorNotMigrated { layer: LayerId, ancestor: LayerId },

    #[error("layer discovery under {} failed: {source}", path.display())]
    DiscoveryFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("migration interrupted")]
    Interrupted,
}

impl MigrateError {
    /// Stable numeric code, also used as the process exit code by the CLI.
    pub fn code(&self) -> i32 {
        match self {
            MigrateError::StoreRootMissing { .. } => 2,
            MigrateError::StoreRootUnreadable { .. } => 3,
            MigrateError::AncestryUnreadable { .. } => 4,
            MigrateError::AncestryCycle { .. } => 5,
            MigrateError::LinkAllocationFailed { .. } => 6,
            MigrateError::TranslationFailed { .. } => 7,
            MigrateError::LowerPersistFailed { .. } => 8,
            MigrateError::AncestorNotMigrated { .. } => 9,
            MigrateError::DiscoveryFailed { .. } => 10,
            MigrateError::Interrupted => 130,
        }
    }

    /// Short snake_case label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrateError::StoreRootMissing { .. } => "store_root_missing",
            MigrateError::StoreRootUnreadable { .. } => "store_root_unreadable",
            MigrateError::AncestryUnreadable { .. } => "ancestry_unreadable",
            MigrateError::AncestryCycle { .. } => "ancestry_cycle",
            MigrateError::LinkAllocationFailed { .. } => "link_allocation_failed",
            MigrateError::TranslationFailed { .. } => "translation_failed",
            MigrateError::LowerPersistFailed { .. } => "lower_persist_failed",
            MigrateError::AncestorNotMigrated { .. } => "ancestor_not_migrated",
            MigrateError::DiscoveryFailed { .. } => "discovery_failed",
            MigrateError::Interrupted => "interrupted",
        }
    }

    /// Layer the error is attributed to, when it is per-layer.
    pub fn layer(&self) -> Option<&LayerId> {
        match self {
            MigrateError::AncestryUnreadable { layer, .. }
            | MigrateError::AncestryCycle { layer }
            | MigrateError::LinkAllocationFailed { layer, .. }
            | MigrateError::TranslationFailed { layer, .. }
            | MigrateError::LowerPersistFailed { layer, .. }
            | MigrateError::AncestorNotMigrated { layer, .. } => Some(layer),
            _ => None,
        }
    }
}
