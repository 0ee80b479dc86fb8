//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.
//! - FailurePolicy decides what a per-layer failure does to the rest of the run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::ENGINE_DIR_DEFAULT;
use crate::errors::StoreKind;
use crate::migrate::MigrateOptions;
use crate::overlay::OPAQUE_XATTR;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Per-layer progress (default)
    #[default]
    Normal,
    /// Per-step detail
    Info,
    /// Per-entry trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// What happens to the remaining layers once one layer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop dispatching after the first failure. Unreadable or cyclic
    /// ancestry stops the run before anything is written.
    #[default]
    Abort,
    /// Keep going; descendants of a failed layer are skipped.
    Continue,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" | "stop" => Some(FailurePolicy::Abort),
            "continue" | "skip" => Some(FailurePolicy::Continue),
            _ => None,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        })
    }
}

impl FromStr for FailurePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid failure policy: '{s}'"))
    }
}

/// Runtime configuration for a migration run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine data directory holding `aufs/` and `overlay2/`
    pub engine_dir: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// If true, print the plan but do not modify the store
    pub dry_run: bool,
    pub failure_policy: FailurePolicy,
    /// Persist `<id>/lower` (and `<id>/work`) for every layer with ancestors
    pub write_lower: bool,
    /// xattr used to mark directories opaque
    pub opaque_xattr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_dir: PathBuf::from(ENGINE_DIR_DEFAULT),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            dry_run: false,
            failure_policy: FailurePolicy::Abort,
            write_lower: true,
            opaque_xattr: OPAQUE_XATTR.to_string(),
        }
    }
}

impl Config {
    /// Construct a Config for `engine_dir`; other fields use defaults.
    pub fn new(engine_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine_dir: engine_dir.into(),
            ..Default::default()
        }
    }

    /// `<engine>/aufs`
    pub fn aufs_root(&self) -> PathBuf {
        self.engine_dir.join(StoreKind::Aufs.dir_name())
    }

    /// `<engine>/overlay2`
    pub fn overlay_root(&self) -> PathBuf {
        self.engine_dir.join(StoreKind::Overlay2.dir_name())
    }

    /// Options for the migration engine derived from this config.
    pub fn migrate_options(&self) -> MigrateOptions {
        MigrateOptions {
            failure_policy: self.failure_policy,
            write_lower: self.write_lower,
            opaque_xattr: self.opaque_xattr.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_roots_derive_from_engine_dir() {
        let cfg = Config::new("/srv/engine");
        assert_eq!(cfg.aufs_root(), PathBuf::from("/srv/engine/aufs"));
        assert_eq!(cfg.overlay_root(), PathBuf::from("/srv/engine/overlay2"));
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.engine_dir, PathBuf::from("/var/lib/docker"));
        assert_eq!(cfg.failure_policy, FailurePolicy::Abort);
        assert!(cfg.write_lower);
        assert!(!cfg.dry_run);
        assert_eq!(cfg.opaque_xattr, "trusted.overlay.opaque");
    }

    #[test]
    fn failure_policy_parses() {
        assert_eq!("Continue".parse::<FailurePolicy>(), Ok(FailurePolicy::Continue));
        assert_eq!("abort".parse::<FailurePolicy>(), Ok(FailurePolicy::Abort));
        assert!("maybe".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn options_follow_config() {
        let mut cfg = Config::new("/e");
        cfg.failure_policy = FailurePolicy::Continue;
        cfg.write_lower = false;
        cfg.opaque_xattr = "user.overlay.opaque".into();
        let opts = cfg.migrate_options();
        assert_eq!(opts.failure_policy, FailurePolicy::Continue);
        assert!(!opts.write_lower);
        assert_eq!(opts.opaque_xattr, "user.overlay.opaque");
    }
}
