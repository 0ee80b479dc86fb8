//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - CLI flags override values loaded from config.xml.
//! - --debug is a shorthand for --log-level debug.

use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, FailurePolicy, LogLevel};
use crate::store::LayerId;

/// Migrate an aufs layer store to overlay2 in place.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Migrate an aufs layer store to overlay2, rewriting links and whiteouts"
)]
pub struct Args {
    /// Engine data directory containing aufs/ and overlay2/ (normally configured via XML).
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub engine_dir: Option<PathBuf>,

    /// Migrate only these layers (repeatable). Default: every layer under aufs/layers.
    #[arg(long = "layer", value_name = "ID", action = ArgAction::Append)]
    pub layers: Vec<String>,

    /// Keep migrating unrelated layers after a failure; descendants are skipped.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Print the migration plan without touching either store.
    #[arg(long, help = "Show what would be migrated, but do not modify the store")]
    pub dry_run: bool,

    /// Do not write <id>/lower files.
    #[arg(long)]
    pub no_lower: bool,

    /// xattr key used to mark opaque directories (e.g. user.overlay.opaque).
    #[arg(long, value_name = "KEY")]
    pub opaque_xattr: Option<String>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Print where the config file is read from (or A2O_MIGRATE_CONFIG if set), then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Explicitly requested layers, trimmed, blanks dropped.
    pub fn requested_layers(&self) -> Vec<LayerId> {
        self.layers
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(LayerId::from)
            .collect()
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(dir) = &self.engine_dir {
            cfg.engine_dir = dir.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.continue_on_error {
            cfg.failure_policy = FailurePolicy::Continue;
        }
        if self.no_lower {
            cfg.write_lower = false;
        }
        if let Some(key) = &self.opaque_xattr {
            cfg.opaque_xattr = key.trim().to_string();
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
