//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a secure template if missing (unless A2O_MIGRATE_CONFIG is set).
//!
//! Unknown elements and unparsable values are hard errors: a typo in a
//! migration config should stop the run, not silently fall back to a default.

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor, CONFIG_ENV};
use super::ENGINE_DIR_DEFAULT;
use crate::config::types::{Config, FailurePolicy, LogLevel};
use crate::fs_ops::io_error_with_help;
use crate::overlay::OPAQUE_XATTR;
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    engine_dir: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    dry_run: Option<bool>,
    failure_policy: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    write_lower: Option<bool>,
    opaque_xattr: Option<String>,
}

// Booleans tolerate surrounding whitespace; anything but true/false is an error.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(serde::de::Error::custom(format!("invalid boolean: '{s}'"))),
        },
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// Map XmlConfig -> Config; missing elements keep their defaults.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(dir) = non_empty(parsed.engine_dir.as_deref()) {
        cfg.engine_dir = PathBuf::from(dir);
    }
    if let Some(file) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(file));
    }
    if let Some(level) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = level.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    if let Some(policy) = non_empty(parsed.failure_policy.as_deref()) {
        cfg.failure_policy = policy.parse::<FailurePolicy>().map_err(|e| anyhow!(e))?;
    }
    if let Some(key) = non_empty(parsed.opaque_xattr.as_deref()) {
        cfg.opaque_xattr = key.to_string();
    }
    if let Some(dry_run) = parsed.dry_run {
        cfg.dry_run = dry_run;
    }
    if let Some(write_lower) = parsed.write_lower {
        cfg.write_lower = write_lower;
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(io_error_with_help("read config xml", path))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in config xml '{}'", path.display()))
}

/// Load the config from `$A2O_MIGRATE_CONFIG` or the platform default path.
///
/// Returns `Ok(None)` when the default file does not exist yet (a template is
/// created for next time). A missing file named by the env override is an error.
pub fn load_config() -> Result<Option<Config>> {
    let env_set = env::var_os(CONFIG_ENV).is_some();
    let Some(path) = default_config_path() else {
        debug!("no config directory available; using defaults");
        return Ok(None);
    };

    if !path.exists() {
        if env_set {
            bail!("{CONFIG_ENV} names a missing config file: {}", path.display());
        }
        if let Err(e) = create_template_config(&path) {
            warn!(path = %path.display(), error = %e, "could not create template config");
        }
        return Ok(None);
    }

    debug!(path = %path.display(), "loading config");
    load_config_from_xml_path(&path).map(Some)
}

/// Create default template config file and parent directory.
/// Refuses when an ancestor of `path` is a symlink.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/a2o_migrate.log".into());

    let content = format!(
        "<!--\n  a2o_migrate configuration (XML)\n\n  engine_dir      -> engine data directory containing aufs/ and overlay2/\n  log_level       -> quiet | normal | info | debug\n  log_file        -> path to log file (optional; stderr is still used)\n  dry_run         -> true: print the migration plan, change nothing\n  failure_policy  -> abort | continue\n  write_lower     -> true: write <id>/lower and create <id>/work\n  opaque_xattr    -> xattr marking opaque dirs (trusted.overlay.opaque, or user.overlay.opaque for userxattr mounts)\n\n  CLI flags override XML values.\n-->\n<config>\n  <engine_dir>{}</engine_dir>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <dry_run>false</dry_run>\n  <failure_policy>abort</failure_policy>\n  <write_lower>true</write_lower>\n  <opaque_xattr>{}</opaque_xattr>\n</config>\n",
        ENGINE_DIR_DEFAULT, suggested_log, OPAQUE_XATTR
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}
