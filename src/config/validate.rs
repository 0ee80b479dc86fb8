//! Config validation logic.
//! Checks the engine directory and the opaque xattr key before any store is touched.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::types::Config;

/// xattr namespaces overlayfs reads opacity from.
const OPAQUE_XATTR_NAMESPACES: &[&str] = &["trusted.", "user."];

impl Config {
    /// Validate the engine directory and the opaque xattr key.
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine_dir;
        ensure_dir_exists_and_is_dir(engine, "engine_dir")?;
        ensure_readable(engine, "engine_dir")?;

        let key = self.opaque_xattr.trim();
        if !OPAQUE_XATTR_NAMESPACES
            .iter()
            .any(|ns| key.len() > ns.len() && key.starts_with(ns))
        {
            error!("opaque_xattr has no supported namespace: '{key}'");
            bail!("opaque_xattr must start with 'trusted.' or 'user.' (got '{key}')");
        }

        info!(
            engine_dir = %engine.display(),
            failure_policy = %self.failure_policy,
            write_lower = self.write_lower,
            log_file = %self
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into()),
            "config validated"
        );
        Ok(())
    }
}

/// Ensure path exists and is a directory; emit clear errors with path context.
fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

/// Ensure directory is readable by attempting to open its entries.
fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path).with_context(|| {
        format!("Cannot read {name} directory '{}'; check permissions", path.display())
    })?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn existing_engine_dir_is_valid() {
        let td = tempdir().unwrap();
        Config::new(td.path()).validate().unwrap();
    }

    #[test]
    fn missing_engine_dir_is_rejected() {
        let td = tempdir().unwrap();
        let err = Config::new(td.path().join("absent")).validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"), "got: {err}");
    }

    #[test]
    fn engine_dir_must_be_a_directory() {
        let td = tempdir().unwrap();
        let file = td.path().join("file");
        fs::write(&file, b"x").unwrap();
        let err = Config::new(&file).validate().unwrap_err();
        assert!(err.to_string().contains("not a directory"), "got: {err}");
    }

    #[test]
    fn opaque_xattr_needs_namespace() {
        let td = tempdir().unwrap();
        let mut cfg = Config::new(td.path());
        cfg.opaque_xattr = "overlay.opaque".into();
        assert!(cfg.validate().is_err());
        cfg.opaque_xattr = "trusted.".into();
        assert!(cfg.validate().is_err());
        cfg.opaque_xattr = "user.overlay.opaque".into();
        cfg.validate().unwrap();
    }
}
