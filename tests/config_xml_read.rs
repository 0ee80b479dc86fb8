//! Verify XML config is parsed and used without touching user state.

use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use a2o_migrate::{load_config_from_xml_path, FailurePolicy, LogLevel};

#[test]
fn reads_config_xml_and_applies_values() {
    let td = tempdir().expect("create tempdir");

    let cfg_path = td.path().join("config.xml");
    let engine_dir = td.path().join("engine");
    let log_file = td.path().join("a2o_migrate.log");

    let xml = format!(
        r#"
<config>
  <engine_dir>{}</engine_dir>
  <log_level>debug</log_level>
  <log_file>{}</log_file>
  <dry_run>true</dry_run>
  <failure_policy>continue</failure_policy>
  <write_lower>false</write_lower>
  <opaque_xattr>user.overlay.opaque</opaque_xattr>
</config>
"#,
        engine_dir.display(),
        log_file.display()
    );
    fs::write(&cfg_path, xml).expect("write config.xml");

    let cfg = load_config_from_xml_path(&cfg_path).expect("load_config_from_xml_path");

    assert_eq!(cfg.engine_dir, engine_dir, "engine_dir mismatch");
    assert_eq!(cfg.log_file.as_deref(), Some(log_file.as_path()), "log_file mismatch");
    assert_eq!(cfg.log_level, LogLevel::Debug, "log_level mismatch");
    assert!(cfg.dry_run, "dry_run should be true");
    assert_eq!(cfg.failure_policy, FailurePolicy::Continue);
    assert!(!cfg.write_lower, "write_lower should be false");
    assert_eq!(cfg.opaque_xattr, "user.overlay.opaque");
}

#[test]
fn missing_elements_keep_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config>\n  <engine_dir>/srv/engine</engine_dir>\n</config>\n").unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.engine_dir, PathBuf::from("/srv/engine"));
    assert_eq!(cfg.failure_policy, FailurePolicy::Abort);
    assert!(cfg.write_lower);
    assert!(!cfg.dry_run);
    assert_eq!(cfg.opaque_xattr, "trusted.overlay.opaque");
}

#[test]
fn whitespace_around_values_is_trimmed() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        "<config><engine_dir>  /srv/engine \n</engine_dir><dry_run> true </dry_run><log_level> info </log_level></config>",
    )
    .unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.engine_dir, PathBuf::from("/srv/engine"));
    assert!(cfg.dry_run);
    assert_eq!(cfg.log_level, LogLevel::Info);
}

#[test]
fn invalid_policy_is_rejected() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><failure_policy>retry</failure_policy></config>").unwrap();
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid failure policy"), "got: {err:#}");
}

#[test]
fn malformed_xml_is_rejected() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><engine_dir>/x</config>").unwrap();
    assert!(load_config_from_xml_path(&cfg_path).is_err());
}

#[test]
fn missing_file_names_path() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("absent.xml");
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(err.to_string().contains("absent.xml"), "got: {err}");
}
