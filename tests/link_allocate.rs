mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use a2o_migrate::{allocate_link, LayerId, MigrateError};
use common::{is_root, Engine};

#[test]
fn fresh_allocation_writes_record_and_symlink() {
    let engine = Engine::new();
    let layer = engine.layer("abc", &[]);

    let link = allocate_link(&engine.overlay, &layer).unwrap();
    assert_eq!(link.as_str().len(), 26);
    assert!(link
        .as_str()
        .bytes()
        .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)));
    assert_eq!(engine.link_of("abc"), link.as_str());

    let entry = engine.overlay.join("l").join(link.as_str());
    assert_eq!(fs::read_link(&entry).unwrap(), PathBuf::from("../abc/diff"));
    // The symlink resolves to the layer's diff dir.
    assert!(entry.is_dir());

    let mode = fs::metadata(engine.overlay.join("l")).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o700);
}

#[test]
fn second_call_returns_same_ref_without_new_entries() {
    let engine = Engine::new();
    let layer = engine.layer("abc", &[]);

    let first = allocate_link(&engine.overlay, &layer).unwrap();
    let second = allocate_link(&engine.overlay, &layer).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_dir(engine.overlay.join("l")).unwrap().count(), 1);
}

#[test]
fn existing_record_is_trusted_without_touching_l() {
    let engine = Engine::new();
    let layer = engine.layer("abc", &[]);
    fs::write(engine.overlay.join("abc/link"), "PRESETREF\n").unwrap();

    let link = allocate_link(&engine.overlay, &layer).unwrap();
    assert_eq!(link.as_str(), "PRESETREF");
    assert!(!engine.overlay.join("l").exists());
}

#[test]
fn empty_record_is_rejected() {
    let engine = Engine::new();
    let layer = engine.layer("abc", &[]);
    fs::write(engine.overlay.join("abc/link"), "  \n").unwrap();

    match allocate_link(&engine.overlay, &layer) {
        Err(MigrateError::LinkAllocationFailed { record_written, .. }) => assert!(!record_written),
        other => panic!("expected LinkAllocationFailed, got {other:?}"),
    }
}

#[test]
fn missing_layer_dir_fails_before_writing() {
    let engine = Engine::new();
    let err = allocate_link(&engine.overlay, &LayerId::from("ghost")).unwrap_err();
    match err {
        MigrateError::LinkAllocationFailed {
            layer,
            record_written,
            ..
        } => {
            assert_eq!(layer.as_str(), "ghost");
            assert!(!record_written);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn symlink_failure_leaves_record_in_place() {
    if is_root() {
        eprintln!("skipping: root ignores directory permissions");
        return;
    }
    let engine = Engine::new();
    let layer = engine.layer("abc", &[]);
    let l = engine.overlay.join("l");
    fs::create_dir(&l).unwrap();
    fs::set_permissions(&l, fs::Permissions::from_mode(0o500)).unwrap();

    let result = allocate_link(&engine.overlay, &layer);
    fs::set_permissions(&l, fs::Permissions::from_mode(0o700)).unwrap();

    match result {
        Err(MigrateError::LinkAllocationFailed { record_written, .. }) => assert!(record_written),
        other => panic!("expected partial failure, got {other:?}"),
    }
    // The record survives and is reused as-is; the missing entry is not repaired.
    let kept = engine.link_of("abc");
    let again = allocate_link(&engine.overlay, &layer).unwrap();
    assert_eq!(again.as_str(), kept);
    assert!(!l.join(&kept).exists());
}
