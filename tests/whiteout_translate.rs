//! Translator behavior on real diff trees. Device nodes and xattrs need
//! privileges, so each test probes first and skips when unavailable.

mod common;

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

use a2o_migrate::WhiteoutTranslator;
use common::{can_mknod, usable_opaque_xattr};

fn assert_whiteout(path: &Path) {
    let meta = fs::symlink_metadata(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    assert!(meta.file_type().is_char_device(), "{} is not a char device", path.display());
    assert_eq!(meta.rdev(), 0, "{} has a non-zero device number", path.display());
}

#[test]
fn deletion_marker_becomes_char_device() {
    if !can_mknod() {
        eprintln!("skipping: cannot create device nodes");
        return;
    }
    let td = tempfile::tempdir().unwrap();
    fs::create_dir_all(td.path().join("etc")).unwrap();
    fs::write(td.path().join("etc/.wh.passwd"), b"").unwrap();
    fs::write(td.path().join("etc/group"), b"root:x:0:").unwrap();

    let report = WhiteoutTranslator::default().translate(td.path()).unwrap();
    assert_eq!(report.whiteouts, 1);
    assert_eq!(report.opaque_dirs, 0);
    assert!(!td.path().join("etc/.wh.passwd").exists());
    assert_whiteout(&td.path().join("etc/passwd"));
    assert_eq!(fs::read(td.path().join("etc/group")).unwrap(), b"root:x:0:");
}

#[test]
fn nested_and_hidden_targets() {
    if !can_mknod() {
        eprintln!("skipping: cannot create device nodes");
        return;
    }
    let td = tempfile::tempdir().unwrap();
    let deep = td.path().join("usr/share/doc");
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join(".wh..hidden"), b"").unwrap();
    fs::write(td.path().join(".wh.top"), b"").unwrap();

    let report = WhiteoutTranslator::default().translate(td.path()).unwrap();
    assert_eq!(report.whiteouts, 2);
    assert_whiteout(&deep.join(".hidden"));
    assert_whiteout(&td.path().join("top"));
}

#[test]
fn opaque_marker_sets_xattr_on_parent() {
    let Some(key) = usable_opaque_xattr() else {
        eprintln!("skipping: no usable xattr namespace");
        return;
    };
    let td = tempfile::tempdir().unwrap();
    let dir = td.path().join("var/cache");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".wh..wh..opq"), b"").unwrap();

    let report = WhiteoutTranslator::new(key).translate(td.path()).unwrap();
    assert_eq!(report.opaque_dirs, 1);
    assert_eq!(report.whiteouts, 0);
    assert!(!dir.join(".wh..wh..opq").exists());
    assert_eq!(xattr::get(&dir, key).unwrap().as_deref(), Some(&b"y"[..]));
}

#[test]
fn opaque_and_deletion_in_same_dir() {
    let Some(key) = usable_opaque_xattr() else {
        eprintln!("skipping: no usable xattr namespace");
        return;
    };
    if !can_mknod() {
        eprintln!("skipping: cannot create device nodes");
        return;
    }
    let td = tempfile::tempdir().unwrap();
    let dir = td.path().join("opt");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".wh..wh..opq"), b"").unwrap();
    fs::write(dir.join(".wh.old"), b"").unwrap();
    fs::write(dir.join("new"), b"data").unwrap();

    let report = WhiteoutTranslator::new(key).translate(td.path()).unwrap();
    assert_eq!(report.opaque_dirs, 1);
    assert_eq!(report.whiteouts, 1);
    assert_eq!(xattr::get(&dir, key).unwrap().as_deref(), Some(&b"y"[..]));
    assert_whiteout(&dir.join("old"));
    assert_eq!(fs::read(dir.join("new")).unwrap(), b"data");
    let names: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert!(names.iter().all(|n| !n.starts_with(".wh.")), "markers left: {names:?}");
}

#[test]
fn meta_entries_survive_untouched() {
    let td = tempfile::tempdir().unwrap();
    let plnk = td.path().join(".wh..wh.plnk");
    fs::create_dir_all(&plnk).unwrap();
    fs::write(plnk.join("123.456"), b"hardlink").unwrap();
    fs::write(td.path().join(".wh..wh.aufs"), b"").unwrap();

    let report = WhiteoutTranslator::default().translate(td.path()).unwrap();
    assert_eq!(report.untranslated_meta.len(), 2);
    assert!(plnk.join("123.456").exists());
    assert!(td.path().join(".wh..wh.aufs").exists());
}

#[test]
fn rerun_after_interrupted_rewrite_succeeds() {
    if !can_mknod() {
        eprintln!("skipping: cannot create device nodes");
        return;
    }
    let td = tempfile::tempdir().unwrap();
    fs::write(td.path().join(".wh.gone"), b"").unwrap();
    // State left behind when a run stopped between create and delete.
    a2o_migrate::platform::mknod_whiteout(&td.path().join("gone")).unwrap();

    let report = WhiteoutTranslator::default().translate(td.path()).unwrap();
    assert_eq!(report.whiteouts, 1);
    assert!(!td.path().join(".wh.gone").exists());
    assert_whiteout(&td.path().join("gone"));
}

#[test]
fn regular_file_at_target_is_an_error() {
    if !can_mknod() {
        eprintln!("skipping: cannot create device nodes");
        return;
    }
    let td = tempfile::tempdir().unwrap();
    fs::write(td.path().join(".wh.clash"), b"").unwrap();
    fs::write(td.path().join("clash"), b"content").unwrap();

    assert!(WhiteoutTranslator::default().translate(td.path()).is_err());
    assert_eq!(fs::read(td.path().join("clash")).unwrap(), b"content");
}
