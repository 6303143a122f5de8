use std::fs;
use std::path::PathBuf;

use serde_json::{Value as Json, json};
use tempfile::TempDir;
use yo_rs::{ContextError, assemble, load_files};

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write values file");
    path
}

#[test]
fn files_merge_in_order() {
    let dir = TempDir::new().expect("tempdir");
    let base = write(
        &dir,
        "base.yaml",
        "image:\n  name: app\n  tag: v1\nreplicas: 1\n",
    );
    let overlay = write(&dir, "overlay.json", r#"{"image": {"tag": "v2"}, "debug": true}"#);

    let context = load_files(&[base, overlay]).expect("load");
    assert_eq!(
        Json::Object(context),
        json!({"image": {"name": "app", "tag": "v2"}, "replicas": 1, "debug": true})
    );
}

#[test]
fn empty_file_contributes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let empty = write(&dir, "empty.yaml", "");
    assert!(load_files(&[empty]).expect("load").is_empty());
}

#[test]
fn top_level_must_be_a_mapping() {
    let dir = TempDir::new().expect("tempdir");
    let list = write(&dir, "list.yaml", "- a\n- b\n");
    let err = load_files(&[list]).expect_err("should fail");
    assert!(matches!(err, ContextError::NotAMapping { .. }));
    assert!(err.to_string().contains("list.yaml"));
}

#[test]
fn unreadable_and_malformed_files() {
    let dir = TempDir::new().expect("tempdir");
    assert!(matches!(
        load_files(&[dir.path().join("missing.yaml")]),
        Err(ContextError::Read { .. })
    ));
    let broken = write(&dir, "broken.yaml", "a: [1, 2\n");
    assert!(matches!(
        load_files(&[broken]),
        Err(ContextError::Parse { .. })
    ));
}

#[test]
fn sets_apply_after_files() {
    let dir = TempDir::new().expect("tempdir");
    let values = write(&dir, "values.yaml", "image:\n  tag: v1\n");
    let context = assemble(&[values], &["image.tag=v3", "hosts={a.com,b.com}"]).expect("assemble");
    assert_eq!(
        Json::Object(context),
        json!({"image": {"tag": "v3"}, "hosts": ["a.com", "b.com"]})
    );
}

#[test]
fn later_sets_win() {
    let none: [PathBuf; 0] = [];
    let context = assemble(&none, &["a=1", "a=2,b=x"]).expect("assemble");
    assert_eq!(Json::Object(context), json!({"a": 2, "b": "x"}));
}
