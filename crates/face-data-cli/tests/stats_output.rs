//! Integration tests for the stats command.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use face_data_test_support::{CelebAMaskTreeBuilder, FfhqTreeBuilder};
use serde_json::{json, Value};

fn face_data(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("face-data").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn stats(home: &Path, dataset: &str, root: &Path) -> Value {
    let output = face_data(home)
        .args(["stats", "--dataset", dataset, "--root"])
        .arg(root)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_celebamask_counts_every_split() {
    let tree = CelebAMaskTreeBuilder::new(vec![0, 162_769, 162_770, 182_636, 182_637, 202_598])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();

    let value = stats(home.path(), "celebamask-hq", tree.path());
    assert_eq!(value["dataset"], "CelebAMask-HQ");
    assert!(value.get("version").is_none());
    assert_eq!(
        value["splits"],
        json!([
            {"split": "train", "count": 2},
            {"split": "valid", "count": 2},
            {"split": "test", "count": 2},
            {"split": "all", "count": 6},
        ])
    );
}

#[test]
fn test_ffhq_has_no_valid_split() {
    let tree = FfhqTreeBuilder::new("images1024x1024", vec![0, 59_999, 60_000])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();

    let value = stats(home.path(), "ffhq", tree.path());
    assert_eq!(value["dataset"], "FFHQ");
    assert_eq!(value["version"], "images1024x1024");
    assert_eq!(
        value["splits"],
        json!([
            {"split": "train", "count": 2},
            {"split": "test", "count": 1},
            {"split": "all", "count": 3},
        ])
    );
}

#[test]
fn test_ffhq_version_selects_directory() {
    let tree = FfhqTreeBuilder::new("thumbnails128x128", vec![1])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = face_data(home.path())
        .args(["stats", "--dataset", "ffhq", "--version", "thumbnails128x128", "--root"])
        .arg(tree.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], "thumbnails128x128");
    assert_eq!(value["splits"][0]["count"], json!(1));
}

#[test]
fn test_missing_version_directory_is_an_error() {
    let tree = FfhqTreeBuilder::new("thumbnails128x128", vec![1])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = face_data(home.path())
        .args(["stats", "--dataset", "ffhq", "--root"])
        .arg(tree.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("images1024x1024"));
}
