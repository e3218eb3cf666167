//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use face_data_test_support::{CelebAMaskTreeBuilder, FfhqTreeBuilder};
use predicates::prelude::*;

fn face_data(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("face-data").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

#[test]
fn test_project_config_supplies_root() {
    let tree = CelebAMaskTreeBuilder::new(vec![0, 1, 2]).build().unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        format!("[celebamask]\nroot = '{}'\n", toml_path(tree.path())),
    )
    .unwrap();

    face_data(home.path())
        .args(["check", "--dataset", "celebamask-hq", "--quiet"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"index\":2"));
}

#[test]
fn test_project_config_applies_format() {
    let tree = FfhqTreeBuilder::new("images1024x1024", vec![0, 1])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        r"
[output]
format = 'json'
",
    )
    .unwrap();

    face_data(home.path())
        .args(["check", "--dataset", "ffhq", "--img-size", "8", "--root"])
        .arg(tree.path())
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let tree = FfhqTreeBuilder::new("images1024x1024", vec![0, 1])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        "[output]\nformat = 'json'\n",
    )
    .unwrap();

    face_data(home.path())
        .args(["check", "--dataset", "ffhq", "--img-size", "8", "--format", "jsonl"])
        .arg("--root")
        .arg(tree.path())
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_found_in_parent() {
    let tree = FfhqTreeBuilder::new("thumbnails128x128", vec![60_000])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        format!(
            "[ffhq]\nroot = '{}'\nversion = 'thumbnails128x128'\nsplit = 'test'\nimg_size = 4\n",
            toml_path(tree.path())
        ),
    )
    .unwrap();
    let nested = home.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();

    let output = face_data(home.path())
        .current_dir(&nested)
        .args(["check", "--dataset", "ffhq", "--quiet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["image"]["shape"], serde_json::json!([3, 4, 4]));
}

#[test]
fn test_xdg_config_is_overridden_by_project_config() {
    let tree = FfhqTreeBuilder::new("images1024x1024", vec![0])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();
    let xdg_dir = home.path().join(".config/face-data");
    fs::create_dir_all(&xdg_dir).unwrap();
    fs::write(
        xdg_dir.join("config.toml"),
        format!(
            "[ffhq]\nroot = '{}'\nimg_size = 4\n\n[output]\nformat = 'json'\n",
            toml_path(tree.path())
        ),
    )
    .unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        "[ffhq]\nimg_size = 6\n",
    )
    .unwrap();

    let output = face_data(home.path())
        .args(["check", "--dataset", "ffhq", "--quiet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["image"]["shape"], serde_json::json!([3, 6, 6]));
}

#[test]
fn test_invalid_config_value_warns() {
    let tree = FfhqTreeBuilder::new("images1024x1024", vec![0])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        "[celebamask]\nflip_prob = 3.0\n",
    )
    .unwrap();

    face_data(home.path())
        .args(["check", "--dataset", "ffhq", "--img-size", "4", "--root"])
        .arg(tree.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("celebamask.flip_prob must be 0.0-1.0"));
}

#[test]
fn test_zero_std_falls_back_to_default() {
    let tree = CelebAMaskTreeBuilder::new(vec![0, 1, 2]).build().unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        format!(
            "[celebamask]\nroot = '{}'\nstd = [0.0]\n",
            toml_path(tree.path())
        ),
    )
    .unwrap();

    let output = face_data(home.path())
        .args(["check", "--dataset", "celebamask-hq", "--quiet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("celebamask.std is invalid"), "{stderr}");
    assert!(stderr.contains("using the default"), "{stderr}");
    assert!(!stderr.contains("Skipping"), "{stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 3);
}

#[test]
fn test_invalid_split_names_the_fallback() {
    let tree = FfhqTreeBuilder::new("images1024x1024", vec![0, 60_000])
        .build()
        .unwrap();
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".face-data.toml"),
        format!(
            "[ffhq]\nroot = '{}'\nsplit = 'holdout'\nimg_size = 4\n",
            toml_path(tree.path())
        ),
    )
    .unwrap();

    let output = face_data(home.path())
        .args(["check", "--dataset", "ffhq", "--quiet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ffhq.split must be one of"), "{stderr}");
    assert!(stderr.contains("using the default"), "{stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let indices: Vec<u64> = stdout
        .lines()
        .map(|line| {
            let report: serde_json::Value = serde_json::from_str(line).unwrap();
            report["index"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(indices, vec![0]);
}
