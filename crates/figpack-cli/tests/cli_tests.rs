//! End-to-end tests of the `figpack` binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

fn figpack() -> Command {
    let mut cmd = Command::cargo_bin("figpack").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("FIGPACK_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    figpack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("dev"));
}

#[test]
fn test_version() {
    figpack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
#[serial]
fn test_build_without_plugin_section_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("figpack.config.json"), "{}").unwrap();

    figpack()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("plugin"));
}

#[test]
#[serial]
fn test_missing_explicit_config_fails() {
    let dir = common::project();
    figpack()
        .current_dir(dir.path())
        .args(["build", "--config", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
#[serial]
fn test_missing_root_fails_before_bundling() {
    let dir = common::project();
    figpack()
        .current_dir(dir.path())
        .args(["build", "--root", "no-such-dir"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"))
        .stderr(predicate::str::contains("no-such-dir"))
        .stderr(predicate::str::contains("--root"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_dev_rejects_port_zero() {
    figpack()
        .args(["dev", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

#[cfg(unix)]
#[test]
#[serial]
fn test_build_writes_plugin() {
    let dir = common::project();
    let esbuild = common::succeeding_esbuild(dir.path());

    figpack()
        .current_dir(dir.path())
        .arg("build")
        .arg("--esbuild")
        .arg(&esbuild)
        .assert()
        .success();

    let dist = dir.path().join("dist");
    assert_eq!(
        std::fs::read_to_string(dist.join("main.js")).unwrap(),
        common::BUNDLE
    );
    assert_eq!(
        std::fs::read_to_string(dist.join("index.html")).unwrap(),
        common::UI_PAGE
    );

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dist.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["name"], "Palette");
    assert_eq!(manifest["main"], "main.js");
    assert_eq!(manifest["ui"], "index.html");
    assert_eq!(manifest["permissions"][0], "currentuser");
}

#[cfg(unix)]
#[test]
#[serial]
fn test_build_honors_out_dir_flag() {
    let dir = common::project();
    let esbuild = common::succeeding_esbuild(dir.path());

    figpack()
        .current_dir(dir.path())
        .args(["build", "--out-dir", "plugin-out", "--esbuild"])
        .arg(&esbuild)
        .assert()
        .success();

    assert!(dir.path().join("plugin-out/manifest.json").is_file());
    assert!(!dir.path().join("dist").exists());
}

#[cfg(unix)]
#[test]
#[serial]
fn test_build_failure_exits_non_zero() {
    let dir = common::project();
    let esbuild = common::failing_esbuild(dir.path());

    figpack()
        .current_dir(dir.path())
        .arg("build")
        .arg("--esbuild")
        .arg(&esbuild)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not resolve"));

    assert!(!dir.path().join("dist/main.js").exists());
    assert!(!dir.path().join("dist/manifest.json").exists());
}
