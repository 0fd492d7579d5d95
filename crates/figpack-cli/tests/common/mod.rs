//! Project fixtures shared by the CLI test suites.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CONFIG: &str = r#"{
  "plugin": {
    "name": "Palette",
    "id": "1234567890",
    "editorType": ["figma"],
    "api": "1.0.0",
    "main": "src/main.ts",
    "permissions": ["currentuser"]
  }
}"#;

pub const UI_PAGE: &str = "<html><head><title>Palette</title></head><body></body></html>";

pub const BUNDLE: &str = "console.log(\"palette\")";

/// Project with a config, an entry and a UI page.
pub fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.ts"), "console.log('palette')\n").unwrap();
    fs::write(dir.path().join("index.html"), UI_PAGE).unwrap();
    fs::write(dir.path().join("figpack.config.json"), CONFIG).unwrap();
    dir
}

/// Executable standing in for esbuild.
#[cfg(unix)]
pub fn fake_esbuild(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-esbuild.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
pub fn succeeding_esbuild(dir: &Path) -> PathBuf {
    fake_esbuild(dir, &format!("printf '%s' '{BUNDLE}'"))
}

#[cfg(unix)]
pub fn failing_esbuild(dir: &Path) -> PathBuf {
    fake_esbuild(
        dir,
        r#"printf '✘ [ERROR] Could not resolve "./missing"\n\n    src/main.ts:1:7:\n' >&2
exit 1"#,
    )
}
