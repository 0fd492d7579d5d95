use crate::cli::{CommonArgs, Mode};
use crate::config::*;
use crate::error::{CliError, ConfigError};
use figpack::manifest::EditorType;
use figpack::BuildMode;
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PLUGIN_CONFIG: &str = r#"{
  "outDir": "build",
  "server": { "port": 3000 },
  "plugin": {
    "name": "Palette",
    "id": "1234567890",
    "editorType": ["figma", "figjam"],
    "api": "1.0.0",
    "main": "src/main.ts"
  }
}"#;

fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE), config).unwrap();
    dir
}

fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with(ENV_PREFIX) {
            unsafe { std::env::remove_var(key); }
        }
    }
}

#[test]
#[serial]
fn test_defaults_without_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = FigpackConfig::load(dir.path(), None, &CliOverrides::default()).unwrap();
    assert_eq!(config, FigpackConfig::default());
    assert_eq!(config.server.port, 5173);
    assert_eq!(config.debounce_ms, 100);
}

#[test]
#[serial]
fn test_file_values() {
    clear_env();
    let dir = project(PLUGIN_CONFIG);
    let config = FigpackConfig::load(dir.path(), None, &CliOverrides::default()).unwrap();

    assert_eq!(config.out_dir, PathBuf::from("build"));
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "localhost");
    let plugin = config.plugin.unwrap();
    assert_eq!(plugin.name, "Palette");
    assert_eq!(plugin.editor_type, vec![EditorType::Figma, EditorType::Figjam]);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = project(PLUGIN_CONFIG);
    unsafe { std::env::set_var("FIGPACK_OUT_DIR", "env-out"); }
    unsafe { std::env::set_var("FIGPACK_SERVER__PORT", "4000"); }

    let config = FigpackConfig::load(dir.path(), None, &CliOverrides::default()).unwrap();
    clear_env();

    assert_eq!(config.out_dir, PathBuf::from("env-out"));
    assert_eq!(config.server.port, 4000);
}

#[test]
#[serial]
fn test_cli_overrides_env_and_file() {
    clear_env();
    let dir = project(PLUGIN_CONFIG);
    unsafe { std::env::set_var("FIGPACK_OUT_DIR", "env-out"); }
    unsafe { std::env::set_var("FIGPACK_SERVER__PORT", "4000"); }

    let overrides = CliOverrides::from_common(&CommonArgs {
        out_dir: Some(PathBuf::from("cli-out")),
        mode: Some(Mode::Development),
        ..CommonArgs::default()
    })
    .with_server(None, Some(9000));
    let config = FigpackConfig::load(dir.path(), None, &overrides).unwrap();
    clear_env();

    assert_eq!(config.out_dir, PathBuf::from("cli-out"));
    assert_eq!(config.mode, Some(Mode::Development));
    assert_eq!(config.server.port, 9000);
    // Not overridden anywhere: the default survives the nested merge.
    assert_eq!(config.server.host, "localhost");
}

#[test]
#[serial]
fn test_explicit_missing_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let err = FigpackConfig::load(
        dir.path(),
        Some(Path::new("missing.json")),
        &CliOverrides::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Config(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_unknown_field_rejected() {
    clear_env();
    let dir = project(r#"{ "outdir": "x" }"#);
    let err = FigpackConfig::load(dir.path(), None, &CliOverrides::default()).unwrap_err();
    assert!(matches!(
        err,
        CliError::Config(ConfigError::InvalidValue { .. })
    ));
}

fn valid_config() -> FigpackConfig {
    let dir = project(PLUGIN_CONFIG);
    FigpackConfig::load(dir.path(), None, &CliOverrides::default()).unwrap()
}

#[test]
#[serial]
fn test_validate_accepts_complete_config() {
    clear_env();
    let config = valid_config();
    assert!(config.validate(Path::new("/project")).is_ok());
}

#[test]
#[serial]
fn test_validate_requires_plugin() {
    clear_env();
    let err = FigpackConfig::default()
        .validate(Path::new("/project"))
        .unwrap_err();
    assert!(
        matches!(err, CliError::Config(ConfigError::MissingField { ref field, .. }) if field == "plugin")
    );
}

#[test]
#[serial]
fn test_validate_rejects_bad_values() {
    clear_env();
    let cwd = Path::new("/project");

    let mut config = valid_config();
    config.plugin.as_mut().unwrap().name = "  ".to_string();
    assert!(config.validate(cwd).is_err());

    let mut config = valid_config();
    config.plugin.as_mut().unwrap().editor_type.clear();
    assert!(config.validate(cwd).is_err());

    let mut config = valid_config();
    config.server.port = 0;
    assert!(config.validate(cwd).is_err());

    let mut config = valid_config();
    config.out_dir = PathBuf::from(".");
    assert!(config.validate(cwd).is_err());
}

#[test]
fn test_host_config_per_command() {
    let config = FigpackConfig::default();
    let cwd = Path::new("/project");

    let build = config.host_config(cwd, BuildMode::OneShot);
    assert_eq!(build.root, PathBuf::from("/project"));
    assert_eq!(build.out_dir, PathBuf::from("/project/dist"));
    assert!(build.production);
    assert!(build.server.is_none());

    let dev = config.host_config(cwd, BuildMode::Watch);
    assert!(!dev.production);
    let server = dev.server.unwrap();
    assert_eq!(server.origin(), "http://localhost:5173");
}

#[test]
fn test_explicit_mode_wins_over_command_default() {
    let config = FigpackConfig {
        mode: Some(Mode::Development),
        ..FigpackConfig::default()
    };
    assert!(!config.host_config(Path::new("/p"), BuildMode::OneShot).production);
}

#[test]
fn test_absolute_out_dir_kept() {
    let config = FigpackConfig {
        root: PathBuf::from("plugin"),
        out_dir: PathBuf::from("/tmp/out"),
        ..FigpackConfig::default()
    };
    let cwd = Path::new("/work");
    assert_eq!(config.root_dir(cwd), PathBuf::from("/work/plugin"));
    assert_eq!(config.out_dir(cwd), PathBuf::from("/tmp/out"));
}
