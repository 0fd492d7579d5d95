//! `figpack.config.json` and its overrides.
//!
//! Sources are merged in this order, later ones winning:
//! defaults, the config file, `FIGPACK_*` environment variables, CLI flags.

mod defaults;
mod loading;
#[cfg(test)]
mod tests;
mod validation;

use figpack::{BuildMode, EsbuildEngine, HostConfig, PluginOptions, ServerAddress};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Mode;
use crate::error::{ConfigError, Result};

pub use defaults::*;
pub use loading::{CliOverrides, ServerOverrides, CONFIG_FILE, ENV_PREFIX};

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FigpackConfig {
    /// Project root; relative paths are resolved against the working directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Output directory, relative to `root`.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Defaults to production for `build` and development for `dev`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    #[serde(default)]
    pub server: ServerConfig,

    /// Explicit esbuild executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esbuild: Option<PathBuf>,

    /// Extra path fragments the watcher ignores.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watch_ignore: Vec<String>,

    /// Quiet period before a changed file triggers a rebuild.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Plugin metadata; becomes `manifest.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginOptions>,
}

/// Dev server address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for FigpackConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            out_dir: default_out_dir(),
            mode: None,
            server: ServerConfig::default(),
            esbuild: None,
            watch_ignore: Vec::new(),
            debounce_ms: default_debounce_ms(),
            plugin: None,
        }
    }
}

impl FigpackConfig {
    /// Absolute project root.
    pub fn root_dir(&self, cwd: &Path) -> PathBuf {
        absolutize(cwd, &self.root)
    }

    /// Absolute output directory.
    pub fn out_dir(&self, cwd: &Path) -> PathBuf {
        absolutize(&self.root_dir(cwd), &self.out_dir)
    }

    /// Configured mode, or the command's default.
    pub fn effective_mode(&self, command: BuildMode) -> Mode {
        self.mode.unwrap_or(match command {
            BuildMode::OneShot => Mode::Production,
            BuildMode::Watch => Mode::Development,
        })
    }

    pub fn plugin_options(&self) -> Result<PluginOptions> {
        self.plugin.clone().ok_or_else(|| {
            ConfigError::MissingField {
                field: "plugin".to_string(),
                hint: "Add a \"plugin\" section with name, id, editorType, api and main"
                    .to_string(),
            }
            .into()
        })
    }

    /// The snapshot handed to the lifecycle adapter.
    ///
    /// The server address is only included for watch sessions.
    pub fn host_config(&self, cwd: &Path, command: BuildMode) -> HostConfig {
        HostConfig {
            root: self.root_dir(cwd),
            out_dir: self.out_dir(cwd),
            command,
            production: self.effective_mode(command).is_production(),
            server: command.is_watch().then(|| ServerAddress {
                host: self.server.host.clone(),
                port: self.server.port,
            }),
        }
    }

    /// esbuild engine rooted at the project.
    pub fn engine(&self, cwd: &Path) -> EsbuildEngine {
        EsbuildEngine::new(self.root_dir(cwd))
            .with_binary(self.esbuild.as_deref().map(|p| absolutize(cwd, p)))
            .with_out_dir(self.out_dir(cwd))
            .with_ignore_patterns(self.watch_ignore.clone())
            .with_debounce(Duration::from_millis(self.debounce_ms))
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path == Path::new(".") {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}
