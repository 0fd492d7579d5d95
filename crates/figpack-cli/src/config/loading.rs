use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::{CommonArgs, Mode};
use crate::config::FigpackConfig;
use crate::error::{ConfigError, Result};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "figpack.config.json";

/// Prefix of environment overrides; nested keys use `__`
/// (`FIGPACK_SERVER__PORT=8080`).
pub const ENV_PREFIX: &str = "FIGPACK_";

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esbuild: Option<PathBuf>,
    #[serde(skip_serializing_if = "ServerOverrides::is_empty")]
    pub server: ServerOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ServerOverrides {
    fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none()
    }
}

impl CliOverrides {
    pub fn from_common(args: &CommonArgs) -> Self {
        Self {
            root: args.root.clone(),
            out_dir: args.out_dir.clone(),
            mode: args.mode,
            esbuild: args.esbuild.clone(),
            server: ServerOverrides::default(),
        }
    }

    pub fn with_server(mut self, host: Option<String>, port: Option<u16>) -> Self {
        self.server = ServerOverrides { host, port };
        self
    }
}

/// `OUT_DIR` -> `outDir`, `SERVER__PORT` -> `server.port`.
fn env_key(raw: &str) -> String {
    raw.to_ascii_lowercase()
        .split("__")
        .map(|segment| {
            let mut key = String::with_capacity(segment.len());
            let mut upper = false;
            for c in segment.chars() {
                if c == '_' {
                    upper = true;
                } else if upper {
                    key.push(c.to_ascii_uppercase());
                    upper = false;
                } else {
                    key.push(c);
                }
            }
            key
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl FigpackConfig {
    /// Merge every configuration source.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn load(cwd: &Path, config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    cwd.join(path)
                };
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = cwd.join(CONFIG_FILE);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .map(|key| env_key(key.as_str()).into())
                .lowercase(false),
        );

        figment = figment.merge(Serialized::defaults(overrides));

        figment.extract().map_err(|e| {
            ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: e.to_string(),
                hint: format!("Check {CONFIG_FILE} syntax, field names and {ENV_PREFIX}* variables"),
            }
            .into()
        })
    }
}
