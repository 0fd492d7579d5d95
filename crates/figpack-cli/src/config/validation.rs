use std::path::Path;

use crate::config::FigpackConfig;
use crate::error::{ConfigError, Result};

fn require(field: &str, value: &str, hint: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: field.to_string(),
            hint: hint.to_string(),
        }
        .into());
    }
    Ok(())
}

impl FigpackConfig {
    /// Check the merged configuration before anything is built.
    pub fn validate(&self, cwd: &Path) -> Result<()> {
        let plugin = self.plugin_options()?;

        require("plugin.name", &plugin.name, "Name shown in the plugins menu")?;
        require("plugin.id", &plugin.id, "Plugin id assigned by the design tool")?;
        require("plugin.api", &plugin.api, "Plugin API version, e.g. \"1.0.0\"")?;
        require(
            "plugin.main",
            &plugin.main.to_string_lossy(),
            "Entry script relative to the project root, e.g. \"src/main.ts\"",
        )?;

        if plugin.editor_type.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "plugin.editorType".to_string(),
                value: "[]".to_string(),
                hint: "List at least one of \"figma\", \"figjam\" or \"dev\"".to_string(),
            }
            .into());
        }

        require(
            "server.host",
            &self.server.host,
            "Host the dev server listens on, e.g. \"localhost\"",
        )?;
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                value: "0".to_string(),
                hint: "Use a port between 1 and 65535".to_string(),
            }
            .into());
        }

        if self.out_dir(cwd) == self.root_dir(cwd) {
            return Err(ConfigError::InvalidValue {
                field: "outDir".to_string(),
                value: self.out_dir.display().to_string(),
                hint: "The output directory must differ from the project root".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
