//! The immutable description of what one bundling session builds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::host::HostConfig;
use crate::manifest::PluginOptions;

/// Whether a session builds once or keeps rebuilding on source changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    /// Produce the artifacts once and release every resource.
    OneShot,
    /// Keep the session open and rebuild on every change notification.
    Watch,
}

impl BuildMode {
    pub fn is_watch(self) -> bool {
        matches!(self, BuildMode::Watch)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::OneShot => f.write_str("build"),
            BuildMode::Watch => f.write_str("watch"),
        }
    }
}

/// Language level of the generated script.
///
/// Plugin sandboxes run an older JavaScript engine, so this is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsTarget {
    Es2015,
}

impl EsTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            EsTarget::Es2015 => "es2015",
        }
    }
}

/// Source map emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcemapMode {
    None,
    Inline,
}

/// What to do with license comments found in bundled code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegalComments {
    None,
}

impl LegalComments {
    pub fn as_str(self) -> &'static str {
        match self {
            LegalComments::None => "none",
        }
    }
}

/// One bundling job: the entry file plus the options it is bundled with.
///
/// Built once per orchestrator from the host configuration snapshot and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Absolute path of the plugin entry script.
    pub entry: PathBuf,
    pub target: EsTarget,
    pub mode: BuildMode,
    pub minify: bool,
    pub sourcemap: SourcemapMode,
    pub legal_comments: LegalComments,
}

impl BuildRequest {
    /// Create a request with the fixed target and comment policy.
    ///
    /// Production builds are minified without source maps, everything else
    /// gets an inline source map.
    pub fn new(entry: impl Into<PathBuf>, mode: BuildMode, production: bool) -> Self {
        Self {
            entry: entry.into(),
            target: EsTarget::Es2015,
            mode,
            minify: production,
            sourcemap: if production {
                SourcemapMode::None
            } else {
                SourcemapMode::Inline
            },
            legal_comments: LegalComments::None,
        }
    }

    /// Derive the request for `options.main` from a resolved host config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EntryOutsideRoot`] when the entry escapes the
    /// project root through `..` components.
    pub fn from_host(config: &HostConfig, options: &PluginOptions) -> Result<Self, ConfigError> {
        let entry = resolve_entry(&config.root, &options.main)?;
        Ok(Self::new(entry, config.command, config.production))
    }
}

fn resolve_entry(root: &Path, main: &Path) -> Result<PathBuf, ConfigError> {
    if main.is_absolute() {
        return Ok(main.to_path_buf());
    }

    let mut resolved = root.to_path_buf();
    for component in main.components() {
        match component {
            std::path::Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(root) {
                    return Err(ConfigError::EntryOutsideRoot {
                        entry: main.to_path_buf(),
                        root: root.to_path_buf(),
                    });
                }
            }
            std::path::Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}
