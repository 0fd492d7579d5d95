//! `figpack build` and `figpack dev`.
//!
//! Both commands act as the host build tool: they resolve the configuration,
//! hand it to a [`figpack::LifecycleAdapter`] and fire the lifecycle events
//! a bundler host would.

pub mod build;
pub mod dev;

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;

use std::path::Path;

use crate::cli::CommonArgs;
use crate::config::{CliOverrides, FigpackConfig};
use crate::error::{Result, ResultExt};

/// Load and validate the configuration for a command.
pub(crate) fn load_config(
    cwd: &Path,
    common: &CommonArgs,
    overrides: &CliOverrides,
) -> Result<FigpackConfig> {
    let config = FigpackConfig::load(cwd, common.config.as_deref(), overrides)?;
    config.validate(cwd)?;
    Ok(config)
}

/// Working directory the command resolves relative paths against.
pub(crate) fn working_dir() -> Result<std::path::PathBuf> {
    std::env::current_dir().context("Failed to read the working directory")
}

/// Fail early when the project root does not exist.
pub(crate) async fn ensure_root(root: &Path) -> Result<()> {
    tokio::fs::metadata(root)
        .await
        .with_path(root)
        .with_hint("Pass --root <dir> or set `root` in figpack.config.json")?;
    Ok(())
}
