//! `figpack build`: one production bundle written to the output directory.

use figpack::manifest::UI_FILE;
use figpack::{
    AssetEmitter, BuildMode, BundleEngine, EmittedAsset, HookOrder, HostEvent, LifecycleAdapter,
    RouteError,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::BuildArgs;
use crate::commands::{ensure_root, load_config, working_dir};
use crate::config::{CliOverrides, FigpackConfig};
use crate::error::{BuildError, CliError, Result};
use crate::ui::{self, SummaryEntry};

/// Collects what the plugin hook emits.
#[derive(Default)]
struct CollectedAssets {
    assets: Mutex<Vec<EmittedAsset>>,
}

impl CollectedAssets {
    fn take(&self) -> Vec<EmittedAsset> {
        std::mem::take(&mut *self.assets.lock())
    }
}

impl AssetEmitter for CollectedAssets {
    fn emit_file(&self, asset: EmittedAsset) -> std::result::Result<(), RouteError> {
        tracing::debug!(file = %asset.file_name, bytes = asset.source.len(), "asset emitted");
        self.assets.lock().push(asset);
        Ok(())
    }
}

pub async fn execute(args: BuildArgs) -> Result<()> {
    let cwd = working_dir()?;
    let overrides = CliOverrides::from_common(&args.common);
    let config = load_config(&cwd, &args.common, &overrides)?;
    ensure_root(&config.root_dir(&cwd)).await?;

    let started = Instant::now();
    let engine = Arc::new(config.engine(&cwd));
    let written = run(&config, &cwd, engine).await?;

    let out_dir = config.out_dir.display().to_string();
    ui::print_build_summary(&out_dir, &written, started.elapsed());
    Ok(())
}

/// Run the build with `engine` and write the assets; returns what was written.
///
/// The host's own output (the UI page) is collected first because the
/// plugin hook is ordered after it.
pub async fn run(
    config: &FigpackConfig,
    cwd: &Path,
    engine: Arc<dyn BundleEngine>,
) -> Result<Vec<SummaryEntry>> {
    let host = config.host_config(cwd, BuildMode::OneShot);
    let mut adapter = LifecycleAdapter::new(config.plugin_options()?, engine);
    adapter
        .handle(HostEvent::ConfigResolved(host.clone()))
        .await?;

    let host_assets = vec![read_ui_page(&host.root).await?];

    let spinner = ui::Spinner::new(&format!("Bundling {}", adapter.options().main.display()));
    let collected = Arc::new(CollectedAssets::default());
    let emitter: Arc<dyn AssetEmitter> = collected.clone();
    if let Err(e) = adapter.handle(HostEvent::EmitAssets(emitter)).await {
        spinner.fail("Bundle failed");
        return Err(e.into());
    }
    spinner.finish("Bundled");

    let plugin_assets = collected.take();
    let assets = match adapter.hook_order() {
        HookOrder::Post => host_assets.into_iter().chain(plugin_assets).collect(),
        HookOrder::Pre | HookOrder::Normal => {
            plugin_assets.into_iter().chain(host_assets).collect()
        }
    };

    write_assets(&host.out_dir, assets).await
}

async fn read_ui_page(root: &Path) -> Result<EmittedAsset> {
    let path = root.join(UI_FILE);
    let source = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BuildError::MissingUiPage(path.clone()).into(),
            _ => CliError::Io(e),
        })?;
    Ok(EmittedAsset {
        name: "index".to_string(),
        file_name: UI_FILE.to_string(),
        source,
    })
}

async fn write_assets(out_dir: &Path, assets: Vec<EmittedAsset>) -> Result<Vec<SummaryEntry>> {
    let mut seen = HashSet::new();
    for asset in &assets {
        if !seen.insert(asset.file_name.as_str()) {
            return Err(BuildError::DuplicateAsset(asset.file_name.clone()).into());
        }
    }

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|source| BuildError::AssetWriteFailed {
            path: out_dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::with_capacity(assets.len());
    for asset in assets {
        let path = out_dir.join(&asset.file_name);
        tokio::fs::write(&path, asset.source.as_bytes())
            .await
            .map_err(|source| BuildError::AssetWriteFailed {
                path: path.clone(),
                source,
            })?;
        written.push(SummaryEntry {
            file_name: asset.file_name,
            bytes: asset.source.len() as u64,
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn asset(file_name: &str, source: &str) -> EmittedAsset {
        EmittedAsset {
            name: file_name.split('.').next().unwrap_or_default().to_string(),
            file_name: file_name.to_string(),
            source: source.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_assets_in_order() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");

        let written = write_assets(
            &out,
            vec![asset("index.html", "<html></html>"), asset("main.js", "x()")],
        )
        .await
        .unwrap();

        assert_eq!(
            written
                .iter()
                .map(|e| e.file_name.as_str())
                .collect::<Vec<_>>(),
            vec!["index.html", "main.js"]
        );
        assert_eq!(written[1].bytes, 3);
        assert_eq!(std::fs::read_to_string(out.join("main.js")).unwrap(), "x()");
    }

    #[tokio::test]
    async fn test_duplicate_asset_rejected() {
        let dir = TempDir::new().unwrap();
        let err = write_assets(
            dir.path(),
            vec![asset("main.js", "a"), asset("main.js", "b")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Build(BuildError::DuplicateAsset(_))));
        assert!(!dir.path().join("main.js").exists());
    }

    #[tokio::test]
    async fn test_missing_ui_page() {
        let dir = TempDir::new().unwrap();
        let err = read_ui_page(dir.path()).await.unwrap_err();
        assert!(matches!(err, CliError::Build(BuildError::MissingUiPage(_))));
    }

    #[test]
    fn test_collected_assets_keep_emit_order() {
        let collected = CollectedAssets::default();
        collected.emit_file(asset("main.js", "a")).unwrap();
        collected.emit_file(asset("manifest.json", "{}")).unwrap();
        let names: Vec<_> = collected.take().into_iter().map(|a| a.file_name).collect();
        assert_eq!(names, vec!["main.js", "manifest.json"]);
        assert!(collected.take().is_empty());
    }
}
