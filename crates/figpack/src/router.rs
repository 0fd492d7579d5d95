//! Routes delivered bundles to their destination.
//!
//! Watch sessions write straight into the output directory so the design
//! tool can reload the plugin from disk. One-shot builds hand the artifacts
//! to the host, which writes them together with the rest of its output.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::RouteError;
use crate::manifest::{self, PluginOptions, MAIN_FILE, MANIFEST_FILE, UI_FILE};
use crate::orchestrator::DeliverySink;
use crate::request::BuildMode;

/// A named file handed to the host's asset pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    /// Logical name, without extension.
    pub name: String,
    /// Output file name relative to the host's output directory.
    pub file_name: String,
    pub source: String,
}

/// The host side of asset emission.
pub trait AssetEmitter: Send + Sync {
    fn emit_file(&self, asset: EmittedAsset) -> Result<(), RouteError>;
}

enum Destination {
    Disk {
        out_dir: PathBuf,
        created: OnceCell<()>,
    },
    Host(Arc<dyn AssetEmitter>),
}

/// [`DeliverySink`] that writes or emits the bundle plus its manifest.
pub struct ArtifactRouter {
    destination: Destination,
    options: Arc<PluginOptions>,
    preview: Option<String>,
    preview_written: AtomicBool,
}

impl ArtifactRouter {
    /// Route into `out_dir` (watch mode).
    pub fn to_disk(out_dir: impl Into<PathBuf>, options: Arc<PluginOptions>) -> Self {
        Self {
            destination: Destination::Disk {
                out_dir: out_dir.into(),
                created: OnceCell::new(),
            },
            options,
            preview: None,
            preview_written: AtomicBool::new(false),
        }
    }

    /// Route through the host's asset emitter (one-shot mode).
    pub fn to_emitter(emitter: Arc<dyn AssetEmitter>, options: Arc<PluginOptions>) -> Self {
        Self {
            destination: Destination::Host(emitter),
            options,
            preview: None,
            preview_written: AtomicBool::new(false),
        }
    }

    /// Page written as `index.html` with the first delivery.
    pub fn with_preview(mut self, page: impl Into<String>) -> Self {
        self.preview = Some(page.into());
        self
    }

    pub fn mode(&self) -> BuildMode {
        match self.destination {
            Destination::Disk { .. } => BuildMode::Watch,
            Destination::Host(_) => BuildMode::OneShot,
        }
    }

    /// Deliver one bundle.
    ///
    /// The manifest is rendered again on every call. `preview` is only
    /// written to disk on the first call and ignored for host emission.
    pub async fn route(&self, output: &str, preview: Option<&str>) -> Result<(), RouteError> {
        let manifest = manifest::render(&self.options);

        match &self.destination {
            Destination::Disk { out_dir, created } => {
                created
                    .get_or_try_init(|| async {
                        tokio::fs::create_dir_all(out_dir)
                            .await
                            .map_err(|e| RouteError::new(out_dir, e))
                    })
                    .await?;

                let main_path = out_dir.join(MAIN_FILE);
                write_file(&main_path, output).await?;
                write_file(&out_dir.join(MANIFEST_FILE), &manifest).await?;

                if let Some(page) = preview {
                    if !self.preview_written.swap(true, Ordering::SeqCst) {
                        write_file(&out_dir.join(UI_FILE), page).await?;
                    }
                }

                info!(path = %main_path.display(), "hmr update");
            }
            Destination::Host(emitter) => {
                emitter.emit_file(EmittedAsset {
                    name: "main".to_string(),
                    file_name: MAIN_FILE.to_string(),
                    source: output.to_string(),
                })?;
                emitter.emit_file(EmittedAsset {
                    name: "manifest".to_string(),
                    file_name: MANIFEST_FILE.to_string(),
                    source: manifest,
                })?;
                debug!("emitted {MAIN_FILE} and {MANIFEST_FILE}");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DeliverySink for ArtifactRouter {
    async fn deliver(&self, output: &str) -> Result<(), RouteError> {
        self.route(output, self.preview.as_deref()).await
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), RouteError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| RouteError::new(path, e))
}
