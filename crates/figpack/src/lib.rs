//! # figpack
//!
//! Build orchestration for design-tool plugins.
//!
//! A plugin ships as three files: a bundled `main.js` that runs in the
//! sandbox, a `manifest.json` describing it, and an `index.html` UI page.
//! This crate bundles the main script through a [`BundleEngine`], renders
//! the manifest from [`PluginOptions`], and routes both to the right place:
//! straight to disk during development, or to the host build tool's asset
//! pipeline for production builds.
//!
//! ## One-shot build
//!
//! ```no_run
//! use figpack::{callback, BuildMode, BuildRequest, EsbuildEngine, Orchestrator};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = BuildRequest::new("./src/main.ts", BuildMode::OneShot, true);
//! let engine = Arc::new(EsbuildEngine::new("."));
//!
//! let run = Orchestrator::new(request, engine)
//!     .run(callback(|output| {
//!         println!("{} bytes", output.len());
//!         Ok(())
//!     }))
//!     .await?;
//! assert!(run.watch.is_none());
//! # Ok(()) }
//! ```
//!
//! ## Watch session
//!
//! In [`BuildMode::Watch`] the run returns a [`WatchSession`] that keeps
//! rebuilding on every source change. Failed rebuilds are logged and
//! skipped; [`WatchSession::subscribe`] streams every successful one.
//!
//! ```no_run
//! use figpack::{ArtifactRouter, BuildMode, BuildRequest, EsbuildEngine, Orchestrator, PluginOptions};
//! use std::sync::Arc;
//! use tokio_stream::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let options: PluginOptions = serde_json::from_str(r#"{"name":"p","id":"1","editorType":["figma"],"api":"1.0.0","main":"src/main.ts"}"#)?;
//! let request = BuildRequest::new("./src/main.ts", BuildMode::Watch, false);
//! let engine = Arc::new(EsbuildEngine::new(".").with_out_dir("./dist"));
//! let router = ArtifactRouter::to_disk("./dist", Arc::new(options));
//!
//! let run = Orchestrator::new(request, engine).run(router).await?;
//! let session = run.watch.expect("watch mode");
//! let mut deliveries = session.subscribe();
//! while let Some(delivery) = deliveries.next().await {
//!     println!("build #{} delivered", delivery.build);
//! }
//! # Ok(()) }
//! ```

pub mod engine;
pub mod error;
pub mod host;
pub mod manifest;
pub mod orchestrator;
pub mod preview;
pub mod request;
pub mod router;
pub mod watch;

pub use engine::{
    BuildResult, BundleDiagnostic, BundleEngine, BundleSession, EsbuildCommand, EsbuildEngine,
    SourceChange, SourceLocation,
};
pub use error::{
    BuildFailure, ConfigError, EngineFault, FatalBuildError, HostError, RecoverableBuildError,
    Result, RouteError,
};
pub use host::{HookOrder, HostConfig, HostEvent, LifecycleAdapter, ServerAddress};
pub use manifest::{Manifest, PluginOptions};
pub use orchestrator::{
    callback, Callback, Delivery, DeliverySink, Orchestrator, RunOutput, SessionState,
    WatchSession,
};
pub use request::{BuildMode, BuildRequest};
pub use router::{ArtifactRouter, AssetEmitter, EmittedAsset};
