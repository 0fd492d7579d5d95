//! Bridge between a host build tool's lifecycle and the orchestrator.
//!
//! The host fires [`HostEvent::ConfigResolved`] once its configuration is
//! final, then (for production builds) [`HostEvent::EmitAssets`] after its
//! own asset graph is complete. Watch sessions start on the first event;
//! one-shot builds run on the second.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::BundleEngine;
use crate::error::{ConfigError, HostError};
use crate::manifest::{PluginOptions, UI_FILE};
use crate::orchestrator::{Orchestrator, WatchSession};
use crate::preview::inject_live_reload;
use crate::request::{BuildMode, BuildRequest};
use crate::router::{ArtifactRouter, AssetEmitter};

/// Address the dev server listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// `http://host:port` without a trailing slash.
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Resolved host settings, captured once and passed by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub command: BuildMode,
    pub production: bool,
    pub server: Option<ServerAddress>,
}

impl HostConfig {
    /// The dev server address, required in watch mode.
    pub fn require_server(&self) -> Result<&ServerAddress, ConfigError> {
        self.server
            .as_ref()
            .filter(|server| !server.host.is_empty() && server.port != 0)
            .ok_or(ConfigError::MissingServerAddress)
    }
}

/// Where a hook runs relative to the host's own handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOrder {
    Pre,
    Normal,
    Post,
}

/// Lifecycle notifications sent by the host.
pub enum HostEvent {
    ConfigResolved(HostConfig),
    EmitAssets(Arc<dyn AssetEmitter>),
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::ConfigResolved(config) => {
                f.debug_tuple("ConfigResolved").field(config).finish()
            }
            HostEvent::EmitAssets(_) => f.write_str("EmitAssets"),
        }
    }
}

/// Plugs the orchestrator into a host build tool.
pub struct LifecycleAdapter {
    options: Arc<PluginOptions>,
    engine: Arc<dyn BundleEngine>,
    config: Option<HostConfig>,
    watch: Option<WatchSession>,
}

impl LifecycleAdapter {
    pub fn new(options: PluginOptions, engine: Arc<dyn BundleEngine>) -> Self {
        Self {
            options: Arc::new(options),
            engine,
            config: None,
            watch: None,
        }
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn config(&self) -> Option<&HostConfig> {
        self.config.as_ref()
    }

    /// Order the host must give the asset emission hook.
    ///
    /// The manifest names final output files, so it is emitted after the
    /// host's own assets.
    pub fn hook_order(&self) -> HookOrder {
        HookOrder::Post
    }

    pub async fn handle(&mut self, event: HostEvent) -> Result<(), HostError> {
        debug!(?event, "host event");
        match event {
            HostEvent::ConfigResolved(config) => self.config_resolved(config).await,
            HostEvent::EmitAssets(emitter) => self.emit_assets(emitter).await,
        }
    }

    /// Store the configuration and, in watch mode, start the watch session.
    ///
    /// A watch session started by an earlier call is disposed first.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::MissingServerAddress`] before anything is
    /// bundled when watch mode has no dev server address, and with a fatal
    /// build error when the first build fails.
    pub async fn config_resolved(&mut self, config: HostConfig) -> Result<(), HostError> {
        let request = BuildRequest::from_host(&config, &self.options)?;
        // A previous session must release the output directory first.
        self.shutdown().await?;

        if !config.command.is_watch() {
            self.config = Some(config);
            return Ok(());
        }

        let server = config.require_server()?.clone();
        let template_path = config.root.join(UI_FILE);
        let template = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|source| HostError::PreviewTemplate {
                path: template_path.clone(),
                source,
            })?;
        let preview = inject_live_reload(&template, &server);

        let router =
            ArtifactRouter::to_disk(config.out_dir.clone(), self.options.clone()).with_preview(preview);
        self.config = Some(config);

        let run = Orchestrator::new(request, self.engine.clone()).run(router).await?;
        info!(server = %server, "watching for changes");
        self.watch = run.watch;
        Ok(())
    }

    /// Bundle once and hand `main.js` and `manifest.json` to the host.
    ///
    /// Does nothing in watch mode, where artifacts go straight to disk.
    pub async fn emit_assets(&mut self, emitter: Arc<dyn AssetEmitter>) -> Result<(), HostError> {
        let config = self.config.as_ref().ok_or(ConfigError::Unresolved)?;
        if config.command.is_watch() {
            return Ok(());
        }

        let request = BuildRequest::from_host(config, &self.options)?;
        let router = ArtifactRouter::to_emitter(emitter, self.options.clone());
        Orchestrator::new(request, self.engine.clone())
            .run(router)
            .await?;
        Ok(())
    }

    pub fn watch_session(&self) -> Option<&WatchSession> {
        self.watch.as_ref()
    }

    /// Hand over the running watch session, leaving the adapter without one.
    pub fn take_watch_session(&mut self) -> Option<WatchSession> {
        self.watch.take()
    }

    /// Stop the watch session, if any, and wait for the engine to be released.
    pub async fn shutdown(&mut self) -> Result<(), HostError> {
        if let Some(watch) = self.watch.take() {
            watch.dispose().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(server: Option<ServerAddress>) -> HostConfig {
        HostConfig {
            root: PathBuf::from("/project"),
            out_dir: PathBuf::from("/project/dist"),
            command: BuildMode::Watch,
            production: false,
            server,
        }
    }

    #[test]
    fn test_require_server() {
        assert!(matches!(
            config(None).require_server(),
            Err(ConfigError::MissingServerAddress)
        ));

        let zero_port = config(Some(ServerAddress {
            host: "localhost".to_string(),
            port: 0,
        }));
        assert!(zero_port.require_server().is_err());

        let ok = config(Some(ServerAddress {
            host: "localhost".to_string(),
            port: 5173,
        }));
        assert_eq!(ok.require_server().unwrap().origin(), "http://localhost:5173");
    }

    #[test]
    fn test_server_display() {
        let server = ServerAddress {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        assert_eq!(server.to_string(), "127.0.0.1:3000");
    }
}
