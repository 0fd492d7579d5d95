//! `figpack dev`: a watch session plus the live-reload server.

use figpack::{BuildMode, HostEvent, LifecycleAdapter};
use std::sync::Arc;

use crate::cli::DevArgs;
use crate::commands::{ensure_root, load_config, working_dir};
use crate::config::CliOverrides;
use crate::dev::{forward_deliveries, report_failures, DevServer, DevState};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;

enum Outcome {
    Interrupted,
    SessionEnded(figpack::Result<()>),
    ServerStopped(Result<()>),
}

pub async fn execute(args: DevArgs) -> Result<()> {
    let cwd = working_dir()?;
    let overrides =
        CliOverrides::from_common(&args.common).with_server(args.host.clone(), args.port);
    let config = load_config(&cwd, &args.common, &overrides)?;
    ensure_root(&config.root_dir(&cwd)).await?;

    let host = config.host_config(&cwd, BuildMode::Watch);
    let server = host
        .server
        .clone()
        .ok_or(figpack::ConfigError::MissingServerAddress)
        .map_err(figpack::HostError::from)?;

    let engine = Arc::new(config.engine(&cwd));
    let mut adapter = LifecycleAdapter::new(config.plugin_options()?, engine);

    ui::info(&format!(
        "Building {} in watch mode",
        adapter.options().main.display()
    ));
    adapter
        .handle(HostEvent::ConfigResolved(host.clone()))
        .await?;
    let mut watch = adapter
        .take_watch_session()
        .ok_or_else(|| CliError::Custom("watch session did not start".to_string()))?;
    ui::success(&format!("Wrote {}", config.out_dir.display()));

    let state = Arc::new(DevState::new());
    let forward = forward_deliveries(watch.subscribe(), state.clone());
    let failures = report_failures(watch.failures());
    let mut server_task = tokio::spawn(
        DevServer::new(server.clone(), host.root.clone(), state.clone()).start(),
    );
    ui::info(&format!("Preview server at {}", server.origin()));
    ui::info("Watching for changes, press Ctrl+C to stop");

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => Outcome::Interrupted,
        result = watch.wait() => Outcome::SessionEnded(result),
        joined = &mut server_task => Outcome::ServerStopped(
            joined.unwrap_or_else(|e| Err(CliError::Server(e.to_string())))
        ),
    };

    server_task.abort();
    let result = match outcome {
        Outcome::Interrupted => {
            ui::info("Shutting down");
            watch.dispose().await.map_err(CliError::from)
        }
        Outcome::SessionEnded(result) => result.map_err(CliError::from),
        Outcome::ServerStopped(result) => {
            let disposed = watch.dispose().await.map_err(CliError::from);
            result
                .with_hint("Pass --port <port> to use a different port")
                .and(disposed)
        }
    };
    forward.abort();
    failures.abort();

    if result.is_ok() {
        ui::success("Watch session closed");
    }
    result
}
