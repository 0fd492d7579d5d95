//! Error types for the build orchestrator.
//!
//! Failures are split by who can recover from them:
//!
//! - [`ConfigError`] is raised while a session is being set up, before any
//!   bundling happens, and goes straight back to the host hook.
//! - [`BuildFailure`] and [`EngineFault`] describe a single unsuccessful
//!   build. Whether they are fatal depends on when they happen: the first
//!   build of a session (or any one-shot build) turns them into a
//!   [`FatalBuildError`], later watch rebuilds turn them into a
//!   [`RecoverableBuildError`] that is logged and skipped.
//! - [`RouteError`] is an artifact write failure and is always fatal.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::engine::BundleDiagnostic;

/// Host settings are missing or inconsistent.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Watch mode needs the dev server address for the preview page.
    #[error("Server host and port are required in watch mode")]
    #[diagnostic(
        code(figpack::config::missing_server),
        help("Set `server.host` and `server.port` before starting a dev session")
    )]
    MissingServerAddress,

    /// An event that depends on the resolved configuration arrived first.
    #[error("Host configuration has not been resolved yet")]
    #[diagnostic(
        code(figpack::config::unresolved),
        help("The host must fire `ConfigResolved` before `EmitAssets`")
    )]
    Unresolved,

    /// The plugin entry resolves to a location outside the project root.
    #[error("Entry `{}` is outside the project root `{}`", .entry.display(), .root.display())]
    #[diagnostic(code(figpack::config::entry_outside_root))]
    EntryOutsideRoot { entry: PathBuf, root: PathBuf },
}

/// The bundler itself could not run, as opposed to reporting compile errors.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineFault {
    /// The entry file cannot be read.
    #[error("Entry file is not readable: {}", .path.display())]
    #[diagnostic(code(figpack::engine::entry_unreadable))]
    EntryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bundler process could not be started.
    #[error("Failed to start bundler `{program}`: {source}")]
    #[diagnostic(
        code(figpack::engine::spawn_failed),
        help("Install esbuild (`npm install -D esbuild`) or set `esbuild` in figpack.config.json")
    )]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The bundler produced bytes that are not a UTF-8 script.
    #[error("Bundler output is not valid UTF-8")]
    #[diagnostic(code(figpack::engine::invalid_output))]
    InvalidOutput(#[from] std::string::FromUtf8Error),

    /// Change notifications could not be registered.
    #[error("Failed to watch {}: {source}", .root.display())]
    #[diagnostic(code(figpack::engine::watch_failed))]
    WatchFailed {
        root: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Session was used after it was disposed.
    #[error("Bundling session has already been disposed")]
    #[diagnostic(code(figpack::engine::disposed))]
    Disposed,
}

/// A build completed but produced nothing deliverable.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum BuildFailure {
    /// The bundler reported compile or resolve errors.
    #[error("{}", format_diagnostics(.0))]
    #[diagnostic(code(figpack::build::diagnostics))]
    Diagnostics(Vec<BundleDiagnostic>),

    /// Success was reported but there was no output file.
    #[error("Bundler reported success but produced no output")]
    #[diagnostic(code(figpack::build::empty_output))]
    EmptyOutput,
}

impl BuildFailure {
    /// Compile errors carried by this failure, empty for [`BuildFailure::EmptyOutput`].
    pub fn diagnostics(&self) -> &[BundleDiagnostic] {
        match self {
            BuildFailure::Diagnostics(diagnostics) => diagnostics,
            BuildFailure::EmptyOutput => &[],
        }
    }
}

fn format_diagnostics(diagnostics: &[BundleDiagnostic]) -> String {
    match diagnostics {
        [] => "Bundler reported an unknown error".to_string(),
        [single] => single.to_string(),
        many => format!(
            "{} errors:\n{}",
            many.len(),
            many.iter()
                .map(|d| format!("  {d}"))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    }
}

/// Writing an artifact failed.
#[derive(Debug, Error, Diagnostic)]
#[error("Failed to write {}: {source}", .path.display())]
#[diagnostic(
    code(figpack::route::write_failed),
    help("Check output directory permissions and free disk space")
)]
pub struct RouteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl RouteError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// A failure that ends the session. The process driver exits non-zero on it.
#[derive(Debug, Error, Diagnostic)]
pub enum FatalBuildError {
    /// The first build of a session (or a one-shot build) failed.
    #[error("Failed to bundle {}: {failure}", .entry.display())]
    #[diagnostic(code(figpack::fatal::bundle))]
    Bundle {
        entry: PathBuf,
        #[source]
        failure: BuildFailure,
    },

    /// The engine could not run the first build.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineFault),

    /// An artifact could not be written.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] RouteError),

    /// The watch task stopped without reporting a result.
    #[error("Watch session task ended abnormally: {0}")]
    #[diagnostic(code(figpack::fatal::aborted))]
    Aborted(String),
}

/// A watch-mode rebuild failed after an earlier build succeeded.
///
/// The last delivered artifact stays in place; the session keeps running.
#[derive(Debug, Error)]
pub enum RecoverableBuildError {
    #[error("Rebuild #{build} failed: {failure}")]
    Bundle { build: u64, failure: BuildFailure },

    #[error("Rebuild #{build} failed: {fault}")]
    Engine { build: u64, fault: EngineFault },
}

impl RecoverableBuildError {
    /// Sequence number of the failed rebuild (the initial build is #1).
    pub fn build(&self) -> u64 {
        match self {
            RecoverableBuildError::Bundle { build, .. }
            | RecoverableBuildError::Engine { build, .. } => *build,
        }
    }
}

/// Errors surfaced to the host from lifecycle hooks.
#[derive(Debug, Error, Diagnostic)]
pub enum HostError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fatal(#[from] FatalBuildError),

    /// The UI page used as the preview template could not be read.
    #[error("Failed to read preview template {}: {source}", .path.display())]
    #[diagnostic(
        code(figpack::host::preview_template),
        help("Create an index.html next to figpack.config.json")
    )]
    PreviewTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate.
pub type Result<T, E = FatalBuildError> = std::result::Result<T, E>;
