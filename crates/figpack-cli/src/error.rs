//! Error handling for the figpack CLI.
//!
//! - [`CliError`] is what commands return.
//! - [`ConfigError`] and [`BuildError`] carry CLI-side detail and a hint.
//! - Errors from the orchestrator keep their own `miette` diagnostics and
//!   are rendered as-is by [`cli_error_to_miette`].
//!
//! ```rust,no_run
//! use figpack_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_page(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Create an index.html for the plugin UI")
//! }
//! ```

mod report;

pub use report::cli_error_to_miette;

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Failure reported by a lifecycle hook.
    #[error(transparent)]
    Host(#[from] figpack::HostError),

    /// A running watch session ended on a fatal error.
    #[error(transparent)]
    Fatal(#[from] figpack::FatalBuildError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    #[error("{0}")]
    Custom(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}\n\nHint: Create a figpack.config.json file or pass --config <path>", .0.display())]
    NotFound(PathBuf),

    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField { field: String, hint: String },

    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

/// Errors raised while writing the production output.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to write asset {}: {source}\n\nHint: Check output directory permissions", .path.display())]
    AssetWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The UI page the plugin manifest points at does not exist.
    #[error("UI page not found: {}\n\nHint: Create an index.html in the project root", .0.display())]
    MissingUiPage(PathBuf),

    /// Two assets were emitted under the same file name.
    #[error("Asset '{0}' was emitted twice")]
    DuplicateAsset(String),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Attach context to any error convertible into [`CliError`].
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
