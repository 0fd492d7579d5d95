//! figpack CLI - command-line host for the figpack build orchestrator.
//!
//! The binary plays the part of the host build tool: it resolves the
//! configuration, fires the lifecycle events and, in `dev`, serves the
//! project with a live-reload endpoint.
//!
//! - [`error`] - Error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Status messages, spinners and build summaries
//! - `commands` - `build` and `dev`
//! - `config` - `figpack.config.json` loading
//! - `dev` - Development server

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};
