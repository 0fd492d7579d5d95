//! The bundling engine boundary.
//!
//! An engine opens one long-lived [`BundleSession`] per [`BuildRequest`].
//! The session is rebuilt any number of times and released exactly once
//! through [`BundleSession::dispose`].

mod esbuild;

pub use esbuild::{EsbuildCommand, EsbuildEngine};

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::error::{BuildFailure, EngineFault};
use crate::request::BuildRequest;
pub use crate::watch::FileChange as SourceChange;

/// Factory for bundling sessions.
#[async_trait]
pub trait BundleEngine: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Open a session bound to `request`.
    async fn open(&self, request: &BuildRequest) -> Result<Box<dyn BundleSession>, EngineFault>;
}

/// A bundling session owned by exactly one orchestrator.
///
/// `build` takes `&mut self`, so builds on one session never overlap.
#[async_trait]
pub trait BundleSession: Send {
    /// Bundle the entry once against the current sources.
    async fn build(&mut self) -> Result<BuildResult, EngineFault>;

    /// Start reporting source changes.
    ///
    /// Each received item asks for one rebuild. The stream ends when the
    /// session is disposed.
    fn watch(&mut self) -> Result<mpsc::Receiver<SourceChange>, EngineFault>;

    /// Release every resource held by the session. Calling it twice is a no-op.
    async fn dispose(&mut self);
}

/// Raw outcome of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Generated script texts, first one is the bundle entry chunk.
    pub outputs: Vec<String>,
    /// Compile and resolve errors.
    pub errors: Vec<BundleDiagnostic>,
}

impl BuildResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            outputs: vec![output.into()],
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<BundleDiagnostic>) -> Self {
        Self {
            outputs: Vec::new(),
            errors,
        }
    }

    /// Normalize into the single deliverable script.
    ///
    /// Errors win over outputs. Extra output files are dropped.
    pub fn into_output(self) -> Result<String, BuildFailure> {
        if !self.errors.is_empty() {
            return Err(BuildFailure::Diagnostics(self.errors));
        }
        self.outputs
            .into_iter()
            .next()
            .ok_or(BuildFailure::EmptyOutput)
    }
}

/// Position of a diagnostic in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

/// A single compile or resolve error reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDiagnostic {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl BundleDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for BundleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "{}:{}:{}: {}",
                loc.file.display(),
                loc.line,
                loc.column,
                self.message
            ),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_win_over_outputs() {
        let result = BuildResult {
            outputs: vec!["console.log(1)".to_string()],
            errors: vec![BundleDiagnostic::new("boom")],
        };
        match result.into_output() {
            Err(BuildFailure::Diagnostics(d)) => assert_eq!(d[0].message, "boom"),
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn test_no_outputs_is_empty_failure() {
        let result = BuildResult::default();
        assert!(matches!(
            result.into_output(),
            Err(BuildFailure::EmptyOutput)
        ));
    }

    #[test]
    fn test_first_output_is_delivered() {
        let result = BuildResult {
            outputs: vec!["a".to_string(), "b".to_string()],
            errors: vec![],
        };
        assert_eq!(result.into_output().unwrap(), "a");
    }

    #[test]
    fn test_diagnostic_display() {
        let plain = BundleDiagnostic::new("Unexpected \"}\"");
        assert_eq!(plain.to_string(), "Unexpected \"}\"");

        let located = plain.at(SourceLocation {
            file: PathBuf::from("src/code.ts"),
            line: 12,
            column: 4,
        });
        assert_eq!(located.to_string(), "src/code.ts:12:4: Unexpected \"}\"");
    }
}
