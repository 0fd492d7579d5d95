//! esbuild CLI integration.
//!
//! Each build spawns the esbuild binary with the entry as its only input and
//! reads the bundle from stdout. Compile errors come back on stderr and are
//! parsed into [`BundleDiagnostic`]s.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use super::{BuildResult, BundleDiagnostic, BundleEngine, BundleSession, SourceChange, SourceLocation};
use crate::error::EngineFault;
use crate::request::{BuildRequest, SourcemapMode};
use crate::watch::FileWatcher;

/// Default debounce window for change notifications.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Package manager used to run a project-local esbuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRunner {
    Pnpm,
    Npm,
    Bun,
}

impl PackageRunner {
    /// Detect the runner from `package.json` and lockfiles.
    ///
    /// Priority: `packageManager` field, then lockfiles.
    async fn detect(project_root: &Path) -> Option<Self> {
        if let Ok(content) = tokio::fs::read_to_string(project_root.join("package.json")).await {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&content) {
                if let Some(pm) = parsed.get("packageManager").and_then(|v| v.as_str()) {
                    if pm.starts_with("pnpm") {
                        return Some(Self::Pnpm);
                    } else if pm.starts_with("bun") {
                        return Some(Self::Bun);
                    } else if pm.starts_with("npm") {
                        return Some(Self::Npm);
                    }
                }
            }
        }

        let lockfiles = [
            ("pnpm-lock.yaml", Self::Pnpm),
            ("bun.lockb", Self::Bun),
            ("bun.lock", Self::Bun),
            ("package-lock.json", Self::Npm),
        ];
        for (lockfile, runner) in lockfiles {
            if exists(&project_root.join(lockfile)).await {
                return Some(runner);
            }
        }

        None
    }

    fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Pnpm => ("pnpm", &["exec", "esbuild"]),
            Self::Npm => ("npx", &["--no-install", "esbuild"]),
            Self::Bun => ("bunx", &["esbuild"]),
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// How the esbuild binary is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsbuildCommand {
    program: PathBuf,
    prefix: Vec<String>,
}

impl EsbuildCommand {
    /// Run `program` directly.
    pub fn binary(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    /// Pick the binary for `project_root`.
    ///
    /// An explicit path wins, then `node_modules/.bin/esbuild`, then the
    /// project's package runner, then `esbuild` from `PATH`.
    pub async fn resolve(project_root: &Path, explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::binary(path);
        }

        let local = project_root
            .join("node_modules")
            .join(".bin")
            .join(if cfg!(windows) { "esbuild.cmd" } else { "esbuild" });
        if tokio::fs::metadata(&local)
            .await
            .is_ok_and(|meta| meta.is_file())
        {
            return Self::binary(local);
        }

        if let Some(runner) = PackageRunner::detect(project_root).await {
            let (program, prefix) = runner.command();
            return Self {
                program: PathBuf::from(program),
                prefix: prefix.iter().map(|s| s.to_string()).collect(),
            };
        }

        Self::binary("esbuild")
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix);
        cmd
    }
}

impl fmt::Display for EsbuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for part in &self.prefix {
            write!(f, " {part}")?;
        }
        Ok(())
    }
}

/// [`BundleEngine`] backed by the esbuild CLI.
#[derive(Debug, Clone)]
pub struct EsbuildEngine {
    root: PathBuf,
    out_dir: Option<PathBuf>,
    binary: Option<PathBuf>,
    ignore_patterns: Vec<String>,
    debounce: Duration,
}

impl EsbuildEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out_dir: None,
            binary: None,
            ignore_patterns: Vec::new(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }

    /// Use this esbuild binary instead of searching for one.
    pub fn with_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.binary = binary;
        self
    }

    /// Output directory, excluded from change notifications.
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    /// Extra ignore patterns for change notifications.
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn watch_ignores(&self) -> Vec<String> {
        let mut patterns = vec!["node_modules".to_string()];
        if let Some(rel) = self
            .out_dir
            .as_deref()
            .and_then(|dir| dir.strip_prefix(&self.root).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
        {
            patterns.push(ignore_pattern(rel));
        }
        patterns.extend(self.ignore_patterns.iter().cloned());
        patterns
    }
}

/// Relative path as an ignore pattern, with `/` separators on every platform.
fn ignore_pattern(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[async_trait]
impl BundleEngine for EsbuildEngine {
    fn name(&self) -> &str {
        "esbuild"
    }

    async fn open(&self, request: &BuildRequest) -> Result<Box<dyn BundleSession>, EngineFault> {
        let command = EsbuildCommand::resolve(&self.root, self.binary.as_deref()).await;
        debug!(command = %command, entry = %request.entry.display(), "opening esbuild session");

        Ok(Box::new(EsbuildSession {
            command,
            root: self.root.clone(),
            request: request.clone(),
            ignore_patterns: self.watch_ignores(),
            debounce: self.debounce,
            watcher: None,
            disposed: false,
        }))
    }
}

struct EsbuildSession {
    command: EsbuildCommand,
    root: PathBuf,
    request: BuildRequest,
    ignore_patterns: Vec<String>,
    debounce: Duration,
    watcher: Option<FileWatcher>,
    disposed: bool,
}

#[async_trait]
impl BundleSession for EsbuildSession {
    async fn build(&mut self) -> Result<BuildResult, EngineFault> {
        if self.disposed {
            return Err(EngineFault::Disposed);
        }

        // Fail before spawning so a missing entry is not reported as a compile error.
        tokio::fs::File::open(&self.request.entry)
            .await
            .map_err(|source| EngineFault::EntryUnreadable {
                path: self.request.entry.clone(),
                source,
            })?;

        let mut cmd = self.command.to_command();
        cmd.args(build_args(&self.request))
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd.output().await.map_err(|source| EngineFault::SpawnFailed {
            program: self.command.to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut errors = parse_diagnostics(&stderr);
            if errors.is_empty() {
                let text = stderr.trim();
                errors.push(BundleDiagnostic::new(if text.is_empty() {
                    format!("esbuild exited with {}", output.status)
                } else {
                    text.to_string()
                }));
            }
            debug!(errors = errors.len(), "esbuild reported errors");
            return Ok(BuildResult::failure(errors));
        }

        let script = String::from_utf8(output.stdout)?;
        if script.is_empty() {
            return Ok(BuildResult::default());
        }
        Ok(BuildResult::success(script))
    }

    fn watch(&mut self) -> Result<mpsc::Receiver<SourceChange>, EngineFault> {
        if self.disposed {
            return Err(EngineFault::Disposed);
        }

        let (watcher, rx) =
            FileWatcher::new(self.root.clone(), self.ignore_patterns.clone(), self.debounce)?;
        self.watcher = Some(watcher);
        Ok(rx)
    }

    async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        // Dropping the watcher closes the change channel.
        self.watcher = None;
        self.disposed = true;
        debug!(entry = %self.request.entry.display(), "esbuild session disposed");
    }
}

/// Command line for one build of `request`.
fn build_args(request: &BuildRequest) -> Vec<String> {
    let mut args = vec![
        request.entry.to_string_lossy().into_owned(),
        "--bundle".to_string(),
        format!("--target={}", request.target.as_str()),
        format!("--legal-comments={}", request.legal_comments.as_str()),
        "--log-level=error".to_string(),
        "--color=false".to_string(),
    ];
    if request.minify {
        args.push("--minify".to_string());
    }
    if request.sourcemap == SourcemapMode::Inline {
        args.push("--sourcemap=inline".to_string());
    }
    args
}

/// Parse esbuild's plain-text error log.
///
/// ```text
/// ✘ [ERROR] Could not resolve "./missing"
///
///     src/main.ts:1:7:
///       1 │ import "./missing"
/// ```
fn parse_diagnostics(stderr: &str) -> Vec<BundleDiagnostic> {
    let mut diagnostics: Vec<BundleDiagnostic> = Vec::new();
    let mut awaiting_location = false;

    for line in stderr.lines() {
        let trimmed = line.trim();
        if let Some(message) = trimmed
            .strip_prefix("✘ [ERROR]")
            .or_else(|| trimmed.strip_prefix("X [ERROR]"))
        {
            diagnostics.push(BundleDiagnostic::new(message.trim()));
            awaiting_location = true;
            continue;
        }

        if !awaiting_location || trimmed.is_empty() {
            continue;
        }

        if let Some(location) = parse_location(trimmed) {
            if let Some(last) = diagnostics.last_mut() {
                last.location = Some(location);
            }
        }
        awaiting_location = false;
    }

    diagnostics
}

fn parse_location(line: &str) -> Option<SourceLocation> {
    let body = line.strip_suffix(':')?;
    let mut parts = body.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line_no = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    if file.is_empty() {
        return None;
    }
    Some(SourceLocation {
        file: PathBuf::from(file),
        line: line_no,
        column,
    })
}
