//! Shared test utilities for figpack integration tests.
//!
//! [`ScriptedEngine`] replays a fixed sequence of build outcomes and lets a
//! test raise change notifications by hand, so orchestration can be checked
//! without a real bundler.

#![allow(dead_code)]

use async_trait::async_trait;
use figpack::manifest::EditorType;
use figpack::{
    AssetEmitter, BuildResult, BundleDiagnostic, BundleEngine, BundleSession, DeliverySink,
    EmittedAsset, EngineFault, PluginOptions, RouteError, SourceChange,
};
use figpack::BuildRequest;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_stream::{Stream, StreamExt};

/// One scripted build outcome.
#[derive(Debug, Clone)]
pub enum Step {
    Output(&'static str),
    Errors(Vec<&'static str>),
    Empty,
    Fault,
    /// Hold the build until the gate is opened, then return the output.
    Gate(Arc<Notify>, &'static str),
}

#[derive(Default)]
struct Inner {
    steps: Mutex<VecDeque<Step>>,
    opened: AtomicUsize,
    builds: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    disposed: AtomicUsize,
    changes: Mutex<Option<mpsc::Sender<SourceChange>>>,
}

/// Engine that returns scripted results in order.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<Inner>,
}

impl ScriptedEngine {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        let engine = Self::default();
        engine.inner.steps.lock().extend(steps);
        Arc::new(engine)
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn builds(&self) -> usize {
        self.inner.builds.load(Ordering::SeqCst)
    }

    /// Highest number of builds that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Raise one change notification.
    pub async fn change(&self, path: &str) {
        let tx = self
            .inner
            .changes
            .lock()
            .clone()
            .expect("session is not watching");
        tx.send(SourceChange::Modified(PathBuf::from(path)))
            .await
            .expect("change receiver dropped");
    }

    /// End the change stream as if the watcher went away.
    pub fn close_changes(&self) {
        self.inner.changes.lock().take();
    }
}

#[async_trait]
impl BundleEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, _request: &BuildRequest) -> Result<Box<dyn BundleSession>, EngineFault> {
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            inner: self.inner.clone(),
            disposed: false,
        }))
    }
}

struct ScriptedSession {
    inner: Arc<Inner>,
    disposed: bool,
}

#[async_trait]
impl BundleSession for ScriptedSession {
    async fn build(&mut self) -> Result<BuildResult, EngineFault> {
        if self.disposed {
            return Err(EngineFault::Disposed);
        }
        self.inner.builds.fetch_add(1, Ordering::SeqCst);
        let running = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let step = self.inner.steps.lock().pop_front();
        let result = match step {
            Some(Step::Gate(gate, text)) => {
                gate.notified().await;
                Ok(BuildResult::success(text))
            }
            Some(Step::Output(text)) => Ok(BuildResult::success(text)),
            Some(Step::Errors(messages)) => Ok(BuildResult::failure(
                messages.into_iter().map(BundleDiagnostic::new).collect(),
            )),
            Some(Step::Empty) => Ok(BuildResult::default()),
            Some(Step::Fault) | None => Err(EngineFault::EntryUnreadable {
                path: PathBuf::from("src/main.ts"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted fault"),
            }),
        };

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn watch(&mut self) -> Result<mpsc::Receiver<SourceChange>, EngineFault> {
        let (tx, rx) = mpsc::channel(16);
        *self.inner.changes.lock() = Some(tx);
        Ok(rx)
    }

    async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.inner.changes.lock().take();
        self.inner.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink that records every delivery and can be told to fail.
#[derive(Default)]
pub struct RecordingSink {
    outputs: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the `n`th delivery (1-based) with an I/O error.
    pub fn failing_on(n: usize) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(Vec::new()),
            fail_on_call: Some(n),
        })
    }

    pub fn outputs(&self) -> Vec<String> {
        self.outputs.lock().clone()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, output: &str) -> Result<(), RouteError> {
        let mut outputs = self.outputs.lock();
        if self.fail_on_call == Some(outputs.len() + 1) {
            return Err(RouteError::new(
                "/readonly/main.js",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        outputs.push(output.to_string());
        Ok(())
    }
}

/// Emitter that keeps assets in memory.
#[derive(Default)]
pub struct CollectingEmitter {
    assets: Mutex<Vec<EmittedAsset>>,
}

impl CollectingEmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn assets(&self) -> Vec<EmittedAsset> {
        self.assets.lock().clone()
    }
}

impl AssetEmitter for CollectingEmitter {
    fn emit_file(&self, asset: EmittedAsset) -> Result<(), RouteError> {
        self.assets.lock().push(asset);
        Ok(())
    }
}

pub fn plugin_options() -> PluginOptions {
    PluginOptions {
        name: "Test Plugin".to_string(),
        id: "000000".to_string(),
        editor_type: vec![EditorType::Figma],
        api: "1.0.0".to_string(),
        main: PathBuf::from("src/main.ts"),
        permissions: None,
        capabilities: None,
        network_access: None,
        codegen_languages: None,
        codegen_preferences: None,
    }
}

/// Next item of `stream`, failing the test after two seconds.
pub async fn next_within<S>(stream: &mut S) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for stream item")
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Await `future`, failing the test after two seconds.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("timed out")
}
