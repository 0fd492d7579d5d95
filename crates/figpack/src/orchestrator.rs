//! Drives a bundling session from its first build to disposal.
//!
//! A one-shot run opens a session, builds once, delivers the output and
//! disposes the session before returning. A watch run does the same first
//! build, then hands the session to a background task that rebuilds on
//! every change notification until the [`WatchSession`] is disposed.
//!
//! The first build decides whether the session starts at all: any failure
//! there is fatal. After that, failed rebuilds are logged and skipped so the
//! last good artifact stays in place. Delivery I/O errors are always fatal.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use crate::engine::{BundleEngine, BundleSession, SourceChange};
use crate::error::{FatalBuildError, RecoverableBuildError, Result, RouteError};
use crate::request::BuildRequest;

/// Receives every successful build output, once per build.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, output: &str) -> Result<(), RouteError>;
}

#[async_trait]
impl<T: DeliverySink + ?Sized> DeliverySink for Arc<T> {
    async fn deliver(&self, output: &str) -> Result<(), RouteError> {
        (**self).deliver(output).await
    }
}

/// Closure-backed sink, see [`callback`].
pub struct Callback<F>(F);

/// Wrap a plain function as a [`DeliverySink`].
pub fn callback<F>(f: F) -> Callback<F>
where
    F: Fn(&str) -> Result<(), RouteError> + Send + Sync,
{
    Callback(f)
}

#[async_trait]
impl<F> DeliverySink for Callback<F>
where
    F: Fn(&str) -> Result<(), RouteError> + Send + Sync,
{
    async fn deliver(&self, output: &str) -> Result<(), RouteError> {
        (self.0)(output)
    }
}

/// Observable lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Building,
    /// The latest build was delivered.
    Delivered,
    /// The latest rebuild failed; the previous artifact is still current.
    Failed,
    Disposed,
    /// The session ended on a fatal error.
    Aborted,
}

/// One successful watch-mode build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Sequence number, the initial build is 1.
    pub build: u64,
    pub output: Arc<str>,
}

/// Result of [`Orchestrator::run`].
pub struct RunOutput {
    /// Output of the initial build.
    pub output: String,
    /// Present in watch mode.
    pub watch: Option<WatchSession>,
}

impl fmt::Debug for RunOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOutput")
            .field("output_len", &self.output.len())
            .field("watch", &self.watch.is_some())
            .finish()
    }
}

/// Owns one request and the engine that builds it.
pub struct Orchestrator {
    request: BuildRequest,
    engine: Arc<dyn BundleEngine>,
}

impl Orchestrator {
    pub fn new(request: BuildRequest, engine: Arc<dyn BundleEngine>) -> Self {
        Self { request, engine }
    }

    /// Run the initial build and, in watch mode, start rebuilding.
    ///
    /// # Errors
    ///
    /// Any failure of the initial build, and any delivery error, is returned
    /// as a [`FatalBuildError`] after the session has been disposed.
    pub async fn run<S>(self, sink: S) -> Result<RunOutput>
    where
        S: DeliverySink + 'static,
    {
        let Self { request, engine } = self;
        let watch = request.mode.is_watch();

        let mut session = engine.open(&request).await?;
        debug!(engine = engine.name(), mode = %request.mode, "session opened");

        let changes = if watch {
            match session.watch() {
                Ok(rx) => Some(rx),
                Err(fault) => {
                    session.dispose().await;
                    return Err(fault.into());
                }
            }
        } else {
            None
        };

        let output = match initial_build(session.as_mut(), &request, &sink).await {
            Ok(output) => output,
            Err(err) => {
                session.dispose().await;
                return Err(err);
            }
        };

        let Some(changes) = changes else {
            session.dispose().await;
            debug!("one-shot session disposed");
            return Ok(RunOutput {
                output,
                watch: None,
            });
        };

        let shared = Arc::new(Shared::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(watch_loop(
            session,
            changes,
            sink,
            shared.clone(),
            shutdown_rx,
        ));

        Ok(RunOutput {
            output,
            watch: Some(WatchSession {
                shared,
                shutdown: Some(shutdown_tx),
                task: Some(task),
            }),
        })
    }
}

async fn initial_build<S: DeliverySink>(
    session: &mut dyn BundleSession,
    request: &BuildRequest,
    sink: &S,
) -> Result<String> {
    let output = session
        .build()
        .await?
        .into_output()
        .map_err(|failure| FatalBuildError::Bundle {
            entry: request.entry.clone(),
            failure,
        })?;
    sink.deliver(&output).await?;
    Ok(output)
}

enum RebuildError {
    Recoverable(RecoverableBuildError),
    Fatal(FatalBuildError),
}

async fn rebuild<S: DeliverySink>(
    session: &mut dyn BundleSession,
    build: u64,
    sink: &S,
) -> std::result::Result<String, RebuildError> {
    let result = session
        .build()
        .await
        .map_err(|fault| RebuildError::Recoverable(RecoverableBuildError::Engine { build, fault }))?;
    let output = result
        .into_output()
        .map_err(|failure| RebuildError::Recoverable(RecoverableBuildError::Bundle { build, failure }))?;
    sink.deliver(&output)
        .await
        .map_err(|e| RebuildError::Fatal(e.into()))?;
    Ok(output)
}

async fn watch_loop<S: DeliverySink>(
    mut session: Box<dyn BundleSession>,
    mut changes: mpsc::Receiver<SourceChange>,
    sink: S,
    shared: Arc<Shared>,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let result = loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break Ok(()),
            change = changes.recv() => {
                let Some(change) = change else {
                    debug!("change stream closed");
                    break Ok(());
                };

                let build = shared.builds.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(build, path = %change.path().display(), "rebuilding");
                shared.set_state(SessionState::Building);

                match rebuild(session.as_mut(), build, &sink).await {
                    Ok(output) => {
                        shared.set_state(SessionState::Delivered);
                        shared.deliveries.publish(Delivery {
                            build,
                            output: Arc::from(output),
                        });
                    }
                    Err(RebuildError::Recoverable(err)) => {
                        warn!(build = err.build(), "{err}");
                        shared.set_state(SessionState::Failed);
                        shared.failures.publish(Arc::new(err));
                    }
                    Err(RebuildError::Fatal(err)) => break Err(err),
                }
            }
        }
    };

    session.dispose().await;
    shared.set_state(if result.is_ok() {
        SessionState::Disposed
    } else {
        SessionState::Aborted
    });
    shared.deliveries.close();
    shared.failures.close();
    info!(builds = shared.builds.load(Ordering::SeqCst), "watch session ended");
    result
}

/// Fan-out to live subscribers; `None` once the session has ended.
struct Subscribers<T>(Mutex<Option<Vec<mpsc::UnboundedSender<T>>>>);

impl<T: Clone> Subscribers<T> {
    fn new() -> Self {
        Self(Mutex::new(Some(Vec::new())))
    }

    fn subscribe(&self) -> UnboundedReceiverStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(subscribers) = self.0.lock().as_mut() {
            subscribers.push(tx);
        }
        UnboundedReceiverStream::new(rx)
    }

    fn publish(&self, item: T) {
        if let Some(subscribers) = self.0.lock().as_mut() {
            subscribers.retain(|tx| tx.send(item.clone()).is_ok());
        }
    }

    fn close(&self) {
        self.0.lock().take();
    }
}

struct Shared {
    state: RwLock<SessionState>,
    builds: AtomicU64,
    deliveries: Subscribers<Delivery>,
    failures: Subscribers<Arc<RecoverableBuildError>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Delivered),
            builds: AtomicU64::new(1),
            deliveries: Subscribers::new(),
            failures: Subscribers::new(),
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }
}

/// Handle to a running watch session.
///
/// Dropping the handle stops the session; use [`WatchSession::dispose`] to
/// also wait until the engine has been released.
pub struct WatchSession {
    shared: Arc<Shared>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl WatchSession {
    /// Stream of successful rebuilds from now on, in build order.
    ///
    /// Ends when the session ends.
    pub fn subscribe(&self) -> UnboundedReceiverStream<Delivery> {
        self.shared.deliveries.subscribe()
    }

    /// Stream of skipped rebuilds from now on.
    ///
    /// The previously delivered artifact stays current after each one.
    pub fn failures(&self) -> UnboundedReceiverStream<Arc<RecoverableBuildError>> {
        self.shared.failures.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.read()
    }

    /// Number of builds started so far, including the initial one.
    pub fn builds(&self) -> u64 {
        self.shared.builds.load(Ordering::SeqCst)
    }

    /// Wait until the session ends on its own.
    ///
    /// Returns the fatal error that ended it, if any. Once the result has
    /// been returned, later calls resolve to `Ok(())` immediately.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let outcome = task.await;
        self.task = None;
        match outcome {
            Ok(result) => result,
            Err(err) => Err(FatalBuildError::Aborted(err.to_string())),
        }
    }

    /// Stop watching and wait for the session to be disposed.
    pub async fn dispose(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSession")
            .field("state", &self.state())
            .field("builds", &self.builds())
            .finish()
    }
}
