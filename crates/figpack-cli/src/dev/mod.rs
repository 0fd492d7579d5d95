//! Development server for watch sessions.
//!
//! The preview `index.html` written by the watch session points its base
//! URL at this server and listens on the SSE endpoint; every delivered
//! build is pushed to it as a `reload` event.

pub mod server;
pub mod state;

pub use server::DevServer;
pub use state::{DevState, SharedState};

use figpack::{Delivery, RecoverableBuildError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};

/// Events pushed to connected preview pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DevEvent {
    /// A build was delivered to disk.
    Reload { build: u64, bytes: usize },

    ClientConnected { id: usize },
}

impl DevEvent {
    /// SSE event name the preview script listens for.
    pub fn name(&self) -> &'static str {
        match self {
            DevEvent::Reload { .. } => "reload",
            DevEvent::ClientConnected { .. } => "connected",
        }
    }
}

/// Broadcast a `reload` for every delivery until the stream ends.
pub fn forward_deliveries<S>(mut deliveries: S, state: SharedState) -> JoinHandle<()>
where
    S: Stream<Item = Delivery> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(delivery) = deliveries.next().await {
            crate::ui::success(&format!(
                "Rebuilt #{} ({})",
                delivery.build,
                crate::ui::format_size(delivery.output.len() as u64)
            ));
            state.broadcast(&DevEvent::Reload {
                build: delivery.build,
                bytes: delivery.output.len(),
            });
        }
        tracing::debug!("delivery stream closed");
    })
}

/// Status line for a rebuild that was skipped.
pub fn failure_notice(err: &RecoverableBuildError) -> String {
    format!("{err}\n  Keeping the last good build; fix the error and save again")
}

/// Warn about every skipped rebuild until the stream ends.
///
/// Preview pages are not notified; they keep showing the last good build.
pub fn report_failures<S>(mut failures: S) -> JoinHandle<()>
where
    S: Stream<Item = Arc<RecoverableBuildError>> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(err) = failures.next().await {
            crate::ui::warning(&failure_notice(&err));
        }
    })
}
