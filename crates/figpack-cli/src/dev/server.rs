//! HTTP side of `figpack dev`: the project root plus the reload stream.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use figpack::preview::LIVE_RELOAD_PATH;
use figpack::ServerAddress;
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::dev::{DevEvent, SharedState};
use crate::error::{CliError, Result};

/// Removes an SSE client from the registry when its stream is dropped.
struct ClientGuard {
    state: SharedState,
    id: usize,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.state.unregister_client(self.id);
        tracing::debug!(
            client = self.id,
            clients = self.state.client_count(),
            "preview disconnected"
        );
    }
}

pub struct DevServer {
    address: ServerAddress,
    root: PathBuf,
    state: SharedState,
}

impl DevServer {
    pub fn new(address: ServerAddress, root: PathBuf, state: SharedState) -> Self {
        Self {
            address,
            root,
            state,
        }
    }

    /// Routes: the SSE endpoint, everything else from the project root.
    ///
    /// CORS is open because the preview page is loaded from disk.
    pub fn router(&self) -> Router {
        Router::new()
            .route(LIVE_RELOAD_PATH, get(handle_sse))
            .fallback_service(ServeDir::new(&self.root))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self.state.clone())
    }

    /// Bind and serve until the task is aborted.
    pub async fn start(self) -> Result<()> {
        let bind = (self.address.host.as_str(), self.address.port);
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", self.address, e)))?;

        tracing::info!(address = %self.address, root = %self.root.display(), "dev server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| CliError::Server(format!("Server error: {e}")))
    }
}

async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(client_stream(state)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Register a client and stream its events, starting with `connected`.
fn client_stream(
    state: SharedState,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, clients = state.client_count(), "preview connected");

    let guard = ClientGuard { state, id };
    tokio_stream::once(DevEvent::ClientConnected { id })
        .chain(UnboundedReceiverStream::new(rx))
        .map(move |event| {
            let _registered = &guard;
            Ok(to_sse(&event))
        })
}

fn to_sse(event: &DevEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.name()).data(data)
}
