//! Connected preview pages.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::dev::DevEvent;

/// SSE client registry.
#[derive(Debug, Default)]
pub struct DevState {
    clients: RwLock<HashMap<usize, mpsc::UnboundedSender<DevEvent>>>,
    next_client_id: AtomicUsize,
}

pub type SharedState = Arc<DevState>;

impl DevState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_client(&self) -> (usize, mpsc::UnboundedReceiver<DevEvent>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send `event` to every client, dropping the ones that went away.
    pub fn broadcast(&self, event: &DevEvent) {
        let mut clients = self.clients.write();
        clients.retain(|id, tx| {
            let alive = tx.send(event.clone()).is_ok();
            if !alive {
                tracing::debug!(client = id, "preview disconnected");
            }
            alive
        });
    }
}
