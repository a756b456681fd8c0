//! Shared server state
//!
//! One `SharedState` is created at startup and cloned into the acceptor
//! and every session task. There is no global state; everything a task
//! needs arrives through its clone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::registry::ClientRegistry;

/// State shared by the acceptor and all session tasks
#[derive(Clone)]
pub struct SharedState {
    /// Connected-client registry
    pub registry: Arc<ClientRegistry>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Shutdown signal sender
    pub shutdown_tx: broadcast::Sender<()>,
    /// Set before the signal is sent, for subscribers that arrive late
    shutting_down: Arc<AtomicBool>,
}

impl SharedState {
    /// Create state from a loaded configuration
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            registry: Arc::new(ClientRegistry::new()),
            config: Arc::new(config),
            shutdown_tx,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the shutdown signal
    ///
    /// A receiver only sees signals sent after it subscribes; check
    /// [`Self::is_shutting_down`] right after subscribing to cover a
    /// signal that fired in between.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Whether shutdown has been signalled
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Signal all tasks to shut down
    pub fn signal_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }
}
