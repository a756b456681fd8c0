//! Client connection registry
//!
//! Tracks every connected client behind a single mutex, mapping its id to
//! the outbound channel and display name its session registered. Broadcasts
//! snapshot the recipient list under the lock and deliver after releasing
//! it, so a slow socket never stalls registration, teardown, or other
//! broadcasts. The lock is never held across an await point.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Unique client identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    /// Create a ClientId from a raw value (mainly for testing)
    #[cfg(test)]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value (mainly for testing)
    #[cfg(test)]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client({})", self.0)
    }
}

/// Record for a connected client
pub struct ClientRecord {
    /// Channel draining into this client's socket writer task
    sender: mpsc::Sender<Bytes>,
    /// Display name, set once by the handshake
    name: Option<String>,
    /// Remote address the client connected from
    peer_addr: SocketAddr,
    /// When the client registered
    joined_at: Instant,
}

impl ClientRecord {
    /// Display name, if the handshake completed
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Remote address the client connected from
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// When the client registered
    pub fn joined_at(&self) -> Instant {
        self.joined_at
    }
}

impl std::fmt::Debug for ClientRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRecord")
            .field("name", &self.name)
            .field("peer_addr", &self.peer_addr)
            .field("sender_closed", &self.sender.is_closed())
            .finish()
    }
}

/// Outcome of one broadcast call
#[derive(Debug, Default)]
pub struct BroadcastOutcome {
    /// Recipients whose outbound queue accepted the message
    pub delivered: usize,
    /// Recipients found disconnected and unregistered during delivery
    pub dropped: Vec<ClientId>,
}

/// Registry tracking all connected clients
///
/// Thread-safe for concurrent access from all session tasks. Every lookup
/// and mutation goes through the one `clients` mutex.
pub struct ClientRegistry {
    /// Client ID -> record
    clients: Mutex<HashMap<ClientId, ClientRecord>>,
    /// Counter for generating unique client IDs
    next_client_id: AtomicU64,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    /// Create a new empty client registry
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Register a new client connection
    ///
    /// Returns the assigned ClientId. The client is visible to broadcasts
    /// from this point on, before its handshake completes.
    pub fn register(&self, sender: mpsc::Sender<Bytes>, peer_addr: SocketAddr) -> ClientId {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::SeqCst));

        let record = ClientRecord {
            sender,
            name: None,
            peer_addr,
            joined_at: Instant::now(),
        };

        self.clients.lock().insert(id, record);
        debug!("Registered {} from {}", id, peer_addr);

        id
    }

    /// Set a client's display name
    ///
    /// The first write wins: later calls leave the stored name untouched
    /// and return `false`, as does naming a client that is already gone.
    pub fn set_name(&self, client_id: ClientId, name: String) -> bool {
        let mut clients = self.clients.lock();
        match clients.get_mut(&client_id) {
            Some(record) if record.name.is_none() => {
                record.name = Some(name);
                true
            }
            _ => false,
        }
    }

    /// Look up a client's display name (mainly for testing)
    #[cfg(test)]
    pub fn name(&self, client_id: ClientId) -> Option<String> {
        self.clients.lock().get(&client_id)?.name.clone()
    }

    /// Unregister a client connection
    ///
    /// Idempotent: removing an unknown id is a no-op returning `None`.
    /// Returns the removed record so the caller can log the session it
    /// closed.
    pub fn unregister(&self, client_id: ClientId) -> Option<ClientRecord> {
        let removed = self.clients.lock().remove(&client_id);
        if removed.is_some() {
            debug!("Unregistered {}", client_id);
        }
        removed
    }

    /// Get the number of connected clients
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Get all registered client IDs (mainly for testing)
    #[cfg(test)]
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.lock().keys().copied().collect()
    }

    /// Broadcast a message to every client except `exclude`
    ///
    /// The recipient list is a snapshot taken under the lock; clients that
    /// register or unregister after the snapshot do not affect this call.
    /// Delivery happens with the lock released. A recipient whose channel
    /// has closed (its writer task is gone) is unregistered on the spot and
    /// reported in the outcome; the rest of the snapshot still receives.
    pub async fn broadcast(&self, message: Bytes, exclude: ClientId) -> BroadcastOutcome {
        let recipients: Vec<(ClientId, mpsc::Sender<Bytes>)> = {
            let clients = self.clients.lock();
            clients
                .iter()
                .filter(|&(id, _)| *id != exclude)
                .map(|(id, record)| (*id, record.sender.clone()))
                .collect()
        };

        let mut outcome = BroadcastOutcome::default();

        if recipients.is_empty() {
            return outcome;
        }

        debug!(
            "Broadcasting {} bytes to {} clients",
            message.len(),
            recipients.len()
        );

        for (client_id, sender) in recipients {
            match sender.send(message.clone()).await {
                Ok(()) => outcome.delivered += 1,
                Err(_) => {
                    warn!("{} channel closed, removing from registry", client_id);
                    self.unregister(client_id);
                    outcome.dropped.push(client_id);
                }
            }
        }

        outcome
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("client_count", &self.client_count())
            .field("next_client_id", &self.next_client_id.load(Ordering::SeqCst))
            .finish()
    }
}
