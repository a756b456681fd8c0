//! Connection handling for the natter client
//!
//! A background task owns the framed socket; the rest of the client
//! talks to it over channels, so reading the server and reading stdin
//! never block each other.

// Allow unused code that's part of the public API for future features
#![allow(dead_code)]

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use natter_protocol::ChunkCodec;
use natter_utils::{NatterError, Result};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Client connection to a natter relay
pub struct Connection {
    /// Server address (host:port)
    connect_addr: String,
    /// Current state
    state: ConnectionState,
    /// Channel for outgoing chunks
    tx: mpsc::Sender<Bytes>,
    /// Channel for receiving chunks
    rx: mpsc::Receiver<Bytes>,
    /// Handle to the connection task
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Connection {
    /// Create a new connection (not yet connected)
    pub fn new(addr: String) -> Self {
        let (tx, _) = mpsc::channel(100);
        let (_, rx) = mpsc::channel(100);

        Self {
            connect_addr: addr,
            state: ConnectionState::Disconnected,
            tx,
            rx,
            task_handle: None,
        }
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect to the server
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;

        let addr = self.connect_addr.clone();
        let stream = TcpStream::connect(&addr).await.map_err(|e| {
            self.state = ConnectionState::Disconnected;
            NatterError::Connection(format!("Failed to connect to {}: {}", addr, e))
        })?;

        let framed = Framed::new(stream, ChunkCodec::new());

        let (outgoing_tx, outgoing_rx) = mpsc::channel::<Bytes>(100);
        let (incoming_tx, incoming_rx) = mpsc::channel::<Bytes>(100);

        self.tx = outgoing_tx;
        self.rx = incoming_rx;

        let handle = tokio::spawn(Self::connection_task(framed, outgoing_rx, incoming_tx));
        self.task_handle = Some(handle);

        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Disconnect from the server
    pub async fn disconnect(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Send a chunk to the server
    pub async fn send(&self, chunk: Bytes) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(NatterError::connection("Not connected"));
        }

        self.tx
            .send(chunk)
            .await
            .map_err(|_| NatterError::ConnectionClosed)?;

        Ok(())
    }

    /// Receive the next chunk from the server (blocking)
    ///
    /// Returns `None` once the server has closed the connection.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Background task that handles the actual socket I/O
    async fn connection_task(
        mut framed: Framed<TcpStream, ChunkCodec>,
        mut outgoing: mpsc::Receiver<Bytes>,
        incoming: mpsc::Sender<Bytes>,
    ) {
        loop {
            tokio::select! {
                // Handle outgoing chunks
                Some(chunk) = outgoing.recv() => {
                    if let Err(e) = framed.send(chunk).await {
                        tracing::error!("Failed to send chunk: {}", e);
                        break;
                    }
                }

                // Handle incoming chunks
                result = framed.next() => {
                    match result {
                        Some(Ok(chunk)) => {
                            if incoming.send(chunk).await.is_err() {
                                // Receiver dropped
                                tracing::debug!("Incoming channel closed, receiver dropped");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!("Failed to read from server: {}", e);
                            break;
                        }
                        None => {
                            // Stream ended
                            tracing::info!("Server closed connection");
                            break;
                        }
                    }
                }
            }
        }
    }
}
