//! Per-client session handling
//!
//! Each accepted connection gets one `ClientSession` driving its read
//! side and a companion writer task draining its outbound queue. The two
//! halves block independently, so a client slow to read never stops the
//! session from relaying what it sends.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use natter_protocol::{chat_line, join_notice, ChunkCodec};

use crate::registry::ClientId;
use crate::state::SharedState;

/// How long teardown waits for the writer task to drain before aborting it
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Handshake,
    Active,
    Closed,
}

/// One client connection, from accept to disconnect
pub struct ClientSession {
    id: ClientId,
    peer_addr: SocketAddr,
    shared: SharedState,
    state: SessionState,
}

impl ClientSession {
    /// Drive a freshly accepted connection until it disconnects
    pub async fn run(stream: TcpStream, peer_addr: SocketAddr, shared: SharedState) {
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(shared.config.limits.outbound_queue);

        let id = shared.registry.register(outbound_tx, peer_addr);
        let mut session = Self {
            id,
            peer_addr,
            shared,
            state: SessionState::Connecting,
        };

        let writer = tokio::spawn(drain_outbound(id, write_half, outbound_rx));
        let mut chunks = FramedRead::new(read_half, ChunkCodec::new());
        let mut shutdown_rx = session.shared.subscribe_shutdown();

        // A signal sent before the subscription above is not replayed
        if session.shared.is_shutting_down() {
            session.teardown(writer).await;
            return;
        }

        session.transition(SessionState::Handshake);
        if let Some(name) = session.handshake(&mut chunks, &mut shutdown_rx).await {
            session.transition(SessionState::Active);
            session.relay_loop(&name, &mut chunks, &mut shutdown_rx).await;
        }

        session.teardown(writer).await;
    }

    /// Wait for the client's first chunk and take it as the display name
    ///
    /// Returns `None` when the connection ends or the server shuts down
    /// before any input arrives; nothing has been announced in that case.
    async fn handshake(
        &self,
        chunks: &mut FramedRead<OwnedReadHalf, ChunkCodec>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Option<String> {
        let chunk = tokio::select! {
            next = chunks.next() => match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    warn!("{} read error during handshake: {}", self.id, e);
                    return None;
                }
                None => {
                    debug!("{} disconnected before sending a name", self.id);
                    return None;
                }
            },
            _ = shutdown_rx.recv() => return None,
        };

        // The whole first chunk is the name, byte for byte
        let name = String::from_utf8_lossy(&chunk).into_owned();
        self.shared.registry.set_name(self.id, name.clone());
        info!("{} joined as {:?} from {}", self.id, name, self.peer_addr);

        let outcome = self
            .shared
            .registry
            .broadcast(join_notice(&name), self.id)
            .await;
        debug!(
            "{} join notice reached {} clients",
            self.id, outcome.delivered
        );

        Some(name)
    }

    /// Relay every chunk the client sends to everyone else
    async fn relay_loop(
        &self,
        name: &str,
        chunks: &mut FramedRead<OwnedReadHalf, ChunkCodec>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                next = chunks.next() => match next {
                    Some(Ok(chunk)) => {
                        let outcome = self
                            .shared
                            .registry
                            .broadcast(chat_line(name, &chunk), self.id)
                            .await;
                        if !outcome.dropped.is_empty() {
                            debug!(
                                "{} relay dropped {} stale clients",
                                self.id,
                                outcome.dropped.len()
                            );
                        }
                    }
                    Some(Err(e)) => {
                        warn!("{} read error: {}", self.id, e);
                        break;
                    }
                    None => {
                        debug!("{} closed the connection", self.id);
                        break;
                    }
                },
                _ = shutdown_rx.recv() => {
                    debug!("{} closing for shutdown", self.id);
                    break;
                }
            }
        }
    }

    /// Unregister and wait for the writer task to finish
    async fn teardown(mut self, mut writer: JoinHandle<()>) {
        self.transition(SessionState::Closed);

        // Dropping the registry record closes the outbound channel, which
        // lets the writer task drain its queue and exit on its own.
        if let Some(record) = self.shared.registry.unregister(self.id) {
            info!(
                "{} ({}) from {} disconnected after {:?}",
                self.id,
                record.name().unwrap_or("unnamed"),
                record.peer_addr(),
                record.joined_at().elapsed()
            );
        }

        match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("{} writer task failed: {}", self.id, e),
            Err(_) => {
                warn!("{} writer did not drain in time, aborting", self.id);
                writer.abort();
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("{} state {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }
}

/// Writer task owning the socket's write half
///
/// Runs until the outbound queue closes or a write fails. A failed write
/// only ends this task; the read side notices on its own.
async fn drain_outbound(
    id: ClientId,
    mut write_half: OwnedWriteHalf,
    mut outbound_rx: mpsc::Receiver<Bytes>,
) {
    while let Some(chunk) = outbound_rx.recv().await {
        if let Err(e) = write_half.write_all(&chunk).await {
            debug!("{} write failed: {}", id, e);
            break;
        }
    }
}
