//! TCP listener and accept loop

use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use natter_utils::{NatterError, Result};

use crate::session::ClientSession;
use crate::state::SharedState;

/// Bind a listener according to the listen configuration
fn bind_listener(shared: &SharedState) -> Result<TcpListener> {
    let addr = shared.config.listen.socket_addr()?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(|e| NatterError::connection(format!("Failed to create socket: {}", e)))?;

    socket
        .set_reuseaddr(true)
        .map_err(|e| NatterError::connection(format!("Failed to set SO_REUSEADDR: {}", e)))?;

    socket
        .bind(addr)
        .map_err(|e| NatterError::connection(format!("Failed to bind {}: {}", addr, e)))?;

    socket
        .listen(shared.config.listen.backlog)
        .map_err(|e| NatterError::connection(format!("Failed to listen on {}: {}", addr, e)))
}

/// Bind per the configuration and serve until shutdown
pub async fn run_accept_loop(shared: SharedState) -> Result<()> {
    let listener = bind_listener(&shared)?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, shared).await
}

/// Accept connections on an already bound listener until shutdown
///
/// Each connection runs as its own session task in a `JoinSet`. On
/// shutdown the listener closes first, then the remaining sessions are
/// awaited; they observe the same shutdown signal and wind down on
/// their own.
pub async fn serve(listener: TcpListener, shared: SharedState) -> Result<()> {
    let mut shutdown_rx = shared.subscribe_shutdown();
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer_addr)) => {
                        debug!("New connection from {}", peer_addr);
                        sessions.spawn(ClientSession::run(stream, peer_addr, shared.clone()));
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            Some(result) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = result {
                    warn!("Session task failed: {}", e);
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    drop(listener);
    info!(
        "Waiting for {} active sessions to close",
        shared.registry.client_count()
    );
    while let Some(result) = sessions.join_next().await {
        if let Err(e) = result {
            warn!("Session task failed: {}", e);
        }
    }

    Ok(())
}
