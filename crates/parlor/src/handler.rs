//! Per-connection handler: attach, pump, detach.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Attach to the hub → get the outbound queue
//!   2. Spawn a writer task draining that queue into the socket
//!   3. Loop: receive frames → decode → dispatch to the coordinator
//!   4. On exit (close, error, or panic) the guard runs the disconnect
//!      cleanup and detaches the connection

use std::sync::Arc;

use parlor_presence::Directory;
use parlor_protocol::{ClientEvent, Codec};
use parlor_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::server::ServerState;
use crate::ParlorError;

/// Drop guard that cleans up a connection when the handler exits.
///
/// Cleanup must run even if the handler panics, and `Drop` is
/// synchronous, so the async work is spawned fire-and-forget. Order
/// matters inside: the coordinator's leave cleanup runs before the hub
/// detach so departure notices still reach the room.
struct ConnectionGuard<D: Directory> {
    conn_id: ConnectionId,
    state: Arc<ServerState<D>>,
}

impl<D: Directory> Drop for ConnectionGuard<D> {
    fn drop(&mut self) {
        let conn_id = self.conn_id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.coordinator.connection_closed(&conn_id).await;
            state.hub.detach(&conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<D: Directory>(
    conn: WebSocketConnection,
    state: Arc<ServerState<D>>,
) -> Result<(), ParlorError> {
    let conn_id = conn.id().clone();
    tracing::debug!(%conn_id, "handling new connection");

    let mut outbound = state.hub.attach(conn_id.clone());

    // Writer task: everything the relay queues for this connection goes
    // out here, never from under a registry lock.
    let writer = {
        let conn = conn.clone();
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(event) = outbound.recv().await {
                let bytes = match codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "failed to encode outbound event"
                        );
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        })
    };

    let _guard = ConnectionGuard {
        conn_id: conn_id.clone(),
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        // A frame that does not decode is ignored, not fatal — the
        // coordinator must never crash on malformed input.
        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    %conn_id,
                    error = %e,
                    "ignoring undecodable frame"
                );
                continue;
            }
        };

        if state.coordinator.handle(&conn_id, event).await {
            tracing::info!(%conn_id, "client requested disconnect");
            break;
        }
    }

    writer.abort();
    // _guard drops here → disconnect cleanup fires.
    Ok(())
}
