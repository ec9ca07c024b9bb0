//! `ParlorServer` builder and accept loop.
//!
//! The entry point for running a Parlor server: it wires transport →
//! protocol → coordinator and spawns one handler task per connection.

use std::sync::Arc;

use parlor_presence::Directory;
use parlor_protocol::JsonCodec;
use parlor_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ClientHub, Coordinator, ParlorError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<D: Directory> {
    pub(crate) hub: ClientHub,
    pub(crate) coordinator: Coordinator<ClientHub, D>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,no_run
/// use parlor::prelude::*;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let server = ParlorServerBuilder::new()
///     .bind("0.0.0.0:5000")
///     .build(GuestDirectory::new())
///     .await?;
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds the server with the given identity directory.
    pub async fn build<D: Directory>(
        self,
        directory: D,
    ) -> Result<ParlorServer<D>, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let hub = ClientHub::new();
        let coordinator = Coordinator::new(hub.clone(), directory);
        let state = Arc::new(ServerState {
            hub,
            coordinator,
            codec: JsonCodec,
        });

        Ok(ParlorServer { transport, state })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<D: Directory> {
    transport: WebSocketTransport,
    state: Arc<ServerState<D>>,
}

impl<D: Directory> ParlorServer<D> {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
