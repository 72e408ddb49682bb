//! `BlastarenaServer` builder and accept loop.
//!
//! This is the entry point for running the game server. It ties the
//! layers together: transport → protocol → session actor.

use blastarena_game::SessionConfig;
use blastarena_protocol::JsonCodec;
use blastarena_transport::{Transport, WebSocketTransport};

use crate::ServerError;
use crate::actor::{SessionHandle, spawn_session};
use crate::handler::handle_connection;

/// Builder for configuring and starting a Blastarena server.
///
/// # Example
///
/// ```rust,ignore
/// let server = BlastarenaServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct BlastarenaServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl BlastarenaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the transport and spawns the session actor.
    pub async fn build(self) -> Result<BlastarenaServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let handle = spawn_session(self.session_config);
        Ok(BlastarenaServer {
            transport,
            handle,
            codec: JsonCodec,
        })
    }
}

impl Default for BlastarenaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Blastarena game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BlastarenaServer {
    transport: WebSocketTransport,
    handle: SessionHandle,
    codec: JsonCodec,
}

impl BlastarenaServer {
    /// Creates a new builder.
    pub fn builder() -> BlastarenaServerBuilder {
        BlastarenaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("Blastarena server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let handle = self.handle.clone();
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, handle, codec).await
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
