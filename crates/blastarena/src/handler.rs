//! Per-connection handler: decode inbound frames, pump outbound events.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's outbound queue. The
//! reader forwards decoded intents to the session actor; it never touches
//! game state itself.

use std::sync::Arc;

use blastarena_protocol::{ClientIntent, Codec, JsonCodec, ServerEvent};
use blastarena_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::ServerError;
use crate::actor::{Outbound, SessionHandle};

/// Handles a single connection from accept to close. The handler only
/// knows its transport id; player identity is the actor's business.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    handle: SessionHandle,
    codec: JsonCodec,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    debug!(%conn_id, "handling new connection");

    let conn = Arc::new(conn);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    handle.connected(conn_id, out_tx.clone()).await;

    // Writer task: the actor queues frames without blocking, this task
    // feeds them to the socket at the client's pace.
    let writer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(out) = out_rx.recv().await {
                match out {
                    Outbound::Frame(bytes) => {
                        if conn.send(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = conn.close().await;
                        break;
                    }
                }
            }
        })
    };

    loop {
        match conn.recv().await {
            Ok(Some(data)) => match codec.decode::<ClientIntent>(&data) {
                Ok(intent) => handle.intent(conn_id, intent).await,
                Err(e) => {
                    debug!(%conn_id, error = %e, "malformed client frame");
                    let reply = ServerEvent::Error {
                        message: "malformed message".into(),
                    };
                    if let Ok(bytes) = codec.encode(&reply) {
                        let _ = out_tx.send(Outbound::Frame(bytes));
                    }
                }
            },
            Ok(None) => {
                info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                debug!(%conn_id, error = %e, "recv error");
                break;
            }
        }
    }

    handle.disconnected(conn_id).await;
    writer.abort();
    Ok(())
}
