//! # Blastarena
//!
//! Authoritative server for a session-based multiplayer arena game.
//!
//! Clients connect over WebSocket, join a shared lobby, and play a
//! bomb-laying match on a procedurally generated board. All rules run
//! server-side; clients only send intents and render the events and
//! snapshots they receive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blastarena::BlastarenaServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), blastarena::ServerError> {
//!     let server = BlastarenaServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod actor;
mod error;
mod handler;
mod server;

pub use actor::{SessionHandle, spawn_session};
pub use error::ServerError;
pub use server::{BlastarenaServer, BlastarenaServerBuilder};

pub use blastarena_game::SessionConfig;
