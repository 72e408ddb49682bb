//! Wire protocol for Blastarena.
//!
//! Every type that travels between the server and a display client lives
//! here: identity newtypes, the entity records carried in state snapshots,
//! and the two closed message enums — [`ClientIntent`] (client → server)
//! and [`ServerEvent`] (server → client). Keeping both directions as
//! tagged enums means the compiler enforces exhaustive handling; there is
//! no string-keyed dispatch anywhere.
//!
//! Messages are JSON with a `"type"` discriminator, encoded through the
//! [`Codec`] trait so the framing can be swapped without touching game
//! code.

mod codec;
mod entities;
mod error;
mod message;
mod sanitize;
mod types;

pub use codec::{Codec, JsonCodec};
pub use entities::{
    Bomb, ChatEntry, Counters, Explosion, LobbyPlayer, Player, PowerUp,
    PowerUpStats, Snapshot,
};
pub use error::ProtocolError;
pub use message::{ClientIntent, ServerEvent};
pub use sanitize::{
    MAX_CHAT_LEN, MAX_NICKNAME_LEN, NicknameError, clean_chat,
    clean_nickname, escape_html,
};
pub use types::{
    BombId, Direction, PlayerId, PowerUpId, PowerUpKind, Recipient,
    SessionPhase,
};
