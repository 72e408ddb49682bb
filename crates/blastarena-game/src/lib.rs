//! Authoritative game engine for Blastarena.
//!
//! One [`Session`] is the single mutable root: lobby roster, board,
//! players, bombs, explosions, power-ups, and chat. Every inbound intent,
//! timer fire, and disconnect goes through one of three entry points —
//! [`Session::handle_intent`], [`Session::handle_timer`],
//! [`Session::handle_disconnect`] — each of which validates, mutates, and
//! returns an [`Update`] describing the events to deliver and the timers
//! to arm or revoke. The engine itself is synchronous and side-effect
//! free, so the whole rule set is testable without a runtime; the server
//! crate serializes calls through a single actor task.

mod session;
mod simulation;
mod timer;

pub use session::{AVATARS, Session};
pub use timer::{TimerEvent, TimerKey, TimerOp, Update};

use std::time::Duration;

/// Tunables for a session. Defaults reproduce the shipped game.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Arena height.
    pub rows: usize,
    /// Arena width.
    pub cols: usize,
    /// Players needed before the grace timer starts.
    pub min_players: usize,
    /// Lobby capacity; reaching it starts the countdown at once.
    pub max_players: usize,
    /// Grace period after `min_players` is reached, in seconds.
    pub grace_secs: u32,
    /// Pre-game countdown length, in seconds.
    pub countdown_secs: u32,
    /// Delay between bomb placement and detonation.
    pub fuse: Duration,
    /// How long a blast stays on the board.
    pub explosion_clear: Duration,
    /// Starting lives.
    pub lives: u32,
    /// Chance that a destroyed wall drops a power-up.
    pub power_up_probability: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            cols: 30,
            min_players: 2,
            max_players: 4,
            grace_secs: 20,
            countdown_secs: 10,
            fuse: Duration::from_millis(3000),
            explosion_clear: Duration::from_millis(500),
            lives: 3,
            power_up_probability: 0.30,
        }
    }
}
