//! Timer side effects as data.
//!
//! The game engine never sleeps or spawns tasks. Every operation returns
//! an [`Update`] whose `timers` list tells the runtime what to schedule or
//! cancel; the runtime feeds fired [`TimerEvent`]s back through
//! [`Session::handle_timer`](crate::Session::handle_timer). Cancellation
//! is keyed, so resetting a session (or removing a bomb) can revoke its
//! pending callbacks instead of relying on fire-time guards alone.

use std::time::Duration;

use blastarena_protocol::{BombId, PlayerId, Recipient, ServerEvent};

/// Identifies a scheduled callback for cancellation.
///
/// Grace and countdown ticks re-chain under their single key, so one
/// cancel kills the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// The "minimum players reached" grace period (per-second tick).
    Grace,
    /// The pre-game countdown (per-second tick).
    Countdown,
    /// A bomb's fuse.
    Fuse(BombId),
    /// An explosion's burn-out delay.
    Clear(BombId),
}

/// What a fired timer means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    GraceTick,
    CountdownTick,
    FuseElapsed(BombId),
    ClearElapsed(BombId),
}

/// A scheduling instruction for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOp {
    /// Arm a one-shot timer. Re-arming an existing key replaces it.
    Schedule {
        key: TimerKey,
        after: Duration,
        event: TimerEvent,
    },
    /// Revoke a pending timer; a no-op if the key is not armed.
    Cancel(TimerKey),
    /// Revoke everything (session reset).
    CancelAll,
}

/// The result of one serialized mutation: events to deliver, timer
/// operations to apply, and connections to drop.
#[derive(Debug, Default)]
pub struct Update {
    pub events: Vec<(Recipient, ServerEvent)>,
    pub timers: Vec<TimerOp>,
    /// Connections to close after their events are flushed (e.g. a join
    /// rejected because the lobby is full).
    pub hangups: Vec<PlayerId>,
}

impl Update {
    pub fn broadcast(&mut self, event: ServerEvent) {
        self.events.push((Recipient::All, event));
    }

    pub fn unicast(&mut self, player: PlayerId, event: ServerEvent) {
        self.events.push((Recipient::Player(player), event));
    }

    pub fn error(&mut self, player: PlayerId, message: impl Into<String>) {
        self.unicast(player, ServerEvent::Error { message: message.into() });
    }

    pub fn schedule(&mut self, key: TimerKey, after: Duration, event: TimerEvent) {
        self.timers.push(TimerOp::Schedule { key, after, event });
    }

    pub fn cancel(&mut self, key: TimerKey) {
        self.timers.push(TimerOp::Cancel(key));
    }

    pub fn cancel_all(&mut self) {
        self.timers.push(TimerOp::CancelAll);
    }

    /// Whether this update carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.timers.is_empty() && self.hangups.is_empty()
    }
}
