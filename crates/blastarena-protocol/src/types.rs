//! Identity newtypes and small shared enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player's session-scoped identity.
///
/// Distinct from the transport's connection id on purpose: the link
/// between a connection and a player is made (and broken) in exactly one
/// place, the session actor, so spectators or reconnection could be added
/// without reshaping the entity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A bomb's identity. The explosion it produces reuses the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BombId(pub u64);

impl fmt::Display for BombId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B-{}", self.0)
    }
}

/// A power-up's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerUpId(pub u64);

impl fmt::Display for PowerUpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A facing / movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The grid delta for one step, with `y` growing downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// The effect a power-up grants when collected.
///
/// Wire codes match what the display client renders (`bomb`, `flame`,
/// `speed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +1 to the maximum number of simultaneous bombs.
    #[serde(rename = "bomb")]
    ExtraBomb,
    /// +1 to explosion range.
    #[serde(rename = "flame")]
    ExtraRange,
    /// +1 to the movement speed multiplier.
    #[serde(rename = "speed")]
    ExtraSpeed,
}

impl PowerUpKind {
    /// All kinds, for uniform random drops.
    pub const ALL: [PowerUpKind; 3] =
        [Self::ExtraBomb, Self::ExtraRange, Self::ExtraSpeed];
}

/// The match lifecycle phase, as it appears in every snapshot.
///
/// ```text
/// LOBBY → COUNTDOWN → ACTIVE → FINISHED
///   ↑         │                    │
///   └─────────┴────────(reset)─────┘
/// ```
///
/// COUNTDOWN may fall back to LOBBY when the player count drops below the
/// start threshold; FINISHED returns to LOBBY only on an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Lobby,
    Countdown,
    Active,
    Finished,
}

impl SessionPhase {
    /// Whether the session is accepting lobby joins.
    pub fn accepts_joins(self) -> bool {
        matches!(self, Self::Lobby | Self::Countdown)
    }

    /// Whether the simulation is running.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "LOBBY"),
            Self::Countdown => write!(f, "COUNTDOWN"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

/// Who should receive an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected client.
    All,
    /// One specific player.
    Player(PlayerId),
}
