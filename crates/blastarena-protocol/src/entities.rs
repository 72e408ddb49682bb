//! Entity records: the value types carried in snapshots and events.
//!
//! These are owned by the session on the server and rendered verbatim by
//! clients, so they live in the protocol crate with wire-facing field
//! names (camelCase).

use blastarena_board::Board;
use serde::{Deserialize, Serialize};

use crate::{BombId, Direction, PlayerId, PowerUpId, PowerUpKind, SessionPhase};

/// A participant in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    /// Avatar selector from the fixed pool (`B1`–`B4`).
    pub avatar: String,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub lives: u32,
    /// `false` before spawn, after elimination, and after disconnect.
    pub active: bool,
    /// Maximum simultaneous live bombs. Starts at 1.
    pub max_bombs: u32,
    /// Explosion range in cells. Starts at 1.
    pub bomb_range: u32,
    /// Movement speed multiplier, applied client-side. Starts at 1.
    pub speed: u32,
}

impl Player {
    /// The player's current power-up stats, as echoed in
    /// `POWERUP_COLLECTED`.
    pub fn stats(&self) -> PowerUpStats {
        PowerUpStats {
            max_bombs: self.max_bombs,
            bomb_range: self.bomb_range,
            speed: self.speed,
        }
    }
}

/// The mutable power-up stats of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpStats {
    pub max_bombs: u32,
    pub bomb_range: u32,
    pub speed: u32,
}

/// A ticking bomb. Position and range are fixed at placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bomb {
    pub id: BombId,
    pub owner: PlayerId,
    pub x: i32,
    pub y: i32,
    /// Blast range captured from the owner's stat when placed. A range
    /// power-up collected while the fuse ticks does not widen it.
    pub range: u32,
}

/// An active blast. The cell set is computed once at detonation and never
/// recomputed; the id reuses the originating bomb's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explosion {
    pub id: BombId,
    pub cells: Vec<(i32, i32)>,
}

/// A collectible power-up sitting on a path cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUp {
    pub id: PowerUpId,
    pub x: i32,
    pub y: i32,
    pub kind: PowerUpKind,
}

/// One chat line, HTML-escaped before storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub nickname: String,
    pub text: String,
    /// Unix milliseconds.
    pub timestamp: u64,
}

/// A lobby roster entry, before spawn positions exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyPlayer {
    pub id: PlayerId,
    pub nickname: String,
    pub avatar: String,
}

/// Remaining seconds on the lobby timers, when running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    /// "Minimum players reached" grace timer.
    pub grace_remaining: Option<u32>,
    /// Pre-game countdown timer.
    pub countdown_remaining: Option<u32>,
}

/// A full, self-consistent view of the session, broadcast after
/// mutations. Clients may render it wholesale; there are no deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: SessionPhase,
    pub board: Option<Board>,
    pub players: Vec<Player>,
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<Explosion>,
    pub power_ups: Vec<PowerUp>,
    pub chat: Vec<ChatEntry>,
    pub counters: Counters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_json_field_names_are_camel_case() {
        let p = Player {
            id: PlayerId(1),
            nickname: "kim".into(),
            avatar: "B1".into(),
            x: 1,
            y: 1,
            direction: Direction::Down,
            lives: 3,
            active: true,
            max_bombs: 1,
            bomb_range: 1,
            speed: 1,
        };
        let json: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(json["maxBombs"], 1);
        assert_eq!(json["bombRange"], 1);
        assert_eq!(json["direction"], "down");
        assert!(json.get("max_bombs").is_none());
    }

    #[test]
    fn test_stats_mirror_player_fields() {
        let mut p = Player {
            id: PlayerId(1),
            nickname: "kim".into(),
            avatar: "B1".into(),
            x: 1,
            y: 1,
            direction: Direction::Down,
            lives: 3,
            active: true,
            max_bombs: 2,
            bomb_range: 4,
            speed: 3,
        };
        assert_eq!(
            p.stats(),
            PowerUpStats { max_bombs: 2, bomb_range: 4, speed: 3 }
        );
        p.bomb_range += 1;
        assert_eq!(p.stats().bomb_range, 5);
    }

    #[test]
    fn test_explosion_round_trip() {
        let e = Explosion {
            id: BombId(4),
            cells: vec![(3, 3), (3, 4), (2, 3)],
        };
        let bytes = serde_json::to_vec(&e).unwrap();
        let back: Explosion = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn test_snapshot_without_board_serializes_null() {
        let snap = Snapshot {
            phase: SessionPhase::Lobby,
            board: None,
            players: vec![],
            bombs: vec![],
            explosions: vec![],
            power_ups: vec![],
            chat: vec![],
            counters: Counters::default(),
        };
        let json: serde_json::Value = serde_json::to_value(&snap).unwrap();
        assert!(json["board"].is_null());
        assert_eq!(json["phase"], "LOBBY");
        assert!(json["counters"]["graceRemaining"].is_null());
    }
}
