//! The two closed message enums: client intents and server events.
//!
//! `#[serde(tag = "type")]` produces internally tagged JSON, so a MOVE
//! intent is `{"type":"MOVE","direction":"up"}` and anything with an
//! unknown tag fails to decode instead of reaching game logic.

use blastarena_board::Board;
use serde::{Deserialize, Serialize};

use crate::{
    Bomb, BombId, ChatEntry, Counters, Direction, LobbyPlayer, Player,
    PlayerId, PowerUpId, PowerUpStats, Snapshot,
};

/// Everything a client may ask for. Positions are never part of an
/// intent: the server derives them, clients only express direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientIntent {
    /// Enter the lobby under a nickname.
    Join { nickname: String },
    /// Say something; echoed to everyone after escaping.
    ChatMessage { text: String },
    /// Step (or turn) in a direction.
    Move { direction: Direction },
    /// Drop a bomb on the current cell.
    PlaceBomb,
    /// Skip the remaining grace period and start the countdown.
    ManualStart,
    /// Leave the lobby, or forfeit a running match.
    Leave,
    /// Return a finished session to the lobby.
    Reset,
}

/// Everything the server tells clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// Unicast reply to a successful JOIN.
    #[serde(rename_all = "camelCase")]
    Welcome { player_id: PlayerId, avatar: String },

    /// Lobby roster or timer counters changed.
    LobbyUpdate {
        players: Vec<LobbyPlayer>,
        counters: Counters,
    },

    /// The pre-game countdown began.
    #[serde(rename_all = "camelCase")]
    CountdownStart {
        /// Unix milliseconds at which play begins.
        starts_at: u64,
    },

    /// The match began; board and spawn assignments are final.
    GameStart {
        board: Board,
        players: Vec<Player>,
    },

    /// Full post-mutation snapshot.
    StateUpdate { snapshot: Snapshot },

    /// A validated move was applied.
    #[serde(rename_all = "camelCase")]
    PlayerMoved {
        player_id: PlayerId,
        x: i32,
        y: i32,
        direction: Direction,
    },

    /// A bomb appeared on the board.
    BombPlaced { bomb: Bomb },

    /// A bomb detonated over the given cells.
    Explosion { id: BombId, cells: Vec<(i32, i32)> },

    /// A blast finished burning out.
    ExplosionCleared { id: BombId },

    /// A player walked onto a power-up.
    #[serde(rename = "POWERUP_COLLECTED", rename_all = "camelCase")]
    PowerUpCollected {
        player_id: PlayerId,
        power_up_id: PowerUpId,
        new_stats: PowerUpStats,
    },

    /// A chat line, already escaped.
    ChatMessage {
        #[serde(flatten)]
        entry: ChatEntry,
    },

    /// The match ended. `winner` is `None` on a draw.
    GameOver { winner: Option<String> },

    /// A rejected or malformed request.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_tags_match_wire_contract() {
        let cases = [
            (
                ClientIntent::Join { nickname: "kim".into() },
                "JOIN",
            ),
            (
                ClientIntent::ChatMessage { text: "hi".into() },
                "CHAT_MESSAGE",
            ),
            (
                ClientIntent::Move { direction: Direction::Up },
                "MOVE",
            ),
            (ClientIntent::PlaceBomb, "PLACE_BOMB"),
            (ClientIntent::ManualStart, "MANUAL_START"),
            (ClientIntent::Leave, "LEAVE"),
            (ClientIntent::Reset, "RESET"),
        ];
        for (intent, tag) in cases {
            let json: serde_json::Value =
                serde_json::to_value(&intent).unwrap();
            assert_eq!(json["type"], tag);
        }
    }

    #[test]
    fn test_move_intent_decodes_from_client_json() {
        let intent: ClientIntent =
            serde_json::from_str(r#"{"type":"MOVE","direction":"left"}"#)
                .unwrap();
        assert_eq!(
            intent,
            ClientIntent::Move { direction: Direction::Left }
        );
    }

    #[test]
    fn test_unknown_intent_tag_is_rejected() {
        let result: Result<ClientIntent, _> =
            serde_json::from_str(r#"{"type":"TELEPORT","x":5,"y":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_welcome_json_shape() {
        let event = ServerEvent::Welcome {
            player_id: PlayerId(3),
            avatar: "B2".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "WELCOME");
        assert_eq!(json["playerId"], 3);
        assert_eq!(json["avatar"], "B2");
    }

    #[test]
    fn test_powerup_collected_tag_has_no_underscore() {
        let event = ServerEvent::PowerUpCollected {
            player_id: PlayerId(1),
            power_up_id: PowerUpId(9),
            new_stats: PowerUpStats {
                max_bombs: 2,
                bomb_range: 1,
                speed: 1,
            },
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "POWERUP_COLLECTED");
        assert_eq!(json["powerUpId"], 9);
        assert_eq!(json["newStats"]["maxBombs"], 2);
    }

    #[test]
    fn test_chat_event_flattens_entry() {
        let event = ServerEvent::ChatMessage {
            entry: ChatEntry {
                nickname: "kim".into(),
                text: "gg".into(),
                timestamp: 1700000000000,
            },
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CHAT_MESSAGE");
        assert_eq!(json["nickname"], "kim");
        assert_eq!(json["text"], "gg");
        assert!(json.get("entry").is_none());
    }

    #[test]
    fn test_game_over_draw_serializes_null_winner() {
        let json: serde_json::Value =
            serde_json::to_value(&ServerEvent::GameOver { winner: None })
                .unwrap();
        assert_eq!(json["type"], "GAME_OVER");
        assert!(json["winner"].is_null());
    }

    #[test]
    fn test_server_event_round_trip() {
        let event = ServerEvent::Explosion {
            id: BombId(12),
            cells: vec![(5, 5), (5, 6), (4, 5)],
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, back);
    }
}
