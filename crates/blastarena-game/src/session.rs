//! The session aggregate and its lifecycle state machine.
//!
//! Phase transitions live here: lobby admission, the grace and countdown
//! timers, game start (board generation + spawn assignment happen at the
//! COUNTDOWN→ACTIVE instant, not earlier), and the reset edge back to the
//! lobby. In-match rules live in `simulation.rs`.

use std::time::Duration;

use blastarena_board::Board;
use rand::Rng;
use tracing::{debug, info};

use blastarena_protocol::{
    Bomb, ChatEntry, ClientIntent, Counters, Direction, Explosion,
    LobbyPlayer, Player, PlayerId, PowerUp, ServerEvent, SessionPhase,
    Snapshot, clean_chat, clean_nickname,
};

use crate::{SessionConfig, TimerEvent, TimerKey, Update};

/// The fixed avatar pool, assigned first-free in join order.
pub const AVATARS: [&str; 4] = ["B1", "B2", "B3", "B4"];

const TICK: Duration = Duration::from_secs(1);

/// The single mutable root of one match lifecycle.
pub struct Session {
    config: SessionConfig,
    phase: SessionPhase,
    lobby: Vec<LobbyPlayer>,
    avatars: Vec<String>,
    pub(crate) board: Option<Board>,
    pub(crate) players: Vec<Player>,
    pub(crate) bombs: Vec<Bomb>,
    pub(crate) explosions: Vec<Explosion>,
    pub(crate) power_ups: Vec<PowerUp>,
    chat: Vec<ChatEntry>,
    grace_remaining: Option<u32>,
    countdown_remaining: Option<u32>,
    pub(crate) next_bomb_id: u64,
    pub(crate) next_power_up_id: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Lobby,
            lobby: Vec::new(),
            avatars: AVATARS.iter().map(|a| a.to_string()).collect(),
            board: None,
            players: Vec::new(),
            bombs: Vec::new(),
            explosions: Vec::new(),
            power_ups: Vec::new(),
            chat: Vec::new(),
            grace_remaining: None,
            countdown_remaining: None,
            next_bomb_id: 0,
            next_power_up_id: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lobby(&self) -> &[LobbyPlayer] {
        &self.lobby
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    // -----------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------

    /// Processes one client intent. `now_ms` is unix milliseconds,
    /// injected so tests control the clock.
    pub fn handle_intent(
        &mut self,
        player: PlayerId,
        intent: ClientIntent,
        now_ms: u64,
    ) -> Update {
        match intent {
            ClientIntent::Join { nickname } => {
                self.join(player, &nickname, now_ms)
            }
            ClientIntent::ChatMessage { text } => {
                self.chat_message(player, &text, now_ms)
            }
            ClientIntent::Move { direction } => self.try_move(player, direction),
            ClientIntent::PlaceBomb => self.try_place_bomb(player),
            ClientIntent::ManualStart => self.manual_start(player, now_ms),
            ClientIntent::Leave => self.leave(player),
            ClientIntent::Reset => self.reset(player),
        }
    }

    /// Processes a fired timer. Stale fires (entity gone, phase moved
    /// on) are no-ops: cancellation is the primary defense, this guard
    /// is the backstop.
    pub fn handle_timer(
        &mut self,
        event: TimerEvent,
        now_ms: u64,
        rng: &mut impl Rng,
    ) -> Update {
        match event {
            TimerEvent::GraceTick => self.grace_tick(now_ms),
            TimerEvent::CountdownTick => self.countdown_tick(rng),
            TimerEvent::FuseElapsed(id) => self.resolve_explosion(id, rng),
            TimerEvent::ClearElapsed(id) => self.clear_explosion(id),
        }
    }

    /// A connection dropped. During a match the player is marked
    /// inactive in place; in the lobby their seat and avatar are freed.
    pub fn handle_disconnect(&mut self, player: PlayerId) -> Update {
        match self.phase {
            SessionPhase::Active => self.deactivate_player(player),
            _ => self.remove_from_lobby(player),
        }
    }

    // -----------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------

    fn join(&mut self, player: PlayerId, raw_nickname: &str, now_ms: u64) -> Update {
        let mut update = Update::default();

        if !self.phase.accepts_joins() {
            update.error(player, "a match is already running");
            return update;
        }
        if self.lobby.iter().any(|p| p.id == player) {
            update.error(player, "already joined");
            return update;
        }

        let nickname = match clean_nickname(raw_nickname) {
            Ok(n) => n,
            Err(e) => {
                update.error(player, e.to_string());
                return update;
            }
        };
        if self.lobby.iter().any(|p| p.nickname == nickname) {
            update.error(player, "nickname already taken");
            return update;
        }
        if self.lobby.len() >= self.config.max_players || self.avatars.is_empty()
        {
            update.error(player, "lobby is full");
            update.hangups.push(player);
            return update;
        }

        let avatar = self.avatars.remove(0);
        info!(%player, %nickname, %avatar, "player joined lobby");
        self.lobby.push(LobbyPlayer {
            id: player,
            nickname,
            avatar: avatar.clone(),
        });

        update.unicast(player, ServerEvent::Welcome { player_id: player, avatar });
        self.check_start_conditions(&mut update, now_ms);
        update.broadcast(self.lobby_update());
        update
    }

    fn leave(&mut self, player: PlayerId) -> Update {
        match self.phase {
            SessionPhase::Active => self.deactivate_player(player),
            // A leave after the match ended doubles as a reset request.
            SessionPhase::Finished => self.reset(player),
            _ => self.remove_from_lobby(player),
        }
    }

    fn remove_from_lobby(&mut self, player: PlayerId) -> Update {
        let mut update = Update::default();
        let Some(pos) = self.lobby.iter().position(|p| p.id == player) else {
            return update;
        };

        let seat = self.lobby.remove(pos);
        self.avatars.push(seat.avatar);
        // Keep the pool ordered so the lowest avatar is handed out next.
        self.avatars.sort();
        info!(%player, "player left lobby");

        // Dropping below the start threshold revokes any pending start.
        if self.lobby.len() < self.config.min_players {
            if self.grace_remaining.take().is_some() {
                update.cancel(TimerKey::Grace);
            }
            if self.countdown_remaining.take().is_some() {
                update.cancel(TimerKey::Countdown);
            }
            if self.phase == SessionPhase::Countdown {
                self.phase = SessionPhase::Lobby;
                info!("countdown cancelled, back to lobby");
            }
        }

        update.broadcast(self.lobby_update());
        update
    }

    fn chat_message(&mut self, player: PlayerId, raw: &str, now_ms: u64) -> Update {
        let mut update = Update::default();
        let Some(nickname) = self.nickname_of(player) else {
            debug!(%player, "chat from unjoined connection ignored");
            return update;
        };
        let Some(text) = clean_chat(raw) else {
            return update;
        };

        let entry = ChatEntry { nickname, text, timestamp: now_ms };
        self.chat.push(entry.clone());
        update.broadcast(ServerEvent::ChatMessage { entry });
        update
    }

    fn manual_start(&mut self, player: PlayerId, now_ms: u64) -> Update {
        let mut update = Update::default();
        if self.phase != SessionPhase::Lobby
            || !self.lobby.iter().any(|p| p.id == player)
            || self.lobby.len() < self.config.min_players
        {
            update.error(player, "cannot start now");
            return update;
        }
        self.begin_countdown(&mut update, now_ms);
        update.broadcast(self.lobby_update());
        update
    }

    fn reset(&mut self, player: PlayerId) -> Update {
        let mut update = Update::default();
        if self.phase != SessionPhase::Finished {
            update.error(player, "reset is only allowed after a match ends");
            return update;
        }

        info!("session reset, returning to lobby");
        self.phase = SessionPhase::Lobby;
        self.board = None;
        self.players.clear();
        self.bombs.clear();
        self.explosions.clear();
        self.power_ups.clear();
        self.chat.clear();
        self.lobby.clear();
        self.avatars = AVATARS.iter().map(|a| a.to_string()).collect();
        self.grace_remaining = None;
        self.countdown_remaining = None;

        update.cancel_all();
        update.broadcast(ServerEvent::StateUpdate { snapshot: self.snapshot() });
        update.broadcast(self.lobby_update());
        update
    }

    // -----------------------------------------------------------------
    // Start conditions and timers
    // -----------------------------------------------------------------

    fn check_start_conditions(&mut self, update: &mut Update, now_ms: u64) {
        if self.phase != SessionPhase::Lobby {
            return;
        }
        if self.lobby.len() >= self.config.max_players {
            self.begin_countdown(update, now_ms);
        } else if self.lobby.len() >= self.config.min_players
            && self.grace_remaining.is_none()
        {
            self.grace_remaining = Some(self.config.grace_secs);
            update.schedule(TimerKey::Grace, TICK, TimerEvent::GraceTick);
            debug!(secs = self.config.grace_secs, "grace period started");
        }
    }

    fn begin_countdown(&mut self, update: &mut Update, now_ms: u64) {
        if self.phase != SessionPhase::Lobby {
            return;
        }
        if self.grace_remaining.take().is_some() {
            update.cancel(TimerKey::Grace);
        }
        self.phase = SessionPhase::Countdown;
        self.countdown_remaining = Some(self.config.countdown_secs);
        update.schedule(TimerKey::Countdown, TICK, TimerEvent::CountdownTick);
        update.broadcast(ServerEvent::CountdownStart {
            starts_at: now_ms + u64::from(self.config.countdown_secs) * 1000,
        });
        info!(secs = self.config.countdown_secs, "countdown started");
    }

    fn grace_tick(&mut self, now_ms: u64) -> Update {
        let mut update = Update::default();
        let Some(remaining) = self.grace_remaining else {
            debug!("stale grace tick ignored");
            return update;
        };
        if self.phase != SessionPhase::Lobby {
            debug!(phase = %self.phase, "grace tick outside lobby ignored");
            return update;
        }

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.grace_remaining = None;
            self.begin_countdown(&mut update, now_ms);
        } else {
            self.grace_remaining = Some(remaining);
            update.schedule(TimerKey::Grace, TICK, TimerEvent::GraceTick);
        }
        update.broadcast(self.lobby_update());
        update
    }

    fn countdown_tick(&mut self, rng: &mut impl Rng) -> Update {
        let mut update = Update::default();
        let Some(remaining) = self.countdown_remaining else {
            debug!("stale countdown tick ignored");
            return update;
        };
        if self.phase != SessionPhase::Countdown {
            debug!(phase = %self.phase, "countdown tick out of phase ignored");
            return update;
        }

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.countdown_remaining = None;
            self.start_game(&mut update, rng);
        } else {
            self.countdown_remaining = Some(remaining);
            update.schedule(TimerKey::Countdown, TICK, TimerEvent::CountdownTick);
            update.broadcast(self.lobby_update());
        }
        update
    }

    /// The COUNTDOWN→ACTIVE instant: the board is generated and every
    /// lobby seat becomes a live player on its spawn cell.
    fn start_game(&mut self, update: &mut Update, rng: &mut impl Rng) {
        let generator = blastarena_board::GeneratorConfig {
            rows: self.config.rows,
            cols: self.config.cols,
            ..Default::default()
        };
        let board = blastarena_board::generate(&generator, rng);
        let spawns = board.spawn_cells();

        self.players = self
            .lobby
            .iter()
            .take(spawns.len())
            .zip(spawns)
            .map(|(seat, (x, y))| Player {
                id: seat.id,
                nickname: seat.nickname.clone(),
                avatar: seat.avatar.clone(),
                x,
                y,
                direction: Direction::Down,
                lives: self.config.lives,
                active: true,
                max_bombs: 1,
                bomb_range: 1,
                speed: 1,
            })
            .collect();

        self.phase = SessionPhase::Active;
        info!(players = self.players.len(), "game started");

        update.broadcast(ServerEvent::GameStart {
            board: board.clone(),
            players: self.players.clone(),
        });
        self.board = Some(board);
    }

    // -----------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------

    pub(crate) fn lobby_update(&self) -> ServerEvent {
        ServerEvent::LobbyUpdate {
            players: self.lobby.clone(),
            counters: self.counters(),
        }
    }

    fn counters(&self) -> Counters {
        Counters {
            grace_remaining: self.grace_remaining,
            countdown_remaining: self.countdown_remaining,
        }
    }

    fn nickname_of(&self, player: PlayerId) -> Option<String> {
        self.lobby
            .iter()
            .find(|p| p.id == player)
            .map(|p| p.nickname.clone())
            .or_else(|| {
                self.players
                    .iter()
                    .find(|p| p.id == player)
                    .map(|p| p.nickname.clone())
            })
    }

    /// A full, self-consistent view of the session.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            board: self.board.clone(),
            players: self.players.clone(),
            bombs: self.bombs.clone(),
            explosions: self.explosions.clone(),
            power_ups: self.power_ups.clone(),
            chat: self.chat.clone(),
            counters: self.counters(),
        }
    }

    pub(crate) fn finish(&mut self) {
        self.phase = SessionPhase::Finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimerOp;
    use blastarena_protocol::Recipient;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(5)
    }

    fn config() -> SessionConfig {
        SessionConfig {
            rows: 7,
            cols: 7,
            grace_secs: 3,
            countdown_secs: 2,
            ..SessionConfig::default()
        }
    }

    fn join(s: &mut Session, id: u64, nickname: &str) -> Update {
        s.handle_intent(
            PlayerId(id),
            ClientIntent::Join { nickname: nickname.into() },
            0,
        )
    }

    fn events(update: &Update) -> Vec<&ServerEvent> {
        update.events.iter().map(|(_, e)| e).collect()
    }

    fn has_error(update: &Update) -> bool {
        events(update)
            .iter()
            .any(|e| matches!(e, ServerEvent::Error { .. }))
    }

    // -----------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------

    #[test]
    fn test_join_welcomes_with_first_free_avatar() {
        let mut s = Session::new(config());
        let update = join(&mut s, 1, "ana");
        match &update.events[0] {
            (Recipient::Player(pid), ServerEvent::Welcome { player_id, avatar }) => {
                assert_eq!((*pid, *player_id), (PlayerId(1), PlayerId(1)));
                assert_eq!(avatar, "B1");
            }
            other => panic!("expected unicast WELCOME, got {other:?}"),
        }
        assert_eq!(s.lobby().len(), 1);
    }

    #[test]
    fn test_duplicate_nickname_is_rejected() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        let update = join(&mut s, 2, "ana");
        assert!(has_error(&update));
        assert_eq!(s.lobby().len(), 1);
    }

    #[test]
    fn test_rejoin_from_same_connection_is_rejected() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        let update = join(&mut s, 1, "ana2");
        assert!(has_error(&update));
        assert_eq!(s.lobby().len(), 1);
    }

    #[test]
    fn test_blank_nickname_is_rejected() {
        let mut s = Session::new(config());
        let update = join(&mut s, 1, "   ");
        assert!(has_error(&update));
        assert!(s.lobby().is_empty());
    }

    #[test]
    fn test_nickname_markup_is_escaped_on_the_roster() {
        let mut s = Session::new(config());
        join(&mut s, 1, "<b>ana</b>");
        assert_eq!(s.lobby()[0].nickname, "&lt;b&gt;ana&lt;&#x2F;b&gt;");
    }

    #[test]
    fn test_fifth_join_is_refused_and_hung_up() {
        let mut s = Session::new(config());
        for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")] {
            join(&mut s, id, name);
        }
        let update = join(&mut s, 5, "e");
        assert!(has_error(&update));
        assert_eq!(update.hangups, vec![PlayerId(5)]);
        assert_eq!(s.lobby().len(), 4);
    }

    #[test]
    fn test_join_during_active_match_is_refused() {
        let mut s = session_in_countdown();
        let mut r = rng();
        s.handle_timer(TimerEvent::CountdownTick, 1000, &mut r);
        s.handle_timer(TimerEvent::CountdownTick, 2000, &mut r);
        assert_eq!(s.phase(), SessionPhase::Active);
        let update = join(&mut s, 9, "late");
        assert!(has_error(&update));
    }

    // -----------------------------------------------------------------
    // Grace and countdown
    // -----------------------------------------------------------------

    fn session_in_countdown() -> Session {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");
        s.handle_intent(PlayerId(1), ClientIntent::ManualStart, 0);
        assert_eq!(s.phase(), SessionPhase::Countdown);
        s
    }

    #[test]
    fn test_second_join_arms_the_grace_timer() {
        let mut s = Session::new(config());
        let update = join(&mut s, 1, "ana");
        assert!(update.timers.is_empty());

        let update = join(&mut s, 2, "bo");
        assert!(update.timers.iter().any(|t| matches!(
            t,
            TimerOp::Schedule { key: TimerKey::Grace, .. }
        )));
        assert_eq!(s.grace_remaining, Some(3));
    }

    #[test]
    fn test_grace_ticks_down_and_rechains() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");

        let update = s.handle_timer(TimerEvent::GraceTick, 1000, &mut rng());
        assert_eq!(s.grace_remaining, Some(2));
        assert!(update.timers.iter().any(|t| matches!(
            t,
            TimerOp::Schedule { key: TimerKey::Grace, .. }
        )));
        // Counters ride along on the roster broadcast.
        assert!(events(&update).iter().any(|e| matches!(
            e,
            ServerEvent::LobbyUpdate { counters, .. }
                if counters.grace_remaining == Some(2)
        )));
    }

    #[test]
    fn test_grace_running_out_starts_the_countdown() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");
        let mut r = rng();
        s.handle_timer(TimerEvent::GraceTick, 1000, &mut r);
        s.handle_timer(TimerEvent::GraceTick, 2000, &mut r);
        let update = s.handle_timer(TimerEvent::GraceTick, 3000, &mut r);

        assert_eq!(s.phase(), SessionPhase::Countdown);
        assert_eq!(s.grace_remaining, None);
        assert!(events(&update).iter().any(|e| matches!(
            e,
            // 3000 now + 2s countdown.
            ServerEvent::CountdownStart { starts_at: 5000 }
        )));
    }

    #[test]
    fn test_fourth_join_skips_grace_entirely() {
        let mut s = Session::new(config());
        join(&mut s, 1, "a");
        join(&mut s, 2, "b");
        join(&mut s, 3, "c");
        let update = join(&mut s, 4, "d");

        assert_eq!(s.phase(), SessionPhase::Countdown);
        assert!(update.timers.contains(&TimerOp::Cancel(TimerKey::Grace)));
        assert!(events(&update).iter().any(|e| matches!(
            e,
            ServerEvent::CountdownStart { .. }
        )));
    }

    #[test]
    fn test_manual_start_needs_minimum_players() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        let update = s.handle_intent(PlayerId(1), ClientIntent::ManualStart, 0);
        assert!(has_error(&update));
        assert_eq!(s.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn test_manual_start_from_outside_the_lobby_is_refused() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");
        let update = s.handle_intent(PlayerId(9), ClientIntent::ManualStart, 0);
        assert!(has_error(&update));
        assert_eq!(s.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn test_countdown_zero_spawns_players_on_their_corners() {
        let mut s = session_in_countdown();
        let mut r = rng();
        s.handle_timer(TimerEvent::CountdownTick, 1000, &mut r);
        let update = s.handle_timer(TimerEvent::CountdownTick, 2000, &mut r);

        assert_eq!(s.phase(), SessionPhase::Active);
        let players = events(&update)
            .iter()
            .find_map(|e| match e {
                ServerEvent::GameStart { players, .. } => Some(players.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!((players[0].x, players[0].y), (1, 1));
        assert_eq!((players[1].x, players[1].y), (5, 1));
        assert!(players.iter().all(|p| p.lives == 3 && p.active));
        assert!(s.board().is_some());
    }

    #[test]
    fn test_leave_during_countdown_revokes_it() {
        let mut s = session_in_countdown();
        let update = s.handle_intent(PlayerId(2), ClientIntent::Leave, 0);

        assert_eq!(s.phase(), SessionPhase::Lobby);
        assert!(update.timers.contains(&TimerOp::Cancel(TimerKey::Countdown)));

        // The already-in-flight tick must land on the stale guard.
        let late = s.handle_timer(TimerEvent::CountdownTick, 1000, &mut rng());
        assert!(late.is_empty());
        assert_eq!(s.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn test_leave_during_grace_revokes_it() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");
        let update = s.handle_intent(PlayerId(1), ClientIntent::Leave, 0);

        assert!(update.timers.contains(&TimerOp::Cancel(TimerKey::Grace)));
        let late = s.handle_timer(TimerEvent::GraceTick, 1000, &mut rng());
        assert!(late.is_empty());
    }

    #[test]
    fn test_freed_avatar_goes_to_the_next_joiner() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");
        s.handle_intent(PlayerId(1), ClientIntent::Leave, 0);
        join(&mut s, 3, "cy");
        // "bo" kept B2, so the freed B1 is handed back out.
        let cy = s.lobby().iter().find(|p| p.nickname == "cy").unwrap();
        assert_eq!(cy.avatar, "B1");
    }

    // -----------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------

    #[test]
    fn test_chat_is_broadcast_escaped_and_stamped() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        let update = s.handle_intent(
            PlayerId(1),
            ClientIntent::ChatMessage { text: "hi <all>".into() },
            1234,
        );
        match &update.events[0] {
            (Recipient::All, ServerEvent::ChatMessage { entry }) => {
                assert_eq!(entry.nickname, "ana");
                assert_eq!(entry.text, "hi &lt;all&gt;");
                assert_eq!(entry.timestamp, 1234);
            }
            other => panic!("expected broadcast chat, got {other:?}"),
        }
        assert_eq!(s.snapshot().chat.len(), 1);
    }

    #[test]
    fn test_blank_chat_is_dropped() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        let update = s.handle_intent(
            PlayerId(1),
            ClientIntent::ChatMessage { text: "   ".into() },
            0,
        );
        assert!(update.is_empty());
    }

    #[test]
    fn test_chat_from_unjoined_connection_is_ignored() {
        let mut s = Session::new(config());
        let update = s.handle_intent(
            PlayerId(1),
            ClientIntent::ChatMessage { text: "hello".into() },
            0,
        );
        assert!(update.is_empty());
    }

    // -----------------------------------------------------------------
    // Reset and disconnects
    // -----------------------------------------------------------------

    #[test]
    fn test_reset_outside_finished_is_refused() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        let update = s.handle_intent(PlayerId(1), ClientIntent::Reset, 0);
        assert!(has_error(&update));
        assert_eq!(s.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn test_reset_after_finish_returns_a_clean_lobby() {
        let mut s = session_in_countdown();
        let mut r = rng();
        s.handle_timer(TimerEvent::CountdownTick, 1000, &mut r);
        s.handle_timer(TimerEvent::CountdownTick, 2000, &mut r);
        s.handle_intent(PlayerId(2), ClientIntent::Leave, 0);
        assert_eq!(s.phase(), SessionPhase::Finished);

        let update = s.handle_intent(PlayerId(1), ClientIntent::Reset, 0);
        assert_eq!(s.phase(), SessionPhase::Lobby);
        assert!(update.timers.contains(&TimerOp::CancelAll));
        assert!(s.lobby().is_empty());
        assert!(s.players().is_empty());
        assert!(s.board().is_none());
        assert!(s.snapshot().chat.is_empty());
        assert_eq!(s.avatars.len(), AVATARS.len());
    }

    #[test]
    fn test_reset_then_replayed_joins_reach_a_fresh_match() {
        let mut s = session_in_countdown();
        let mut r = rng();
        s.handle_timer(TimerEvent::CountdownTick, 1000, &mut r);
        s.handle_timer(TimerEvent::CountdownTick, 2000, &mut r);
        s.handle_intent(PlayerId(2), ClientIntent::Leave, 0);
        assert_eq!(s.phase(), SessionPhase::Finished);
        s.handle_intent(PlayerId(1), ClientIntent::Reset, 0);

        // The same join sequence as round one, replayed from scratch.
        join(&mut s, 1, "ana");
        let update = join(&mut s, 2, "bo");
        assert!(update.timers.iter().any(|t| matches!(
            t,
            TimerOp::Schedule { key: TimerKey::Grace, .. }
        )));
        s.handle_intent(PlayerId(1), ClientIntent::ManualStart, 0);
        s.handle_timer(TimerEvent::CountdownTick, 1000, &mut r);
        let update = s.handle_timer(TimerEvent::CountdownTick, 2000, &mut r);

        // Round two looks exactly like a first match.
        assert_eq!(s.phase(), SessionPhase::Active);
        assert!(events(&update).iter().any(|e| matches!(
            e,
            ServerEvent::GameStart { .. }
        )));
        assert!(s.board().is_some());
        assert!(s.bombs().is_empty());
        let players = s.players();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].avatar, "B1");
        assert_eq!((players[0].x, players[0].y), (1, 1));
        assert!(players.iter().all(|p| p.lives == 3 && p.active));
    }

    #[test]
    fn test_lobby_disconnect_frees_the_seat() {
        let mut s = Session::new(config());
        join(&mut s, 1, "ana");
        join(&mut s, 2, "bo");
        s.handle_disconnect(PlayerId(1));
        assert_eq!(s.lobby().len(), 1);
        assert!(s.avatars.contains(&"B1".to_string()));
    }

    #[test]
    fn test_mid_match_disconnect_deactivates_in_place() {
        let mut s = session_in_countdown();
        let mut r = rng();
        s.handle_timer(TimerEvent::CountdownTick, 1000, &mut r);
        s.handle_timer(TimerEvent::CountdownTick, 2000, &mut r);

        s.handle_disconnect(PlayerId(2));
        let gone = s.players().iter().find(|p| p.id == PlayerId(2)).unwrap();
        assert!(!gone.active);
        // Their record stays for rendering; only liveness changes.
        assert_eq!(gone.nickname, "bo");
    }
}
