//! In-match rules: movement, bombs, blast resolution, power-ups, and the
//! win condition. Everything here assumes an ACTIVE session and is a
//! validated no-op (or an ERROR back to the sender) otherwise.

use blastarena_board::Cell;
use blastarena_protocol::{
    Bomb, BombId, Direction, Explosion, PlayerId, PowerUp, PowerUpId,
    PowerUpKind, ServerEvent, SessionPhase,
};
use rand::Rng;
use tracing::{debug, info};

use crate::{Session, TimerEvent, TimerKey, Update};

impl Session {
    // -----------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------

    /// A step is one cell in a cardinal direction. A blocked step still
    /// turns the player to face that way, so clients can telegraph
    /// intent against walls.
    pub(crate) fn try_move(
        &mut self,
        player: PlayerId,
        direction: Direction,
    ) -> Update {
        let mut update = Update::default();
        if self.phase() != SessionPhase::Active {
            return update;
        }
        let Some(idx) = self
            .players
            .iter()
            .position(|p| p.id == player && p.active)
        else {
            return update;
        };

        let (dx, dy) = direction.delta();
        let (nx, ny) = (self.players[idx].x + dx, self.players[idx].y + dy);

        let walkable = self
            .board
            .as_ref()
            .is_some_and(|board| board.is_path(nx, ny));
        let occupied = self
            .players
            .iter()
            .any(|p| p.active && p.id != player && p.x == nx && p.y == ny);

        let p = &mut self.players[idx];
        if walkable && !occupied {
            p.x = nx;
            p.y = ny;
            p.direction = direction;
            update.broadcast(ServerEvent::PlayerMoved {
                player_id: player,
                x: nx,
                y: ny,
                direction,
            });
            self.collect_power_up_at(player, nx, ny, &mut update);
        } else if p.direction != direction {
            p.direction = direction;
            update.broadcast(ServerEvent::PlayerMoved {
                player_id: player,
                x: p.x,
                y: p.y,
                direction,
            });
        }
        update
    }

    fn collect_power_up_at(
        &mut self,
        player: PlayerId,
        x: i32,
        y: i32,
        update: &mut Update,
    ) {
        let Some(pos) = self
            .power_ups
            .iter()
            .position(|u| u.x == x && u.y == y)
        else {
            return;
        };
        let power_up = self.power_ups.remove(pos);

        let Some(p) = self.players.iter_mut().find(|p| p.id == player) else {
            return;
        };
        match power_up.kind {
            PowerUpKind::ExtraBomb => p.max_bombs += 1,
            PowerUpKind::ExtraRange => p.bomb_range += 1,
            PowerUpKind::ExtraSpeed => p.speed += 1,
        }
        info!(%player, kind = ?power_up.kind, "power-up collected");
        update.broadcast(ServerEvent::PowerUpCollected {
            player_id: player,
            power_up_id: power_up.id,
            new_stats: p.stats(),
        });
    }

    // -----------------------------------------------------------------
    // Bombs
    // -----------------------------------------------------------------

    /// Drops a bomb on the sender's cell. The blast range is captured
    /// from the owner's stat now; later power-ups do not widen a fuse
    /// already burning.
    pub(crate) fn try_place_bomb(&mut self, player: PlayerId) -> Update {
        let mut update = Update::default();
        if self.phase() != SessionPhase::Active {
            update.error(player, "no match is running");
            return update;
        }
        let Some(p) = self
            .players
            .iter()
            .find(|p| p.id == player && p.active)
        else {
            return update;
        };

        let live = self.bombs.iter().filter(|b| b.owner == player).count();
        if live >= p.max_bombs as usize {
            update.error(player, "bomb limit reached");
            return update;
        }
        if self.bombs.iter().any(|b| b.x == p.x && b.y == p.y) {
            update.error(player, "there is already a bomb here");
            return update;
        }

        let bomb = Bomb {
            id: BombId(self.next_bomb_id),
            owner: player,
            x: p.x,
            y: p.y,
            range: p.bomb_range,
        };
        self.next_bomb_id += 1;
        debug!(%player, bomb = %bomb.id, x = bomb.x, y = bomb.y, "bomb placed");

        update.schedule(
            TimerKey::Fuse(bomb.id),
            self.config().fuse,
            TimerEvent::FuseElapsed(bomb.id),
        );
        update.broadcast(ServerEvent::BombPlaced { bomb });
        self.bombs.push(bomb);
        update
    }

    /// A fuse ran out. Walks a blast ray per direction: permanent wall
    /// stops a ray short of the wall, a destructible wall is consumed
    /// (and may drop a power-up) and stops the ray on it, open path lets
    /// it run to full range. Bombs in the path neither block nor chain;
    /// every fuse burns on its own clock.
    pub(crate) fn resolve_explosion(
        &mut self,
        id: BombId,
        rng: &mut impl Rng,
    ) -> Update {
        let mut update = Update::default();
        let Some(pos) = self.bombs.iter().position(|b| b.id == id) else {
            debug!(bomb = %id, "stale fuse ignored");
            return update;
        };
        let bomb = self.bombs.remove(pos);
        let drop_probability = self.config().power_up_probability;
        let Some(board) = self.board.as_mut() else {
            return update;
        };
        let mut cells = vec![(bomb.x, bomb.y)];
        for (dx, dy) in
            [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
                .map(|d| d.delta())
        {
            for step in 1..=bomb.range as i32 {
                let (x, y) = (bomb.x + dx * step, bomb.y + dy * step);
                match board.get(x, y) {
                    None | Some(Cell::Wall) => break,
                    Some(Cell::Destructible) => {
                        cells.push((x, y));
                        board.set(x, y, Cell::Path);
                        if rng.random_bool(drop_probability) {
                            let kind = PowerUpKind::ALL
                                [rng.random_range(0..PowerUpKind::ALL.len())];
                            self.power_ups.push(PowerUp {
                                id: PowerUpId(self.next_power_up_id),
                                x,
                                y,
                                kind,
                            });
                            self.next_power_up_id += 1;
                        }
                        break;
                    }
                    Some(Cell::Path) => cells.push((x, y)),
                }
            }
        }

        // One explosion costs at most one life per player, no matter how
        // many of its cells they overlap.
        for p in self.players.iter_mut().filter(|p| p.active) {
            if cells.contains(&(p.x, p.y)) {
                p.lives = p.lives.saturating_sub(1);
                if p.lives == 0 {
                    p.active = false;
                    info!(player = %p.id, "player eliminated");
                }
            }
        }

        info!(bomb = %id, cells = cells.len(), "bomb detonated");
        update.broadcast(ServerEvent::Explosion { id, cells: cells.clone() });
        update.schedule(
            TimerKey::Clear(id),
            self.config().explosion_clear,
            TimerEvent::ClearElapsed(id),
        );
        self.explosions.push(Explosion { id, cells });
        update.broadcast(ServerEvent::StateUpdate { snapshot: self.snapshot() });
        update
    }

    /// A blast burned out. The win check runs here, after the board has
    /// settled, so GAME_OVER never races the explosion it resulted from.
    pub(crate) fn clear_explosion(&mut self, id: BombId) -> Update {
        let mut update = Update::default();
        let Some(pos) = self.explosions.iter().position(|e| e.id == id) else {
            debug!(explosion = %id, "stale clear ignored");
            return update;
        };
        self.explosions.remove(pos);

        update.broadcast(ServerEvent::ExplosionCleared { id });
        update.broadcast(ServerEvent::StateUpdate { snapshot: self.snapshot() });
        self.check_game_over(&mut update);
        update
    }

    // -----------------------------------------------------------------
    // Elimination and the win condition
    // -----------------------------------------------------------------

    /// Marks a player out of the match (forfeit or disconnect) without
    /// disturbing anyone else's state.
    pub(crate) fn deactivate_player(&mut self, player: PlayerId) -> Update {
        let mut update = Update::default();
        let Some(p) = self
            .players
            .iter_mut()
            .find(|p| p.id == player && p.active)
        else {
            return update;
        };
        p.active = false;
        info!(%player, "player left the match");

        update.broadcast(ServerEvent::StateUpdate { snapshot: self.snapshot() });
        self.check_game_over(&mut update);
        update
    }

    fn check_game_over(&mut self, update: &mut Update) {
        if self.phase() != SessionPhase::Active {
            return;
        }
        let mut survivors = self.players.iter().filter(|p| p.active);
        let winner = match (survivors.next(), survivors.next()) {
            (_, Some(_)) => return,
            (Some(last), None) => Some(last.nickname.clone()),
            (None, None) => None,
        };

        self.finish();
        info!(winner = winner.as_deref().unwrap_or("<draw>"), "game over");

        // Live fuses are pointless now. Revoke them so a late detonation
        // cannot mutate a finished board.
        for bomb in self.bombs.drain(..) {
            update.cancel(TimerKey::Fuse(bomb.id));
        }
        update.broadcast(ServerEvent::GameOver { winner });
        update.broadcast(ServerEvent::StateUpdate { snapshot: self.snapshot() });
    }
}
