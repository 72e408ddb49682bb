//! Session actor: an isolated Tokio task that owns the one game session.
//!
//! Connection handlers and timer tasks talk to it through an mpsc
//! channel, so every mutation of game state is serialized without any
//! shared mutable state. Handlers identify themselves by transport
//! [`ConnectionId`]; the actor assigns each connection its [`PlayerId`]
//! and is the only place the two are linked. It applies each
//! [`Update`] the engine returns: it encodes and fans out events,
//! arms and revokes timers, and closes rejected connections.
//!
//! Timers are spawned sleep tasks. Each one is registered under its
//! [`TimerKey`] so it can be aborted when the engine cancels it, and it
//! carries the registry epoch from when it was armed; `CancelAll` bumps
//! the epoch so a fire already sitting in the channel is recognized as
//! stale and dropped.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use blastarena_game::{Session, SessionConfig, TimerEvent, TimerKey, TimerOp, Update};
use blastarena_protocol::{ClientIntent, Codec, JsonCodec, PlayerId, Recipient};
use blastarena_transport::ConnectionId;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

/// Frames queued for one connection's writer task.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// An encoded server event.
    Frame(Vec<u8>),
    /// Flush and close the connection.
    Close,
}

pub(crate) type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Commands sent to the session actor through its channel.
pub(crate) enum SessionCommand {
    /// A connection finished its setup and can receive events.
    Connected {
        conn: ConnectionId,
        outbound: OutboundSender,
    },
    /// A decoded client intent.
    Intent {
        conn: ConnectionId,
        intent: ClientIntent,
    },
    /// The connection's reader saw EOF or an error.
    Disconnected { conn: ConnectionId },
    /// A scheduled timer elapsed.
    TimerFired { epoch: u64, event: TimerEvent },
}

/// Handle to the running session actor. Cheap to clone; one per
/// connection handler.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) async fn connected(&self, conn: ConnectionId, outbound: OutboundSender) {
        let _ = self
            .tx
            .send(SessionCommand::Connected { conn, outbound })
            .await;
    }

    pub(crate) async fn intent(&self, conn: ConnectionId, intent: ClientIntent) {
        let _ = self.tx.send(SessionCommand::Intent { conn, intent }).await;
    }

    pub(crate) async fn disconnected(&self, conn: ConnectionId) {
        let _ = self.tx.send(SessionCommand::Disconnected { conn }).await;
    }
}

/// Spawns the session actor task and returns a handle to it.
pub fn spawn_session(config: SessionConfig) -> SessionHandle {
    let (tx, rx) = mpsc::channel(64);
    let actor = SessionActor {
        session: Session::new(config),
        codec: JsonCodec,
        connections: HashMap::new(),
        players: HashMap::new(),
        next_player_id: 1,
        timers: TimerRegistry::default(),
        rng: StdRng::from_os_rng(),
        rx,
        tx: tx.clone(),
    };
    tokio::spawn(actor.run());
    SessionHandle { tx }
}

/// Pending timer tasks, keyed for cancellation.
#[derive(Default)]
struct TimerRegistry {
    epoch: u64,
    handles: HashMap<TimerKey, AbortHandle>,
}

impl TimerRegistry {
    fn apply(&mut self, ops: Vec<TimerOp>, tx: &mpsc::Sender<SessionCommand>) {
        for op in ops {
            match op {
                TimerOp::Schedule { key, after, event } => {
                    if let Some(old) = self.handles.remove(&key) {
                        old.abort();
                    }
                    let epoch = self.epoch;
                    let tx = tx.clone();
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx
                            .send(SessionCommand::TimerFired { epoch, event })
                            .await;
                    });
                    self.handles.insert(key, task.abort_handle());
                }
                TimerOp::Cancel(key) => {
                    if let Some(handle) = self.handles.remove(&key) {
                        handle.abort();
                        debug!(?key, "timer cancelled");
                    }
                }
                TimerOp::CancelAll => {
                    self.epoch += 1;
                    for (_, handle) in self.handles.drain() {
                        handle.abort();
                    }
                    debug!(epoch = self.epoch, "all timers cancelled");
                }
            }
        }
    }

    /// Forgets the registry entry for a timer that just fired.
    fn fired(&mut self, event: &TimerEvent) {
        let key = match event {
            TimerEvent::GraceTick => TimerKey::Grace,
            TimerEvent::CountdownTick => TimerKey::Countdown,
            TimerEvent::FuseElapsed(id) => TimerKey::Fuse(*id),
            TimerEvent::ClearElapsed(id) => TimerKey::Clear(*id),
        };
        self.handles.remove(&key);
    }
}

struct SessionActor {
    session: Session,
    codec: JsonCodec,
    connections: HashMap<PlayerId, OutboundSender>,
    /// The one place a transport connection maps to a player identity.
    players: HashMap<ConnectionId, PlayerId>,
    next_player_id: u64,
    timers: TimerRegistry,
    rng: StdRng,
    rx: mpsc::Receiver<SessionCommand>,
    /// Handed to timer tasks so their fires come back through the queue.
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        info!("session actor started");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                SessionCommand::Connected { conn, outbound } => {
                    let player = PlayerId(self.next_player_id);
                    self.next_player_id += 1;
                    self.players.insert(conn, player);
                    self.connections.insert(player, outbound);
                    debug!(%conn, %player, connections = self.connections.len(), "connection registered");
                }
                SessionCommand::Intent { conn, intent } => {
                    let Some(&player) = self.players.get(&conn) else {
                        debug!(%conn, "intent from unregistered connection");
                        continue;
                    };
                    let update =
                        self.session.handle_intent(player, intent, unix_ms());
                    self.apply(update);
                }
                SessionCommand::Disconnected { conn } => {
                    let Some(player) = self.players.remove(&conn) else {
                        continue;
                    };
                    self.connections.remove(&player);
                    let update = self.session.handle_disconnect(player);
                    self.apply(update);
                }
                SessionCommand::TimerFired { epoch, event } => {
                    if epoch != self.timers.epoch {
                        debug!(?event, "stale timer fire dropped");
                        continue;
                    }
                    self.timers.fired(&event);
                    let update = self.session.handle_timer(
                        event,
                        unix_ms(),
                        &mut self.rng,
                    );
                    self.apply(update);
                }
            }
        }

        info!("session actor stopped");
    }

    fn apply(&mut self, update: Update) {
        for (recipient, event) in &update.events {
            let bytes = match self.codec.encode(event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(error = %e, "failed to encode server event");
                    continue;
                }
            };
            match recipient {
                Recipient::All => {
                    for outbound in self.connections.values() {
                        let _ = outbound.send(Outbound::Frame(bytes.clone()));
                    }
                }
                Recipient::Player(player) => {
                    if let Some(outbound) = self.connections.get(player) {
                        let _ = outbound.send(Outbound::Frame(bytes));
                    }
                }
            }
        }

        self.timers.apply(update.timers, &self.tx);

        for player in update.hangups {
            if let Some(outbound) = self.connections.get(&player) {
                let _ = outbound.send(Outbound::Close);
            }
        }
    }
}

/// Wall-clock unix milliseconds for chat stamps and countdown targets.
fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
