//! Event dispatch: the relay's state machine.
//!
//! The engine owns the three tables behind one `parking_lot::Mutex`;
//! every incoming event is processed read-modify-publish under a
//! single lock acquisition, so no two dispatch actions can interleave
//! their reads and writes — the serialized single-writer discipline
//! the tables require. Nothing here touches a socket: dispatch
//! returns a list of [`Effect`]s and the transport performs the
//! writes, best-effort.
//!
//! Per-connection lifecycle, tracked through the membership table:
//! `DISCONNECTED → LOBBY(none) → IN_GAME(id) → LOBBY(none) | DISCONNECTED`.

use arbiter_protocol::{Event, GameId, StatsReply};
use metrics::counter;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::membership::{Membership, MembershipTable};
use crate::metrics::{RELAY_DECODE_FAILURES_TOTAL, RELAY_EVENTS_TOTAL};
use crate::registry::ConnectionRegistry;
use crate::sessions::{GameSession, SessionTable};

/// Broadcast topic for a game id.
#[must_use]
pub fn game_topic(game: GameId) -> String {
    format!("game{game}")
}

/// One side effect of a dispatch action, executed by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Send this payload directly to the originating connection.
    Reply(String),
    /// Publish this payload to a topic, excluding the originator.
    Publish {
        /// Target topic.
        topic: String,
        /// Encoded wire payload.
        payload: String,
    },
    /// Subscribe the originating connection to a topic.
    Subscribe(String),
}

#[derive(Debug, Default)]
struct RelayState {
    registry: ConnectionRegistry,
    membership: MembershipTable,
    sessions: SessionTable,
}

impl RelayState {
    fn stats(&self, id: Option<Value>) -> StatsReply {
        let players = self.registry.len() as u64;
        let bound = self.membership.bound_count() as u64;
        StatsReply {
            players,
            games_in_progress: self.sessions.len() as u64,
            players_available: players.saturating_sub(bound),
            id,
        }
    }
}

/// The relay engine: three tables behind one lock, plus the dispatch
/// table mapping event kind to table mutations and publishes.
#[derive(Debug, Default)]
pub struct RelayEngine {
    state: Mutex<RelayState>,
}

impl RelayEngine {
    /// Create an engine with empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection opened with this token.
    pub fn on_connect(&self, token: &str) {
        self.state.lock().registry.register(token.to_owned());
        debug!(token, "connection registered");
    }

    /// Dispatch one raw incoming payload from `token`.
    pub fn on_message(&self, token: &str, text: &str) -> Vec<Effect> {
        let (event, id) = match Event::decode(text) {
            Ok(decoded) => decoded,
            Err(err) => {
                // Decode failure is local to the sender: error reply,
                // no table mutation, no broadcast.
                counter!(RELAY_DECODE_FAILURES_TOTAL).increment(1);
                debug!(token, error = %err, "undecodable payload");
                return vec![Effect::Reply(
                    Event::Error {
                        message: err.to_string(),
                    }
                    .encode(None),
                )];
            }
        };
        counter!(RELAY_EVENTS_TOTAL, "kind" => event.kind()).increment(1);

        let mut state = self.state.lock();
        match event {
            Event::Ping => vec![Effect::Reply(Event::Pong.encode(id))],

            Event::JoinedLobby => {
                state.membership.enter_lobby(token.to_owned());
                vec![]
            }

            Event::LeftLobby => {
                // Only meaningful when a record exists; removing an
                // absent record is the same no-op either way.
                state.membership.leave_lobby(token);
                vec![]
            }

            Event::JoinedGame { game, side } => {
                let opponent = state.sessions.join(game, side, token.to_owned());
                state.membership.bind(token.to_owned(), game);
                debug!(token, game, side = %side, opponent = ?opponent, "seat taken");
                vec![
                    Effect::Subscribe(game_topic(game)),
                    Effect::Publish {
                        topic: game_topic(game),
                        payload: Event::JoinedGame { game, side }.encode(None),
                    },
                ]
            }

            Event::LeftGame => match state.membership.membership_of(token) {
                Membership::Game(game) => {
                    let vacated = state.sessions.vacate(game, token);
                    state.membership.unbind(token);
                    debug!(token, game, ?vacated, "seat left");
                    vec![Effect::Publish {
                        topic: game_topic(game),
                        payload: Event::LeftGame.encode(None),
                    }]
                }
                // Not in a game: nothing to leave, nothing to publish.
                Membership::Lobby | Membership::Unknown => vec![],
            },

            Event::MadeMove { mv } => match state.membership.membership_of(token) {
                Membership::Game(game) => {
                    if state.sessions.record_move(game, mv) {
                        vec![Effect::Publish {
                            topic: game_topic(game),
                            payload: Event::MadeMove { mv }.encode(None),
                        }]
                    } else {
                        // Session already cleaned up: dropped update,
                        // never surfaced, never retried.
                        debug!(token, game, "move for absent session dropped");
                        vec![]
                    }
                }
                Membership::Lobby | Membership::Unknown => vec![],
            },

            Event::RequestDraw { game: requested } => {
                match state.membership.membership_of(token) {
                    Membership::Game(game) => {
                        // Topic comes from the membership captured
                        // before unbinding, not from the client param.
                        let _ = state.sessions.vacate(game, token);
                        state.membership.unbind(token);
                        debug!(token, game, requested, "draw requested, seat vacated");
                        vec![Effect::Publish {
                            topic: game_topic(game),
                            payload: Event::RequestDraw { game: requested }.encode(None),
                        }]
                    }
                    Membership::Lobby | Membership::Unknown => vec![],
                }
            }

            event @ (Event::TurnTimerStart { .. } | Event::TurnTimerEnd { .. }) => {
                match state.membership.membership_of(token) {
                    Membership::Game(game) => vec![Effect::Publish {
                        topic: game_topic(game),
                        payload: event.encode(None),
                    }],
                    Membership::Lobby | Membership::Unknown => vec![],
                }
            }

            Event::GetStats => vec![Effect::Reply(state.stats(id).to_wire())],

            // Clients have no business sending these; ignore.
            Event::Pong | Event::Error { .. } => vec![],
        }
    }

    /// A connection with this token closed, normally or abnormally.
    ///
    /// Server-initiated cleanup: unregister, vacate the current game
    /// (publishing a synthesized `leftGame`), drop the membership
    /// record. The only point where cleanup is not client-driven.
    pub fn on_disconnect(&self, token: &str) -> Vec<Effect> {
        let mut state = self.state.lock();
        state.registry.unregister(token);
        let mut effects = Vec::new();
        if let Membership::Game(game) = state.membership.membership_of(token) {
            let vacated = state.sessions.vacate(game, token);
            debug!(token, game, ?vacated, "disconnect cleanup");
            effects.push(Effect::Publish {
                topic: game_topic(game),
                payload: Event::LeftGame.encode(None),
            });
        }
        state.membership.leave_lobby(token);
        effects
    }

    /// Current stats snapshot (also served on `getStats`).
    #[must_use]
    pub fn stats(&self) -> StatsReply {
        self.state.lock().stats(None)
    }

    /// Membership lookup for diagnostics and tests.
    #[must_use]
    pub fn membership_of(&self, token: &str) -> Membership {
        self.state.lock().membership.membership_of(token)
    }

    /// Session snapshot for diagnostics and tests.
    #[must_use]
    pub fn session(&self, game: GameId) -> Option<GameSession> {
        self.state.lock().sessions.get(game).cloned()
    }
}
