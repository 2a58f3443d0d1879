//! Wire events and the envelope codec.
//!
//! Every message is one JSON envelope:
//!
//! ```json
//! { "type": "joinedGame", "params": [7, "white"], "id": 3 }
//! ```
//!
//! `params` is a fixed-length *positional* array whose shape depends on
//! `type`, and single-param types still wrap their argument in an
//! array (`"requestDraw"` carries `[7]`, `"madeMove"` carries
//! `[["e2","e4"]]`). That shape cannot fall out of serde's adjacent
//! tagging — a one-field variant would serialize its argument bare —
//! so [`Event`] maps to and from [`Envelope`] through an explicit
//! codec instead of a derive.
//!
//! The optional `id` is a request-scoped correlation value: the relay
//! echoes it on direct replies and ignores it on broadcasts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{ChessMove, Side};
use crate::error::ProtocolError;

/// Caller-assigned numeric game identifier.
///
/// Zero is a valid id; absence of a game is always modeled with
/// `Option`, never with a sentinel value.
pub type GameId = u64;

// ─────────────────────────────────────────────────────────────────────────────
// Envelope — the raw JSON carrier
// ─────────────────────────────────────────────────────────────────────────────

/// The untyped wire carrier: `type` + positional `params` + optional
/// correlation `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Wire type string.
    #[serde(rename = "type")]
    pub kind: String,
    /// Positional arguments.
    #[serde(default)]
    pub params: Vec<Value>,
    /// Correlation value, echoed on direct replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Envelope {
    /// Serialize to the wire string.
    ///
    /// Serialization of an envelope cannot fail: every field is plain
    /// JSON data.
    #[must_use]
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("envelope serialization is infallible")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event — one variant per wire type
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded wire event.
///
/// Variants mirror the wire enumeration one-to-one; parameter shapes
/// are statically distinct per variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Heartbeat request; answered directly with [`Event::Pong`].
    Ping,
    /// Heartbeat reply.
    Pong,
    /// Sender entered the lobby.
    JoinedLobby,
    /// Sender left the lobby entirely.
    LeftLobby,
    /// Sender took a seat in a game.
    JoinedGame {
        /// Game id, caller-assigned.
        game: GameId,
        /// Which seat.
        side: Side,
    },
    /// Sender left its current game.
    LeftGame,
    /// Sender offers a draw / resigns its seat.
    RequestDraw {
        /// Game id as sent by the client.
        game: GameId,
    },
    /// Turn timer started; relayed opaquely.
    TurnTimerStart {
        /// Game id as sent by the client.
        game: GameId,
    },
    /// Turn timer expired; relayed opaquely.
    TurnTimerEnd {
        /// Game id as sent by the client.
        game: GameId,
    },
    /// Sender made a move; relayed opaquely, never validated.
    MadeMove {
        /// The from/to pair.
        mv: ChessMove,
    },
    /// Error surfaced to a single client.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// Stats request; answered directly with a [`crate::StatsReply`].
    GetStats,
}

impl Event {
    /// Wire type string for this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::JoinedLobby => "joinedLobby",
            Self::LeftLobby => "leftLobby",
            Self::JoinedGame { .. } => "joinedGame",
            Self::LeftGame => "leftGame",
            Self::RequestDraw { .. } => "requestDraw",
            Self::TurnTimerStart { .. } => "turnTimerStart",
            Self::TurnTimerEnd { .. } => "turnTimerEnd",
            Self::MadeMove { .. } => "madeMove",
            Self::Error { .. } => "error",
            Self::GetStats => "getStats",
        }
    }

    /// Decode a typed event from an envelope.
    pub fn from_envelope(env: &Envelope) -> Result<Self, ProtocolError> {
        let params = &env.params;
        match env.kind.as_str() {
            "ping" => expect_arity("ping", params, 0).map(|()| Self::Ping),
            "pong" => expect_arity("pong", params, 0).map(|()| Self::Pong),
            "joinedLobby" => expect_arity("joinedLobby", params, 0).map(|()| Self::JoinedLobby),
            "leftLobby" => expect_arity("leftLobby", params, 0).map(|()| Self::LeftLobby),
            "leftGame" => expect_arity("leftGame", params, 0).map(|()| Self::LeftGame),
            "getStats" => expect_arity("getStats", params, 0).map(|()| Self::GetStats),
            "joinedGame" => {
                expect_arity("joinedGame", params, 2)?;
                let game = game_id("joinedGame", params, 0)?;
                let side: Side = params[1]
                    .as_str()
                    .ok_or(ProtocolError::InvalidParam {
                        kind: "joinedGame",
                        index: 1,
                    })?
                    .parse()?;
                Ok(Self::JoinedGame { game, side })
            }
            "requestDraw" => {
                expect_arity("requestDraw", params, 1)?;
                Ok(Self::RequestDraw {
                    game: game_id("requestDraw", params, 0)?,
                })
            }
            "turnTimerStart" => {
                expect_arity("turnTimerStart", params, 1)?;
                Ok(Self::TurnTimerStart {
                    game: game_id("turnTimerStart", params, 0)?,
                })
            }
            "turnTimerEnd" => {
                expect_arity("turnTimerEnd", params, 1)?;
                Ok(Self::TurnTimerEnd {
                    game: game_id("turnTimerEnd", params, 0)?,
                })
            }
            "madeMove" => {
                expect_arity("madeMove", params, 1)?;
                let mv: ChessMove = serde_json::from_value(params[0].clone()).map_err(|_| {
                    ProtocolError::InvalidParam {
                        kind: "madeMove",
                        index: 0,
                    }
                })?;
                Ok(Self::MadeMove { mv })
            }
            "error" => {
                expect_arity("error", params, 1)?;
                let message = params[0]
                    .as_str()
                    .ok_or(ProtocolError::InvalidParam {
                        kind: "error",
                        index: 0,
                    })?
                    .to_owned();
                Ok(Self::Error { message })
            }
            other => Err(ProtocolError::UnknownType(other.to_owned())),
        }
    }

    /// Encode to an envelope without a correlation id.
    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        let params = match self {
            Self::Ping
            | Self::Pong
            | Self::JoinedLobby
            | Self::LeftLobby
            | Self::LeftGame
            | Self::GetStats => vec![],
            Self::JoinedGame { game, side } => {
                vec![Value::from(*game), Value::from(side.as_str())]
            }
            Self::RequestDraw { game }
            | Self::TurnTimerStart { game }
            | Self::TurnTimerEnd { game } => vec![Value::from(*game)],
            Self::MadeMove { mv } => {
                vec![serde_json::to_value(mv).expect("move serialization is infallible")]
            }
            Self::Error { message } => vec![Value::from(message.clone())],
        };
        Envelope {
            kind: self.kind().to_owned(),
            params,
            id: None,
        }
    }

    /// Decode a wire string to an event plus its correlation id.
    pub fn decode(text: &str) -> Result<(Self, Option<Value>), ProtocolError> {
        let env: Envelope = serde_json::from_str(text)?;
        let event = Self::from_envelope(&env)?;
        Ok((event, env.id))
    }

    /// Encode to a wire string, echoing an optional correlation id.
    #[must_use]
    pub fn encode(&self, id: Option<Value>) -> String {
        let mut env = self.to_envelope();
        env.id = id;
        env.to_wire()
    }
}

fn expect_arity(kind: &'static str, params: &[Value], want: usize) -> Result<(), ProtocolError> {
    if params.len() == want {
        Ok(())
    } else {
        Err(ProtocolError::ParamCount {
            kind,
            want,
            got: params.len(),
        })
    }
}

fn game_id(kind: &'static str, params: &[Value], index: usize) -> Result<GameId, ProtocolError> {
    params[index]
        .as_u64()
        .ok_or(ProtocolError::InvalidParam { kind, index })
}
