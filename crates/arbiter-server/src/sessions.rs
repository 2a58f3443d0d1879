//! Session table: per-game seats, turn state, and move history.
//!
//! A session exists only while at least one seat is occupied: it is
//! created lazily on the first join and deleted the moment the last
//! seat empties. The turn flips exactly once per accepted move,
//! independent of which seat sent it — the relay never checks that the
//! mover matches the turn.

use std::collections::HashMap;

use arbiter_protocol::{ChessMove, GameId, Side};

use crate::registry::Token;

/// One game's shared record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    /// Identity seated as white, if any.
    pub white: Option<Token>,
    /// Identity seated as black, if any.
    pub black: Option<Token>,
    /// Side to move next. White moves first.
    pub turn: Side,
    /// Append-only move log; never replayed or validated here.
    pub history: Vec<ChessMove>,
}

impl GameSession {
    fn new() -> Self {
        Self {
            white: None,
            black: None,
            turn: Side::White,
            history: Vec::new(),
        }
    }

    fn seat_mut(&mut self, side: Side) -> &mut Option<Token> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    /// The identity on the given side, if any.
    #[must_use]
    pub fn seat(&self, side: Side) -> Option<&Token> {
        match side {
            Side::White => self.white.as_ref(),
            Side::Black => self.black.as_ref(),
        }
    }

    fn is_vacant(&self) -> bool {
        self.white.is_none() && self.black.is_none()
    }
}

/// Outcome of [`SessionTable::vacate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vacated {
    /// Both seats emptied; the session was deleted.
    Deleted,
    /// The other seat is still occupied; the session remains.
    StillActive,
    /// No session exists for that game id.
    Absent,
}

/// Game id → session.
#[derive(Debug, Default)]
pub struct SessionTable {
    games: HashMap<GameId, GameSession>,
}

impl SessionTable {
    /// Seat `token` on `side` of `game`, creating the session if
    /// needed, and return the identity currently on the other side.
    ///
    /// Joining always overwrites the seat (last writer wins).
    pub fn join(&mut self, game: GameId, side: Side, token: Token) -> Option<Token> {
        let session = self.games.entry(game).or_insert_with(GameSession::new);
        *session.seat_mut(side) = Some(token);
        session.seat(side.opponent()).cloned()
    }

    /// Append a move and flip the turn. Returns `false` when no
    /// session exists — the caller drops the update.
    pub fn record_move(&mut self, game: GameId, mv: ChessMove) -> bool {
        match self.games.get_mut(&game) {
            Some(session) => {
                session.history.push(mv);
                session.turn = session.turn.opponent();
                true
            }
            None => false,
        }
    }

    /// Clear every seat occupied by `token` (both, when a duplicate
    /// token holds both) and delete the session once empty.
    pub fn vacate(&mut self, game: GameId, token: &str) -> Vacated {
        let Some(session) = self.games.get_mut(&game) else {
            return Vacated::Absent;
        };
        if session.white.as_deref() == Some(token) {
            session.white = None;
        }
        if session.black.as_deref() == Some(token) {
            session.black = None;
        }
        if session.is_vacant() {
            let _ = self.games.remove(&game);
            Vacated::Deleted
        } else {
            Vacated::StillActive
        }
    }

    /// Read-only lookup.
    #[must_use]
    pub fn get(&self, game: GameId) -> Option<&GameSession> {
        self.games.get(&game)
    }

    /// Number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no session is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
