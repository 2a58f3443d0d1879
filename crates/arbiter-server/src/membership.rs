//! Membership table: which game, if any, each identity occupies.
//!
//! Three states per identity: no record at all (never entered the
//! lobby), a record of `None` (in the lobby), or a record of
//! `Some(game)` (seated in a game). Game id 0 is a valid id — absence
//! is always the `Option`, never a sentinel.

use std::collections::HashMap;

use arbiter_protocol::GameId;

use crate::registry::Token;

/// Result of a membership lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    /// No record: the identity never entered the lobby or a game.
    Unknown,
    /// Connected, not bound to a game.
    Lobby,
    /// Bound to this game.
    Game(GameId),
}

/// Identity → current game binding.
#[derive(Debug, Default)]
pub struct MembershipTable {
    records: HashMap<Token, Option<GameId>>,
}

impl MembershipTable {
    /// Set membership to lobby (`None`). Idempotent; overwrites a game
    /// binding.
    pub fn enter_lobby(&mut self, token: Token) {
        let _ = self.records.insert(token, None);
    }

    /// Remove the record entirely. Distinct from leaving a game.
    pub fn leave_lobby(&mut self, token: &str) {
        let _ = self.records.remove(token);
    }

    /// Bind to a game, unconditionally overwriting any prior value.
    pub fn bind(&mut self, token: Token, game: GameId) {
        let _ = self.records.insert(token, Some(game));
    }

    /// Set membership back to lobby. No-op when no record exists.
    pub fn unbind(&mut self, token: &str) {
        if let Some(record) = self.records.get_mut(token) {
            *record = None;
        }
    }

    /// Look up the identity's current state.
    #[must_use]
    pub fn membership_of(&self, token: &str) -> Membership {
        match self.records.get(token) {
            None => Membership::Unknown,
            Some(None) => Membership::Lobby,
            Some(Some(game)) => Membership::Game(*game),
        }
    }

    /// Number of records currently bound to a game.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.records.values().filter(|r| r.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_until_first_contact() {
        let table = MembershipTable::default();
        assert_eq!(table.membership_of("alice"), Membership::Unknown);
    }

    #[test]
    fn enter_lobby_then_bind_then_unbind() {
        let mut table = MembershipTable::default();
        table.enter_lobby("alice".into());
        assert_eq!(table.membership_of("alice"), Membership::Lobby);

        table.bind("alice".into(), 7);
        assert_eq!(table.membership_of("alice"), Membership::Game(7));

        table.unbind("alice");
        assert_eq!(table.membership_of("alice"), Membership::Lobby);
    }

    #[test]
    fn bind_without_lobby_entry_creates_the_record() {
        let mut table = MembershipTable::default();
        table.bind("alice".into(), 3);
        assert_eq!(table.membership_of("alice"), Membership::Game(3));
    }

    #[test]
    fn bind_overwrites_prior_game() {
        let mut table = MembershipTable::default();
        table.bind("alice".into(), 3);
        table.bind("alice".into(), 9);
        assert_eq!(table.membership_of("alice"), Membership::Game(9));
    }

    #[test]
    fn game_zero_is_distinct_from_lobby() {
        let mut table = MembershipTable::default();
        table.bind("alice".into(), 0);
        assert_eq!(table.membership_of("alice"), Membership::Game(0));
        assert_ne!(table.membership_of("alice"), Membership::Lobby);
    }

    #[test]
    fn leave_lobby_removes_the_record() {
        let mut table = MembershipTable::default();
        table.enter_lobby("alice".into());
        table.leave_lobby("alice");
        assert_eq!(table.membership_of("alice"), Membership::Unknown);
    }

    #[test]
    fn unbind_without_record_is_a_noop() {
        let mut table = MembershipTable::default();
        table.unbind("alice");
        assert_eq!(table.membership_of("alice"), Membership::Unknown);
    }

    #[test]
    fn bound_count_tracks_game_bindings_only() {
        let mut table = MembershipTable::default();
        table.enter_lobby("alice".into());
        table.bind("bob".into(), 1);
        table.bind("carol".into(), 2);
        assert_eq!(table.bound_count(), 2);

        table.unbind("bob");
        assert_eq!(table.bound_count(), 1);
    }
}
