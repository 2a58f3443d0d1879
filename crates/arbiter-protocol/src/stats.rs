//! The `getStats` reply payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply to a `getStats` request.
///
/// Deliberately *not* part of the [`crate::Event`] enumeration: it is a
/// bare object, not a `type`/`params` envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReply {
    /// Total connected identities (duplicates counted).
    pub players: u64,
    /// Active game sessions.
    pub games_in_progress: u64,
    /// Connected identities not bound to any game.
    pub players_available: u64,
    /// Correlation id echoed from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl StatsReply {
    /// Serialize to the wire string.
    #[must_use]
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("stats serialization is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let reply = StatsReply {
            players: 3,
            games_in_progress: 1,
            players_available: 2,
            id: None,
        };
        let parsed: Value = serde_json::from_str(&reply.to_wire()).unwrap();
        assert_eq!(
            parsed,
            json!({"players": 3, "games_in_progress": 1, "players_available": 2})
        );
    }

    #[test]
    fn id_echoed_when_present() {
        let reply = StatsReply {
            players: 0,
            games_in_progress: 0,
            players_available: 0,
            id: Some(json!("req-9")),
        };
        let parsed: Value = serde_json::from_str(&reply.to_wire()).unwrap();
        assert_eq!(parsed["id"], "req-9");
    }
}
