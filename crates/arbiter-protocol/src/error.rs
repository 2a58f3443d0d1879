//! Protocol error hierarchy.
//!
//! Decode failures are recovered locally: the relay replies to the
//! offending sender with an `error` event carrying the `Display`
//! string and keeps the connection open.

use thiserror::Error;

/// Anything that can go wrong while decoding an incoming message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload was not valid JSON or not an envelope object.
    #[error("could not parse message: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope `type` is not part of the enumeration.
    #[error("unknown message type `{0}`")]
    UnknownType(String),

    /// Wrong number of positional params for the given type.
    #[error("`{kind}` expects {want} param(s), got {got}")]
    ParamCount {
        /// Wire type string.
        kind: &'static str,
        /// Expected arity.
        want: usize,
        /// Received arity.
        got: usize,
    },

    /// A positional param had the wrong shape.
    #[error("`{kind}` param {index} has the wrong type")]
    InvalidParam {
        /// Wire type string.
        kind: &'static str,
        /// Zero-based param position.
        index: usize,
    },

    /// Not a board coordinate.
    #[error("invalid square `{0}`")]
    InvalidSquare(String),

    /// Not `white` or `black`.
    #[error("invalid side `{0}`")]
    InvalidSide(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings_are_human_readable() {
        let e = ProtocolError::UnknownType("frobnicate".into());
        assert_eq!(e.to_string(), "unknown message type `frobnicate`");

        let e = ProtocolError::ParamCount {
            kind: "joinedGame",
            want: 2,
            got: 1,
        };
        assert_eq!(e.to_string(), "`joinedGame` expects 2 param(s), got 1");

        let e = ProtocolError::InvalidSquare("z9".into());
        assert_eq!(e.to_string(), "invalid square `z9`");
    }

    #[test]
    fn json_errors_convert() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let e: ProtocolError = err.into();
        assert!(e.to_string().starts_with("could not parse message"));
    }
}
