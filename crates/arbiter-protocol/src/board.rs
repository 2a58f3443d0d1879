//! Board coordinates, moves, and sides.
//!
//! The relay never interprets these beyond parsing: a [`ChessMove`] is
//! an opaque from/to pair appended to a game's history and forwarded
//! as-is. Legality checking lives with the clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProtocolError;

/// A board coordinate: file letter `a..=h` plus rank digit `1..=8`.
///
/// Stored as the two ASCII bytes so `Display` and serde round-trip the
/// original text exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// File letter, `'a'..='h'`.
    #[must_use]
    pub fn file(self) -> char {
        self.file as char
    }

    /// Rank digit, `'1'..='8'`.
    #[must_use]
    pub fn rank(self) -> char {
        self.rank as char
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        match bytes {
            [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Ok(Self {
                file: *file,
                rank: *rank,
            }),
            _ => Err(ProtocolError::InvalidSquare(s.to_owned())),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A from/to square pair. Serializes as a two-element array,
/// `["e2","e4"]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMove(pub Square, pub Square);

impl ChessMove {
    /// Origin square.
    #[must_use]
    pub fn origin(self) -> Square {
        self.0
    }

    /// Destination square.
    #[must_use]
    pub fn dest(self) -> Square {
        self.1
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Which side a seat belongs to. White is side 0 and moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Side 0.
    White,
    /// Side 1.
    Black,
}

impl Side {
    /// The other side.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Wire string, `"white"` or `"black"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl FromStr for Side {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" => Ok(Self::White),
            "black" => Ok(Self::Black),
            other => Err(ProtocolError::InvalidSide(other.to_owned())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
