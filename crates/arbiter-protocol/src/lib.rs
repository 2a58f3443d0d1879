//! # arbiter-protocol
//!
//! Wire vocabulary for the arbiter chess relay.
//!
//! Every message on the wire is a JSON envelope
//! `{ "type": <string>, "params": [<positional args>], "id"?: <value> }`.
//! This crate provides:
//!
//! - **Board vocabulary**: [`board::Square`], [`board::ChessMove`],
//!   [`board::Side`]
//! - **Events**: [`event::Event`] as a tagged variant per wire type,
//!   plus the [`event::Envelope`] carrier and the positional-params
//!   codec between the two
//! - **Stats**: [`stats::StatsReply`] — the one reply payload that is
//!   not part of the event enumeration
//! - **Errors**: [`error::ProtocolError`] via `thiserror`; its
//!   `Display` strings are what the relay sends back in `error` events
//!
//! ## Crate Position
//!
//! Foundation crate. The relay server depends on it; it depends on
//! nothing but serde.

#![deny(unsafe_code)]

pub mod board;
pub mod error;
pub mod event;
pub mod stats;

pub use board::{ChessMove, Side, Square};
pub use error::ProtocolError;
pub use event::{Envelope, Event, GameId};
pub use stats::StatsReply;
