//! # arbiter-server
//!
//! The relay itself: shared state tables, the dispatch engine, the
//! topic fan-out hub, and the axum WebSocket transport.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `registry` | Live-token multiset (connection registry) |
//! | `membership` | Identity → current game binding |
//! | `sessions` | Game id → seats, turn, move history |
//! | `engine` | Decode one event, mutate tables, emit effects |
//! | `connection` | Per-socket outbound queue + subscribed topics |
//! | `hub` | Topic fan-out: publish to subscribers, drop slow clients |
//! | `ws` | Axum upgrade handler, read/write tasks, router |
//! | `settings` | Layered configuration (defaults ← file ← env) |
//! | `metrics` | Prometheus recorder + metric name constants |
//!
//! ## Data Flow
//!
//! `ws` read loop → `engine` (dispatch under one lock) → effects →
//! direct reply on the sender's queue, or `hub` publish to a topic.
//! All table mutation happens inside the engine's lock; the transport
//! only moves bytes.

#![deny(unsafe_code)]

pub mod connection;
pub mod engine;
pub mod hub;
pub mod membership;
pub mod metrics;
pub mod registry;
pub mod sessions;
pub mod settings;
pub mod ws;
