//! Per-socket connection state: outbound queue and topic subscriptions.
//!
//! Tokens may collide (they are caller-supplied and unauthenticated),
//! so each socket also carries a unique connection id assigned at
//! upgrade time; the hub keys on that id.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::registry::Token;

/// One live WebSocket client as the hub sees it.
#[derive(Debug)]
pub struct ClientConnection {
    /// Unique per-socket id (uuid v7 at upgrade time).
    pub id: String,
    /// Caller-supplied identity.
    pub token: Token,
    sender: mpsc::Sender<Arc<String>>,
    topics: RwLock<HashSet<String>>,
    drops: AtomicU64,
}

impl ClientConnection {
    /// Create a connection around its outbound queue.
    #[must_use]
    pub fn new(id: String, token: Token, sender: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            token,
            sender,
            topics: RwLock::new(HashSet::new()),
            drops: AtomicU64::new(0),
        }
    }

    /// Subscribe to a topic. Idempotent.
    pub fn subscribe(&self, topic: impl Into<String>) {
        let _ = self.topics.write().insert(topic.into());
    }

    /// Whether this connection is subscribed to the topic.
    #[must_use]
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.read().contains(topic)
    }

    /// Queue a payload for the write task. Returns `false` when the
    /// queue is full (the payload is dropped and counted).
    pub fn send(&self, payload: Arc<String>) -> bool {
        match self.sender.try_send(payload) {
            Ok(()) => true,
            Err(_) => {
                let _ = self.drops.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Total lifetime payload drops for this connection.
    #[must_use]
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }
}
