//! Topic fan-out to connected WebSocket clients.
//!
//! Topics are opaque strings: one per token (direct addressing) and
//! one per active game id (session broadcast). Delivery is
//! fire-and-forget — a full outbound queue drops the payload for that
//! client only, and a client that keeps dropping is forcibly removed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::connection::ClientConnection;
use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

/// Maximum total lifetime payload drops before forcibly removing a
/// slow client.
pub const MAX_TOTAL_DROPS: u64 = 100;

/// Manages topic subscriptions and payload fan-out.
pub struct TopicHub {
    /// Connected clients indexed by connection id.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
    /// Atomic counter tracking total connections (avoids read-locking
    /// for count queries).
    active_count: AtomicUsize,
}

impl TopicHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Add a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection by id.
    pub async fn remove(&self, connection_id: &str) {
        let mut conns = self.connections.write().await;
        if conns.remove(connection_id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Subscribe a connection to a topic. No-op for unknown ids.
    pub async fn subscribe(&self, connection_id: &str, topic: &str) {
        let conns = self.connections.read().await;
        if let Some(conn) = conns.get(connection_id) {
            conn.subscribe(topic);
        }
    }

    /// Publish to every subscriber of `topic`.
    pub async fn publish(&self, topic: &str, payload: String) {
        self.publish_filtered(|c| c.is_subscribed(topic), payload, topic)
            .await;
    }

    /// Publish to every subscriber of `topic` except the originating
    /// connection — the echo pattern for in-game events.
    pub async fn publish_from(&self, origin_id: &str, topic: &str, payload: String) {
        self.publish_filtered(
            |c| c.id != origin_id && c.is_subscribed(topic),
            payload,
            topic,
        )
        .await;
    }

    /// Fan out to matching clients, removing those past the drop
    /// threshold.
    async fn publish_filtered(
        &self,
        filter: impl Fn(&ClientConnection) -> bool,
        payload: String,
        topic: &str,
    ) {
        let payload = Arc::new(payload);
        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read().await;
            let mut recipients = 0u32;
            for conn in conns.values() {
                if filter(conn) {
                    recipients += 1;
                    if !conn.send(Arc::clone(&payload)) {
                        counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                        let drops = conn.drop_count();
                        if drops >= MAX_TOTAL_DROPS {
                            warn!(conn_id = %conn.id, topic, drops, "disconnecting slow client");
                            to_remove.push(conn.id.clone());
                        } else {
                            warn!(conn_id = %conn.id, topic, total_drops = drops, "payload dropped (queue full)");
                        }
                    }
                }
            }
            debug!(topic, recipients, "published");
        }
        if !to_remove.is_empty() {
            let mut conns = self.connections.write().await;
            for id in &to_remove {
                if conns.remove(id).is_some() {
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of active connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

impl Default for TopicHub {
    fn default() -> Self {
        Self::new()
    }
}
