//! Axum transport: WebSocket upgrade, per-connection read/write tasks,
//! and the HTTP router (`/ws`, `/healthz`, `/metrics`).
//!
//! Connection establishment requires an opaque `token` query
//! parameter; requests without one are rejected before the upgrade.
//! The transport owns nothing but byte movement — every decision about
//! what to send where comes back from the engine as [`Effect`]s.

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::connection::ClientConnection;
use crate::engine::{Effect, RelayEngine};
use crate::hub::TopicHub;
use crate::metrics::{
    GAMES_ACTIVE, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

/// Shared handles behind the router.
#[derive(Clone)]
pub struct AppState {
    /// The dispatch engine.
    pub engine: Arc<RelayEngine>,
    /// The fan-out hub.
    pub hub: Arc<TopicHub>,
    /// Rendered by `/metrics`.
    pub metrics: PrometheusHandle,
    /// Per-connection outbound queue depth.
    pub outbound_queue: usize,
}

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing token query parameter").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, token, state))
}

async fn handle_socket(socket: WebSocket, token: String, state: AppState) {
    let conn_id = Uuid::now_v7().to_string();
    let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::channel(state.outbound_queue);
    let conn = Arc::new(ClientConnection::new(
        conn_id.clone(),
        token.clone(),
        outbound_tx,
    ));
    // Direct addressing: every connection listens on its own token topic.
    conn.subscribe(token.clone());
    state.hub.add(Arc::clone(&conn)).await;
    state.engine.on_connect(&token);
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    info!(token, conn_id, "client connected");

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if sink
                .send(Message::Text((*payload).clone().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let effects = state.engine.on_message(&token, text.as_str());
                apply_effects(&state, &conn, effects).await;
            }
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part
            // of the protocol.
            _ => {}
        }
    }

    // Server-initiated cleanup: the engine synthesizes the leave-game
    // publish for whatever game this identity occupied.
    state.hub.remove(&conn_id).await;
    let effects = state.engine.on_disconnect(&token);
    apply_effects(&state, &conn, effects).await;
    writer.abort();
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    info!(token, conn_id, "client disconnected");
}

/// Execute dispatch effects: direct replies on the sender's own queue,
/// publishes through the hub with the sender excluded.
async fn apply_effects(state: &AppState, conn: &Arc<ClientConnection>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Reply(payload) => {
                if !conn.send(Arc::new(payload)) {
                    debug!(conn_id = %conn.id, "reply dropped (queue full)");
                }
            }
            Effect::Subscribe(topic) => conn.subscribe(topic),
            Effect::Publish { topic, payload } => {
                state.hub.publish_from(&conn.id, &topic, payload).await;
            }
        }
    }
    gauge!(GAMES_ACTIVE).set(state.engine.stats().games_in_progress as f64);
}
