//! End-to-end relay scenarios: engine dispatch wired through the topic
//! hub, observed from real subscriber queues.

use std::sync::Arc;

use arbiter_protocol::Side;
use arbiter_server::connection::ClientConnection;
use arbiter_server::engine::{Effect, RelayEngine};
use arbiter_server::hub::TopicHub;
use arbiter_server::membership::Membership;
use tokio::sync::mpsc;

/// A simulated client: engine identity + hub connection + its inbox.
struct Client {
    token: &'static str,
    conn: Arc<ClientConnection>,
    inbox: mpsc::Receiver<Arc<String>>,
}

impl Client {
    async fn connect(engine: &RelayEngine, hub: &TopicHub, token: &'static str) -> Self {
        let (tx, inbox) = mpsc::channel(32);
        let conn = Arc::new(ClientConnection::new(
            format!("conn-{token}"),
            token.into(),
            tx,
        ));
        conn.subscribe(token);
        hub.add(Arc::clone(&conn)).await;
        engine.on_connect(token);
        Self { token, conn, inbox }
    }

    /// Send a payload, applying effects the way the transport does.
    async fn send(&self, engine: &RelayEngine, hub: &TopicHub, payload: &str) {
        let effects = engine.on_message(self.token, payload);
        apply(hub, &self.conn, effects).await;
    }

    async fn disconnect(self, engine: &RelayEngine, hub: &TopicHub) {
        hub.remove(&self.conn.id).await;
        let effects = engine.on_disconnect(self.token);
        apply(hub, &self.conn, effects).await;
    }

    fn recv(&mut self) -> Option<serde_json::Value> {
        self.inbox
            .try_recv()
            .ok()
            .map(|p| serde_json::from_str(&p).unwrap())
    }
}

async fn apply(hub: &TopicHub, conn: &Arc<ClientConnection>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Reply(payload) => {
                let _ = conn.send(Arc::new(payload));
            }
            Effect::Subscribe(topic) => conn.subscribe(topic),
            Effect::Publish { topic, payload } => {
                hub.publish_from(&conn.id, &topic, payload).await;
            }
        }
    }
}

#[tokio::test]
async fn full_game_flow_with_abrupt_disconnect() {
    let engine = RelayEngine::new();
    let hub = TopicHub::new();

    // A joins the lobby, then game 7 as white.
    let mut a = Client::connect(&engine, &hub, "alice").await;
    a.send(&engine, &hub, r#"{"type":"joinedLobby","params":[]}"#)
        .await;
    a.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[7,"white"]}"#,
    )
    .await;

    // B joins game 7 as black; A observes the join echo.
    let mut b = Client::connect(&engine, &hub, "bob").await;
    b.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[7,"black"]}"#,
    )
    .await;

    let seen = a.recv().expect("A should see B's join");
    assert_eq!(seen["type"], "joinedGame");
    assert_eq!(seen["params"][1], "black");
    // the echo never loops back to its sender
    assert!(b.recv().is_none());

    let session = engine.session(7).unwrap();
    assert_eq!(session.white.as_deref(), Some("alice"));
    assert_eq!(session.black.as_deref(), Some("bob"));
    assert_eq!(session.turn, Side::White);

    // A moves e2e4: B observes it, history and turn update.
    a.send(
        &engine,
        &hub,
        r#"{"type":"madeMove","params":[["e2","e4"]]}"#,
    )
    .await;
    let seen = b.recv().expect("B should see A's move");
    assert_eq!(seen["type"], "madeMove");
    assert_eq!(seen["params"][0][0], "e2");
    assert_eq!(seen["params"][0][1], "e4");

    let session = engine.session(7).unwrap();
    assert_eq!(session.history.len(), 1);
    assert_eq!(session.turn, Side::Black);

    // B vanishes: A gets exactly one synthesized leftGame, the session
    // survives on A's seat, B's membership record is gone.
    b.disconnect(&engine, &hub).await;
    let seen = a.recv().expect("A should see the synthesized leave");
    assert_eq!(seen["type"], "leftGame");
    assert!(a.recv().is_none(), "exactly one publish");

    let session = engine.session(7).unwrap();
    assert_eq!(session.white.as_deref(), Some("alice"));
    assert!(session.black.is_none());
    assert_eq!(engine.membership_of("bob"), Membership::Unknown);
}

#[tokio::test]
async fn stats_scenario_three_players_one_game() {
    let engine = RelayEngine::new();
    let hub = TopicHub::new();

    let mut a = Client::connect(&engine, &hub, "alice").await;
    let _b = Client::connect(&engine, &hub, "bob").await;
    let _c = Client::connect(&engine, &hub, "carol").await;
    a.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[7,"white"]}"#,
    )
    .await;

    a.send(&engine, &hub, r#"{"type":"getStats","params":[]}"#)
        .await;
    let reply = a.recv().expect("stats reply is direct");
    assert_eq!(reply["players"], 3);
    assert_eq!(reply["games_in_progress"], 1);
    assert_eq!(reply["players_available"], 2);
}

#[tokio::test]
async fn malformed_payload_reaches_only_the_sender() {
    let engine = RelayEngine::new();
    let hub = TopicHub::new();

    let mut a = Client::connect(&engine, &hub, "alice").await;
    let mut b = Client::connect(&engine, &hub, "bob").await;
    a.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[7,"white"]}"#,
    )
    .await;
    b.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[7,"black"]}"#,
    )
    .await;
    let _ = a.recv();

    b.send(&engine, &hub, "this is not json").await;
    let reply = b.recv().expect("sender gets the error");
    assert_eq!(reply["type"], "error");
    assert!(a.recv().is_none(), "opponent must not see the error");
}

#[tokio::test]
async fn resignation_frees_the_seat_for_a_rematch() {
    let engine = RelayEngine::new();
    let hub = TopicHub::new();

    let mut a = Client::connect(&engine, &hub, "alice").await;
    let mut b = Client::connect(&engine, &hub, "bob").await;
    a.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[3,"white"]}"#,
    )
    .await;
    b.send(
        &engine,
        &hub,
        r#"{"type":"joinedGame","params":[3,"black"]}"#,
    )
    .await;
    let _ = a.recv();

    a.send(&engine, &hub, r#"{"type":"requestDraw","params":[3]}"#)
        .await;
    let seen = b.recv().expect("B observes the draw request");
    assert_eq!(seen["type"], "requestDraw");

    // A's seat is free and A is back in the lobby.
    assert_eq!(engine.membership_of("alice"), Membership::Lobby);
    assert!(engine.session(3).unwrap().white.is_none());

    // B resigning too deletes the session entirely.
    b.send(&engine, &hub, r#"{"type":"requestDraw","params":[3]}"#)
        .await;
    assert!(engine.session(3).is_none());
}
