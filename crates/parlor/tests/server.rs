//! Integration tests for the full server: real WebSockets, real JSON
//! frames, from connect to room cleanup.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::prelude::*;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(GuestDirectory::new())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut Ws, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send should succeed");
}

async fn recv(ws: &mut Ws) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for an event")
        .expect("stream ended unexpectedly")
        .expect("frame error");
    serde_json::from_slice(&msg.into_data())
        .expect("server should send valid JSON")
}

/// Announces an identity and drains the ack.
async fn announce(ws: &mut Ws, id: &str, username: &str) {
    send(
        ws,
        json!({
            "type": "announce-identity",
            "id": id,
            "username": username,
            "avatar": format!("https://example.test/{username}.svg"),
        }),
    )
    .await;
    let ack = recv(ws).await;
    assert_eq!(ack["type"], "identity-ack", "got {ack}");
    assert_eq!(ack["id"], id);
}

/// Creates a room and returns its code.
async fn create_room(ws: &mut Ws) -> String {
    send(ws, json!({ "type": "create-room" })).await;
    let created = recv(ws).await;
    assert_eq!(created["type"], "room-created", "got {created}");
    created["roomCode"]
        .as_str()
        .expect("room code should be a string")
        .to_string()
}

/// Joins a room and drains the joiner's sync burst:
/// room-joined, roster-update, game-state, chat-history.
/// Returns (roster_update, chat_history).
async fn join_room(ws: &mut Ws, code: &str) -> (Value, Value) {
    send(ws, json!({ "type": "join-room", "roomCode": code })).await;

    let joined = recv(ws).await;
    assert_eq!(joined["type"], "room-joined", "got {joined}");
    // The server always replies with the canonical uppercase code.
    assert_eq!(joined["roomCode"], code.to_uppercase());

    let roster = recv(ws).await;
    assert_eq!(roster["type"], "roster-update", "got {roster}");

    let state = recv(ws).await;
    assert_eq!(state["type"], "game-state", "got {state}");

    let history = recv(ws).await;
    assert_eq!(history["type"], "chat-history", "got {history}");

    (roster, history)
}

async fn send_move(ws: &mut Ws, code: &str, index: usize) {
    send(
        ws,
        json!({ "type": "move", "roomCode": code, "index": index }),
    )
    .await;
}

/// Setup: ana creates a room and joins, bob joins; both streams are
/// drained. Returns (ana, bob, code).
async fn two_player_game(addr: &str) -> (Ws, Ws, String) {
    let mut ana = connect(addr).await;
    let mut bob = connect(addr).await;

    announce(&mut ana, "u-ana", "ana").await;
    announce(&mut bob, "u-bob", "bob").await;

    let code = create_room(&mut ana).await;
    join_room(&mut ana, &code).await;
    join_room(&mut bob, &code).await;

    // ana hears bob arrive: join notice, then the updated roster.
    let notice = recv(&mut ana).await;
    assert_eq!(notice["type"], "chat-message", "got {notice}");
    assert_eq!(notice["text"], "bob joined the room.");
    let roster = recv(&mut ana).await;
    assert_eq!(roster["type"], "roster-update", "got {roster}");

    (ana, bob, code)
}

// =========================================================================
// Connection and identity
// =========================================================================

#[tokio::test]
async fn test_guest_announce_mints_identity() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        json!({ "type": "announce-identity", "username": "wanderer" }),
    )
    .await;

    let ack = recv(&mut ws).await;
    assert_eq!(ack["type"], "identity-ack");
    assert_eq!(ack["username"], "wanderer");
    assert!(ack["id"]
        .as_str()
        .expect("id should be a string")
        .starts_with("guest-"));
    assert!(ack["avatar"]
        .as_str()
        .expect("avatar should be a string")
        .contains("seed=wanderer"));
}

#[tokio::test]
async fn test_room_action_without_identity_returns_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({ "type": "create-room" })).await;

    let error = recv(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "User not authenticated");
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    // Garbage must neither kill the connection nor produce an error
    // event; the next well-formed event works normally.
    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"no-such-event"}"#.into()))
        .await
        .unwrap();

    announce(&mut ws, "u-1", "ana").await;
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_create_and_join_flow() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    announce(&mut ws, "u-ana", "ana").await;

    let code = create_room(&mut ws).await;
    assert_eq!(code.len(), 6);
    assert!(code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let (roster, history) = join_room(&mut ws, &code).await;

    let players = roster["players"]
        .as_array()
        .expect("players should be an array");
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["id"], "u-ana");
    assert_eq!(players[0]["mark"], "X");
    assert_eq!(roster["state"], "waiting");

    // The creator's own join notice arrives in history, not live.
    let messages = history["messages"]
        .as_array()
        .expect("messages should be an array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["system"], true);
    assert_eq!(messages[0]["text"], "ana joined the room.");
}

#[tokio::test]
async fn test_join_unknown_room_returns_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    announce(&mut ws, "u-ana", "ana").await;

    send(
        &mut ws,
        json!({ "type": "join-room", "roomCode": "NOSUCH" }),
    )
    .await;

    let error = recv(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Room not found");
}

#[tokio::test]
async fn test_join_is_case_insensitive() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    announce(&mut ana, "u-ana", "ana").await;
    let code = create_room(&mut ana).await;
    join_room(&mut ana, &code).await;

    let mut bob = connect(&addr).await;
    announce(&mut bob, "u-bob", "bob").await;
    join_room(&mut bob, &code.to_lowercase()).await;
}

#[tokio::test]
async fn test_second_joiner_completes_the_roster() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    announce(&mut ana, "u-ana", "ana").await;
    let code = create_room(&mut ana).await;
    join_room(&mut ana, &code).await;

    let mut bob = connect(&addr).await;
    announce(&mut bob, "u-bob", "bob").await;
    let (roster, history) = join_room(&mut bob, &code).await;

    let players = roster["players"].as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["username"], "ana");
    assert_eq!(players[0]["mark"], "X");
    assert_eq!(players[1]["username"], "bob");
    assert_eq!(players[1]["mark"], "O");
    assert_eq!(roster["state"], "playing");

    // bob's history carries both join notices.
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejoin_does_not_duplicate_player() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    announce(&mut ana, "u-ana", "ana").await;
    let code = create_room(&mut ana).await;
    join_room(&mut ana, &code).await;

    // Same identity arrives on a fresh connection.
    let mut again = connect(&addr).await;
    announce(&mut again, "u-ana", "ana").await;
    let (roster, history) = join_room(&mut again, &code).await;

    let players = roster["players"].as_array().unwrap();
    assert_eq!(players.len(), 1, "rejoin must not duplicate the entry");
    // No second join notice either.
    assert_eq!(history["messages"].as_array().unwrap().len(), 1);
}

// =========================================================================
// The game
// =========================================================================

#[tokio::test]
async fn test_full_game_to_a_win() {
    let addr = start_server().await;
    let (mut ana, mut bob, code) = two_player_game(&addr).await;

    // ana (X) opens at 0.
    send_move(&mut ana, &code, 0).await;
    for ws in [&mut ana, &mut bob] {
        let state = recv(ws).await;
        assert_eq!(state["type"], "game-state");
        assert_eq!(state["board"][0], "X");
        assert_eq!(state["turn"], "O");
        assert!(state["winner"].is_null());
    }

    // bob (O) tries the occupied cell (a silent no-op), then plays 4.
    send_move(&mut bob, &code, 0).await;
    send_move(&mut bob, &code, 4).await;
    for ws in [&mut ana, &mut bob] {
        let state = recv(ws).await;
        assert_eq!(state["board"][0], "X", "cell 0 must be unchanged");
        assert_eq!(state["board"][4], "O");
        assert_eq!(state["turn"], "X");
    }

    // ana: 1, bob: 5, ana: 2; the top row completes.
    send_move(&mut ana, &code, 1).await;
    for ws in [&mut ana, &mut bob] {
        recv(ws).await;
    }
    send_move(&mut bob, &code, 5).await;
    for ws in [&mut ana, &mut bob] {
        recv(ws).await;
    }
    send_move(&mut ana, &code, 2).await;
    for ws in [&mut ana, &mut bob] {
        let state = recv(ws).await;
        assert_eq!(state["winner"], "X");
        // Terminal move: the turn is left untouched.
        assert_eq!(state["turn"], "X");
    }

    // The game is decided, so both sides' moves are now no-ops. The chat
    // line arriving next proves no further game-state was broadcast.
    send_move(&mut bob, &code, 8).await;
    send_move(&mut ana, &code, 8).await;
    send(&mut ana, json!({ "type": "send-chat", "text": "gg" })).await;
    for ws in [&mut ana, &mut bob] {
        let event = recv(ws).await;
        assert_eq!(event["type"], "chat-message", "got {event}");
        assert_eq!(event["text"], "gg");
    }
}

#[tokio::test]
async fn test_wrong_turn_is_ignored() {
    let addr = start_server().await;
    let (mut ana, mut bob, code) = two_player_game(&addr).await;

    // bob (O) tries to open: silently dropped, no error event.
    send_move(&mut bob, &code, 0).await;

    // ana (X) opens; the first event anyone sees is her move landing.
    send_move(&mut ana, &code, 0).await;
    for ws in [&mut ana, &mut bob] {
        let state = recv(ws).await;
        assert_eq!(state["type"], "game-state");
        assert_eq!(state["board"][0], "X");
    }
}

#[tokio::test]
async fn test_reset_starts_a_fresh_game() {
    let addr = start_server().await;
    let (mut ana, mut bob, code) = two_player_game(&addr).await;

    send_move(&mut ana, &code, 0).await;
    recv(&mut ana).await;
    recv(&mut bob).await;

    send(
        &mut ana,
        json!({ "type": "reset-game", "roomCode": code }),
    )
    .await;
    for ws in [&mut ana, &mut bob] {
        let state = recv(ws).await;
        assert_eq!(state["type"], "game-state");
        assert!(state["board"]
            .as_array()
            .unwrap()
            .iter()
            .all(Value::is_null));
        assert_eq!(state["turn"], "X");
        assert!(state["winner"].is_null());
    }
}

// =========================================================================
// Voice signaling
// =========================================================================

#[tokio::test]
async fn test_voice_signal_relays_to_target_only() {
    let addr = start_server().await;
    let (mut ana, mut bob, code) = two_player_game(&addr).await;

    // ana learns bob's connection id from the roster broadcast; ask
    // for it again via a rejoin of her own (roster comes back around).
    let (roster, _) = join_room(&mut ana, &code).await;
    let bob_conn = roster["players"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["username"] == "bob")
        .expect("bob should be in the roster")["connectionId"]
        .as_str()
        .expect("connection id should be a string")
        .to_string();
    // bob sees the same roster broadcast.
    let echoed = recv(&mut bob).await;
    assert_eq!(echoed["type"], "roster-update");

    let blob = json!({ "sdp": "v=0", "candidates": [{ "port": 9 }] });
    send(
        &mut ana,
        json!({
            "type": "voice-signal",
            "targetConnectionId": bob_conn,
            "signal": blob,
        }),
    )
    .await;

    let relayed = recv(&mut bob).await;
    assert_eq!(relayed["type"], "voice-signal");
    assert_eq!(relayed["fromUserId"], "u-ana");
    assert_eq!(relayed["signal"], blob);
    assert!(relayed["fromConnectionId"].as_str().is_some());
}

// =========================================================================
// Leaving and disconnects
// =========================================================================

#[tokio::test]
async fn test_leave_room_notifies_the_rest() {
    let addr = start_server().await;
    let (mut ana, mut bob, _code) = two_player_game(&addr).await;

    send(&mut bob, json!({ "type": "leave-room" })).await;

    let roster = recv(&mut ana).await;
    assert_eq!(roster["type"], "roster-update");
    let players = roster["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["username"], "ana");
    assert_eq!(roster["state"], "waiting");

    let notice = recv(&mut ana).await;
    assert_eq!(notice["type"], "chat-message");
    assert_eq!(notice["text"], "bob left the room.");
    assert_eq!(notice["system"], true);
}

#[tokio::test]
async fn test_disconnect_cleans_up_and_deletes_empty_room() {
    let addr = start_server().await;
    let (mut ana, mut bob, code) = two_player_game(&addr).await;

    // bob's socket dies.
    bob.close(None).await.expect("close should succeed");

    let roster = recv(&mut ana).await;
    assert_eq!(roster["type"], "roster-update");
    assert_eq!(roster["players"].as_array().unwrap().len(), 1);
    let notice = recv(&mut ana).await;
    assert_eq!(notice["text"], "bob left the room.");

    // The room survives while ana remains, dies when she goes.
    ana.close(None).await.expect("close should succeed");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut cyn = connect(&addr).await;
    announce(&mut cyn, "u-cyn", "cyn").await;
    send(
        &mut cyn,
        json!({ "type": "join-room", "roomCode": code }),
    )
    .await;
    let error = recv(&mut cyn).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Room not found");
}

#[tokio::test]
async fn test_explicit_disconnect_event_closes_the_connection() {
    let addr = start_server().await;
    let (mut ana, mut bob, _code) = two_player_game(&addr).await;

    send(&mut bob, json!({ "type": "disconnect" })).await;

    // ana sees the departure either way.
    let roster = recv(&mut ana).await;
    assert_eq!(roster["type"], "roster-update");
    assert_eq!(roster["players"].as_array().unwrap().len(), 1);
}
