mod common;

use common::{spawn_server, WebSocketTest};
use revolt_server::{
    game::{card::ActionType, TurnState},
    instance::GameStatus,
    protocol::{CreateGameResponse, ErrorCode, ServerMessage},
};
use serde_json::json;
use uuid::Uuid;

async fn expect_joined(ws: &mut WebSocketTest) -> (Uuid, Uuid, Option<Uuid>) {
    let (game_id, client_id, owner_id, _) = expect_joined_with_token(ws).await;
    (game_id, client_id, owner_id)
}

async fn expect_joined_with_token(ws: &mut WebSocketTest) -> (Uuid, Uuid, Option<Uuid>, Uuid) {
    ws.expect_message(|msg| match msg {
        ServerMessage::Joined {
            game_id,
            client_id,
            owner_id,
            rejoin_token,
        } => Some((game_id, client_id, owner_id, rejoin_token)),
        _ => None,
    })
    .await
}

async fn expect_error(ws: &mut WebSocketTest) -> ErrorCode {
    ws.expect_message(|msg| match msg {
        ServerMessage::Error { code, .. } => Some(code),
        _ => None,
    })
    .await
}

#[actix_web::test]
async fn create_join_and_play_a_turn() {
    let (addr, _state, handle) = spawn_server().await;

    let mut alice = WebSocketTest::connect(addr).await.unwrap();
    alice
        .send_json(json!({"type": "create_game", "payload": {"name": "alice"}}))
        .await;
    let (game_id, alice_id, owner) = expect_joined(&mut alice).await;
    assert_eq!(owner, Some(alice_id));
    alice.expect_state().await;

    let mut bob = WebSocketTest::connect(addr).await.unwrap();
    bob.send_json(json!({
        "type": "join_game",
        "payload": {"gameId": game_id, "name": "bob"}
    }))
    .await;
    let (joined_game, bob_id, _) = expect_joined(&mut bob).await;
    assert_eq!(joined_game, game_id);
    let view = alice.expect_state().await;
    assert_eq!(view.peers.len(), 1);
    assert_eq!(view.peers[0].name, "bob");
    bob.expect_state().await;

    alice.send_json(json!({"type": "start_game"})).await;
    let a_view = alice.expect_state().await;
    let b_view = bob.expect_state().await;
    assert_eq!(a_view.status, GameStatus::InProgress);
    assert_eq!(a_view.self_.as_ref().unwrap().cards.len(), 2);
    assert!(a_view.peers[0].cards.is_empty());
    assert!(b_view.peers[0].cards.is_empty());
    assert_eq!(b_view.leader, Some(alice_id));

    alice
        .send_json(json!({
            "type": "attempt_action",
            "payload": {"action": {"type": "income"}}
        }))
        .await;
    let view = bob.expect_state().await;
    assert_eq!(view.turn_state, TurnState::Finished);
    assert_eq!(view.peers[0].credits, 3);
    alice.expect_state().await;

    alice.send_json(json!({"type": "end_turn"})).await;
    let view = bob.expect_state().await;
    assert_eq!(view.leader, Some(bob_id));
    let own = view.self_.unwrap();
    assert!(own.allowed_actions.contains(&ActionType::Income));

    handle.stop(true).await;
}

#[actix_web::test]
async fn raw_frames_never_leak_opponent_cards() {
    let (addr, _state, handle) = spawn_server().await;

    let mut alice = WebSocketTest::connect(addr).await.unwrap();
    alice
        .send_json(json!({"type": "create_game", "payload": {"name": "alice"}}))
        .await;
    let (game_id, _, _) = expect_joined(&mut alice).await;
    alice.expect_state().await;

    let mut bob = WebSocketTest::connect(addr).await.unwrap();
    bob.send_json(json!({
        "type": "join_game",
        "payload": {"gameId": game_id, "name": "bob"}
    }))
    .await;
    expect_joined(&mut bob).await;
    bob.expect_state().await;
    alice.expect_state().await;

    alice.send_json(json!({"type": "start_game"})).await;
    let view = bob.expect_state().await;
    let raw = serde_json::to_value(&view).unwrap();
    assert_eq!(raw["peers"][0]["cards"], json!([]));
    assert_eq!(raw["self"]["cards"].as_array().unwrap().len(), 2);

    handle.stop(true).await;
}

#[actix_web::test]
async fn bad_frames_get_format_errors() {
    let (addr, _state, handle) = spawn_server().await;
    let mut ws = WebSocketTest::connect(addr).await.unwrap();

    ws.send_raw("not json").await;
    assert_eq!(expect_error(&mut ws).await, ErrorCode::InvalidMessageFormat);

    ws.send_json(json!({
        "type": "attempt_action",
        "payload": {"action": {"type": "bribe"}}
    }))
    .await;
    assert_eq!(expect_error(&mut ws).await, ErrorCode::InvalidMessageFormat);

    ws.send_json(json!({"type": "commit_turn"})).await;
    assert_eq!(expect_error(&mut ws).await, ErrorCode::SessionError);

    ws.send_json(json!({
        "type": "join_game",
        "payload": {"gameId": Uuid::new_v4(), "name": "nobody"}
    }))
    .await;
    assert_eq!(expect_error(&mut ws).await, ErrorCode::InvalidReference);

    handle.stop(true).await;
}

#[actix_web::test]
async fn reconnect_with_rejoin_token_restores_the_seat() {
    let (addr, _state, handle) = spawn_server().await;

    let mut alice = WebSocketTest::connect(addr).await.unwrap();
    alice
        .send_json(json!({"type": "create_game", "payload": {"name": "alice"}}))
        .await;
    let (game_id, _, _) = expect_joined(&mut alice).await;
    alice.expect_state().await;

    let mut bob = WebSocketTest::connect(addr).await.unwrap();
    bob.send_json(json!({
        "type": "join_game",
        "payload": {"gameId": game_id, "name": "bob"}
    }))
    .await;
    let (_, bob_id, _, bob_token) = expect_joined_with_token(&mut bob).await;
    assert_ne!(bob_token, bob_id);
    bob.expect_state().await;
    alice.expect_state().await;

    alice.send_json(json!({"type": "start_game"})).await;
    alice.expect_state().await;
    let before = bob.expect_state().await.self_.unwrap().cards;

    bob.close().await.unwrap();
    let view = alice
        .expect_message(|msg| match msg {
            ServerMessage::State(view) if !view.peers[0].connected => Some(*view),
            _ => None,
        })
        .await;
    assert_eq!(view.peers[0].id, bob_id);

    // a second socket presenting only bob's public id gets nothing
    let mut intruder = WebSocketTest::connect(addr).await.unwrap();
    intruder
        .send_json(json!({
            "type": "join_game",
            "payload": {"gameId": game_id, "name": "bob", "rejoinToken": bob_id}
        }))
        .await;
    assert_eq!(expect_error(&mut intruder).await, ErrorCode::SessionError);

    let mut bob = WebSocketTest::connect(addr).await.unwrap();
    bob.send_json(json!({
        "type": "join_game",
        "payload": {"gameId": game_id, "name": "bob", "rejoinToken": bob_token}
    }))
    .await;
    let (_, rejoined_id, _) = expect_joined(&mut bob).await;
    assert_eq!(rejoined_id, bob_id);
    let view = bob.expect_state().await;
    assert_eq!(view.self_.unwrap().cards, before);

    handle.stop(true).await;
}

#[actix_web::test]
async fn http_create_then_lookup() {
    let (addr, state, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let created: CreateGameResponse = client
        .post(format!("http://{}/create", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(state.instances.get(&created.id).is_some());

    let info: serde_json::Value = client
        .get(format!("http://{}/games/{}", addr, created.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["status"], "lobby");
    assert_eq!(info["players"], 0);
    assert_eq!(info["ownerId"], serde_json::Value::Null);

    let missing = client
        .get(format!("http://{}/games/{}", addr, Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let health = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(health, "OK");

    handle.stop(true).await;
}
