//! Integration tests for the treason-lobby server
//!
//! These tests drive the lobby through its public API and through
//! connection handlers, covering:
//! - Public matchmaking and re-offering of open games
//! - Private game creation, naming and lookup
//! - Reaping of finished private games
//! - Disconnect handling
//! - The HTTP server and the lobby WebSocket started by the service

mod fixtures;

use fixtures::{create_test_client, create_test_system, invalid_player_names, valid_player_names};
use futures::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::{self, Message};
use treason_lobby::config::AppConfig;
use treason_lobby::service::AppState;
use treason_lobby::transport::{encode_server_event, ConnectionHandler};
use treason_lobby::types::{
    ClientEvent, CreateRequest, Created, GameKind, GameNotFound, JoinRequest, ServerEvent,
};
use treason_lobby::JoinOutcome;

fn create(name: &str) -> CreateRequest {
    CreateRequest {
        game_name: name.to_string(),
    }
}

#[tokio::test]
async fn test_every_valid_name_attaches_exactly_once() {
    for name in valid_player_names() {
        let system = create_test_system(4);
        let (client, sink) = create_test_client();

        let outcome = assert_ok!(system
            .lobby
            .handle_join(&client, JoinRequest::public(name.clone())));

        assert!(outcome.is_attached(), "{} was not attached", name);
        assert_eq!(system.adapters.attached_count(), 1);
        assert!(sink.get_sent_events().is_empty());
    }
}

#[tokio::test]
async fn test_invalid_names_have_no_effect() {
    let system = create_test_system(4);
    let (client, sink) = create_test_client();

    for name in invalid_player_names() {
        let outcome = assert_ok!(system
            .lobby
            .handle_join(&client, JoinRequest::public(name.clone())));
        assert!(
            matches!(outcome, JoinOutcome::Rejected(_)),
            "{:?} was not rejected",
            name
        );
    }

    assert_eq!(system.adapters.attached_count(), 0);
    assert!(system.games.created().is_empty());
    assert!(sink.get_sent_events().is_empty());
}

#[tokio::test]
async fn test_public_games_fill_before_new_ones_open() {
    let system = create_test_system(3);

    for i in 0..7 {
        let (client, _) = create_test_client();
        assert_ok!(system
            .lobby
            .handle_join(&client, JoinRequest::public(format!("player{}", i))));
    }

    let games = system.games.created();
    assert_eq!(games.len(), 3);
    assert_eq!(games[0].player_count(), 3);
    assert_eq!(games[1].player_count(), 3);
    assert_eq!(games[2].player_count(), 1);

    // Only the partially filled game is waiting for players
    assert_eq!(system.lobby.stats().unwrap().public_queue_depth, 1);
}

#[tokio::test]
async fn test_game_ending_while_queued_is_skipped() {
    let system = create_test_system(4);
    let (client, _) = create_test_client();

    assert_ok!(system
        .lobby
        .handle_join(&client, JoinRequest::public("alice")));
    system.games.created()[0].finish();

    let outcome = assert_ok!(system.lobby.handle_join(&client, JoinRequest::public("bob")));
    assert!(matches!(
        outcome,
        JoinOutcome::Attached {
            new_game: true,
            kind: GameKind::Public,
            ..
        }
    ));

    let sessions = system.adapters.attached_sessions();
    assert!(!Arc::ptr_eq(&sessions[0], &sessions[1]));
    assert_eq!(system.lobby.stats().unwrap().stale_games_discarded, 1);
}

#[tokio::test]
async fn test_private_game_flow() {
    let system = create_test_system(4);
    let (host, host_sink) = create_test_client();
    let (guest, guest_sink) = create_test_client();

    let first = assert_ok!(system.lobby.handle_create(&host, create("friends")));
    let second = assert_ok!(system.lobby.handle_create(&guest, create("friends")));
    assert_eq!(first, "friends");
    assert_eq!(second, "friendsx");

    assert_eq!(
        host_sink.get_sent_events(),
        vec![ServerEvent::Created(Created {
            game_name: "friends".to_string()
        })]
    );
    assert_eq!(
        guest_sink.get_sent_events(),
        vec![ServerEvent::Created(Created {
            game_name: "friendsx".to_string()
        })]
    );

    let games = system.games.created();
    assert_eq!(games[0].game_name.as_deref(), Some("friends"));
    assert_eq!(games[1].game_name.as_deref(), Some("friendsx"));

    assert_ok!(system
        .lobby
        .handle_join(&host, JoinRequest::private("host", "friends")));
    assert_ok!(system
        .lobby
        .handle_join(&guest, JoinRequest::private("guest", "friends")));

    assert_eq!(games[0].player_count(), 2);
    assert_eq!(games[1].player_count(), 0);
    // Private games never enter the public queue
    assert_eq!(system.lobby.stats().unwrap().public_queue_depth, 0);

    let (stranger, _) = create_test_client();
    assert_ok!(system
        .lobby
        .handle_join(&stranger, JoinRequest::public("stranger")));
    assert_eq!(system.games.created().len(), 3);
}

#[tokio::test]
async fn test_missing_private_game() {
    let system = create_test_system(4);
    let (client, sink) = create_test_client();

    let outcome = assert_ok!(system
        .lobby
        .handle_join(&client, JoinRequest::private("alice", "missing")));

    assert!(matches!(outcome, JoinOutcome::GameNotFound { .. }));
    assert_eq!(
        sink.get_sent_events(),
        vec![ServerEvent::GameNotFound(GameNotFound {
            private_game_name: "missing".to_string()
        })]
    );
    assert_eq!(system.adapters.attached_count(), 0);
}

#[tokio::test]
async fn test_finished_private_game_is_reaped_by_any_private_join() {
    let system = create_test_system(4);
    let (client, sink) = create_test_client();

    assert_ok!(system.lobby.handle_create(&client, create("old")));
    system.games.created()[0].finish();
    sink.clear_events();

    // Unrelated target still triggers the sweep
    assert_ok!(system
        .lobby
        .handle_join(&client, JoinRequest::private("alice", "elsewhere")));
    assert!(system.lobby.private_game_names().unwrap().is_empty());

    assert_ok!(system
        .lobby
        .handle_join(&client, JoinRequest::private("alice", "old")));
    assert_eq!(
        sink.get_sent_events().last(),
        Some(&ServerEvent::GameNotFound(GameNotFound {
            private_game_name: "old".to_string()
        }))
    );

    // The name is free again
    assert_eq!(
        assert_ok!(system.lobby.handle_create(&client, create("old"))),
        "old"
    );
}

#[tokio::test]
async fn test_public_joins_do_not_reap() {
    let system = create_test_system(4);
    let (client, _) = create_test_client();

    assert_ok!(system.lobby.handle_create(&client, create("idle")));
    system.games.created()[0].finish();

    assert_ok!(system
        .lobby
        .handle_join(&client, JoinRequest::public("alice")));
    assert_eq!(system.lobby.private_game_names().unwrap(), vec!["idle"]);

    assert_eq!(system.lobby.reap_finished().unwrap(), vec!["idle"]);
    assert!(system.lobby.private_game_names().unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_routes_gameplay_and_detaches_on_disconnect() {
    let system = create_test_system(4);
    let (client, _) = create_test_client();
    let mut connection = assert_ok!(ConnectionHandler::open(system.lobby.clone(), client));

    assert_ok!(connection.handle_text(r#"{"event":"join","data":{"playerName":"alice"}}"#));
    assert_ok!(connection.handle_text(r#"{"event":"create","data":{"gameName":"side"}}"#));
    assert_ok!(connection.handle_text(
        r#"{"event":"join","data":{"playerName":"alice","privateGameName":"side"}}"#
    ));
    assert_eq!(connection.adapter_count(), 2);

    assert_ok!(connection.handle_text(r#"{"event":"command","data":{"action":"income"}}"#));
    assert_eq!(
        system.adapters.events(),
        vec![
            ("alice".to_string(), "command".to_string()),
            ("alice".to_string(), "command".to_string()),
        ]
    );

    assert_ok!(connection.handle_event(ClientEvent::Disconnect));
    assert_eq!(system.adapters.detached().len(), 2);

    // Nothing is routed after the disconnect
    assert_ok!(connection.handle_text(r#"{"event":"command","data":{}}"#));
    assert_eq!(system.adapters.events().len(), 2);
    assert_eq!(system.lobby.stats().unwrap().active_connections, 0);
}

#[tokio::test]
async fn test_concurrent_public_joins_share_games() {
    let system = create_test_system(5);
    let mut handles = Vec::new();

    for i in 0..50 {
        let lobby = system.lobby.clone();
        handles.push(tokio::spawn(async move {
            let (client, _) = create_test_client();
            lobby
                .handle_join(&client, JoinRequest::public(format!("p{}", i)))
                .map(|outcome| outcome.is_attached())
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let games = system.games.created();
    assert_eq!(games.len(), 10);
    assert!(games.iter().all(|game| game.player_count() == 5));
    assert_eq!(system.lobby.stats().unwrap().players_attached, 50);
}

#[tokio::test]
async fn test_wire_format_of_lobby_events() {
    let text = encode_server_event(&ServerEvent::Created(Created {
        game_name: "foox".to_string(),
    }))
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({"event": "created", "data": {"gameName": "foox"}}));
}

#[tokio::test]
async fn test_service_serves_version_over_http() {
    let (app_state, addr) = start_test_service().await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /version HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("treason-lobby"));
    assert!(response.contains(treason_lobby::VERSION));

    assert_ok!(app_state.shutdown().await);
}

async fn start_test_service() -> (Arc<AppState>, std::net::SocketAddr) {
    let mut config = AppConfig::default();
    config.service.host = "127.0.0.1".to_string();
    config.service.shutdown_timeout_seconds = 1;

    let app_state = Arc::new(AppState::new(config).await.unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    app_state.start_with_listener(listener).await.unwrap();
    (app_state, addr)
}

/// Next text frame from the server, decoded
async fn next_event<S>(socket: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if frame.is_text() {
            return serde_json::from_str(frame.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_lobby_socket_round_trip() {
    let (app_state, addr) = start_test_service().await;
    let lobby = app_state.lobby();

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/lobby", addr))
        .await
        .unwrap();

    // Garbage is dropped without closing the connection
    socket.send(Message::text("not json".to_string())).await.unwrap();

    socket
        .send(Message::text(
            r#"{"event":"create","data":{"gameName":"table"}}"#.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut socket).await,
        json!({"event": "created", "data": {"gameName": "table"}})
    );

    socket
        .send(Message::text(
            r#"{"event":"join","data":{"playerName":"alice","privateGameName":"table"}}"#
                .to_string(),
        ))
        .await
        .unwrap();
    let seated = next_event(&mut socket).await;
    assert_eq!(seated["event"], "seated");
    assert_eq!(seated["data"]["gameName"], "table");
    assert_eq!(seated["data"]["players"], json!(["alice"]));

    let stats = lobby.stats().unwrap();
    assert_eq!(stats.active_connections, 1);
    assert_eq!(stats.players_attached, 1);
    assert_eq!(
        lobby
            .metrics()
            .connection()
            .malformed_events_total
            .get(),
        1
    );

    socket.close(None).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while lobby.stats().unwrap().active_connections > 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "connection was not torn down"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Closing the socket released alice's seat, so the game is over
    assert_eq!(lobby.reap_finished().unwrap(), vec!["table"]);

    assert_ok!(app_state.shutdown().await);
}
