//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use treason_lobby::config::GameSettings;
use treason_lobby::game::{GameConfig, GameFactory, GameSession, PlayerAdapter, PlayerAdapterFactory};
use treason_lobby::lobby::LobbyController;
use treason_lobby::transport::{ClientHandle, MockEventSink};
use treason_lobby::utils::generate_connection_id;

/// Game session with a seat limit, driven directly by tests
#[derive(Debug)]
pub struct TestSession {
    seats: usize,
    players: AtomicUsize,
    over: AtomicBool,
    pub game_name: Option<String>,
}

impl TestSession {
    pub fn new(seats: usize, game_name: Option<String>) -> Self {
        Self {
            seats,
            players: AtomicUsize::new(0),
            over: AtomicBool::new(false),
            game_name,
        }
    }

    pub fn seat_player(&self) {
        self.players.fetch_add(1, Ordering::SeqCst);
    }

    pub fn player_count(&self) -> usize {
        self.players.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.over.store(true, Ordering::SeqCst);
    }
}

impl GameSession for TestSession {
    fn can_join(&self) -> bool {
        !self.over.load(Ordering::SeqCst) && self.player_count() < self.seats
    }

    fn game_over(&self) -> bool {
        self.over.load(Ordering::SeqCst)
    }
}

/// Factory creating `TestSession`s and remembering each one
pub struct TestGameFactory {
    seats: usize,
    created: Mutex<Vec<Arc<TestSession>>>,
}

impl TestGameFactory {
    pub fn new(seats: usize) -> Self {
        Self {
            seats,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<Arc<TestSession>> {
        self.created
            .lock()
            .map(|created| created.clone())
            .unwrap_or_default()
    }
}

impl GameFactory for TestGameFactory {
    type Session = TestSession;

    fn create_game(&self, config: GameConfig) -> Arc<TestSession> {
        let session = Arc::new(TestSession::new(self.seats, config.game_name));
        if let Ok(mut created) = self.created.lock() {
            created.push(session.clone());
        }
        session
    }
}

/// What happened to the bindings handed out by `TestAdapterFactory`
#[derive(Debug, Default)]
pub struct AdapterLog {
    pub attached: Vec<(String, Arc<TestSession>)>,
    pub events: Vec<(String, String)>,
    pub detached: Vec<String>,
}

/// Adapter factory that seats players and logs every binding call
#[derive(Default)]
pub struct TestAdapterFactory {
    log: Arc<Mutex<AdapterLog>>,
}

impl TestAdapterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached_count(&self) -> usize {
        self.log.lock().map(|log| log.attached.len()).unwrap_or(0)
    }

    pub fn attached_sessions(&self) -> Vec<Arc<TestSession>> {
        self.log
            .lock()
            .map(|log| log.attached.iter().map(|(_, s)| s.clone()).collect())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<(String, String)> {
        self.log
            .lock()
            .map(|log| log.events.clone())
            .unwrap_or_default()
    }

    pub fn detached(&self) -> Vec<String> {
        self.log
            .lock()
            .map(|log| log.detached.clone())
            .unwrap_or_default()
    }
}

struct TestAdapter {
    player_name: String,
    log: Arc<Mutex<AdapterLog>>,
}

impl PlayerAdapter for TestAdapter {
    fn player_name(&self) -> &str {
        &self.player_name
    }

    fn handle_event(&mut self, event: &str, _data: &serde_json::Value) {
        if let Ok(mut log) = self.log.lock() {
            log.events.push((self.player_name.clone(), event.to_string()));
        }
    }

    fn detach(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.detached.push(self.player_name.clone());
        }
    }
}

impl PlayerAdapterFactory<TestSession> for TestAdapterFactory {
    fn attach(
        &self,
        session: Arc<TestSession>,
        _client: &ClientHandle,
        player_name: &str,
    ) -> Box<dyn PlayerAdapter> {
        session.seat_player();
        if let Ok(mut log) = self.log.lock() {
            log.attached.push((player_name.to_string(), session));
        }
        Box::new(TestAdapter {
            player_name: player_name.to_string(),
            log: self.log.clone(),
        })
    }
}

/// A lobby wired to test doubles
pub struct TestSystem {
    pub lobby: Arc<LobbyController<TestSession>>,
    pub games: Arc<TestGameFactory>,
    pub adapters: Arc<TestAdapterFactory>,
}

/// Build a lobby whose games have `seats` seats each
pub fn create_test_system(seats: usize) -> TestSystem {
    let games = Arc::new(TestGameFactory::new(seats));
    let adapters = Arc::new(TestAdapterFactory::new());
    let lobby = Arc::new(
        LobbyController::new(games.clone(), adapters.clone(), GameSettings::default())
            .expect("Failed to create lobby controller"),
    );

    TestSystem {
        lobby,
        games,
        adapters,
    }
}

/// A client handle whose outbound events are captured
pub fn create_test_client() -> (ClientHandle, Arc<MockEventSink>) {
    let sink = Arc::new(MockEventSink::new());
    (ClientHandle::new(generate_connection_id(), sink.clone()), sink)
}

/// Player names accepted by validation
pub fn valid_player_names() -> Vec<String> {
    vec![
        "alice".to_string(),
        "Bob_2".to_string(),
        "carol the great".to_string(),
        "!@#$*".to_string(),
        "x".repeat(30),
    ]
}

/// Player names rejected by validation
pub fn invalid_player_names() -> Vec<String> {
    vec![
        String::new(),
        "x".repeat(31),
        "dave<script>".to_string(),
        "semi;colon".to_string(),
        "new\nline".to_string(),
        "émile".to_string(),
    ]
}
