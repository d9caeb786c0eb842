//! Seat-tracking game engine bundled with the service
//!
//! `SeatedGame` models only what the lobby can observe: a fixed number of
//! seats, and a match that is over once everybody who sat down has left, or
//! once it has sat unjoined past the idle timeout. A full rules engine plugs
//! into the lobby through the same traits.

use crate::game::session::{GameConfig, GameFactory, GameSession, PlayerAdapter, PlayerAdapterFactory};
use crate::transport::publisher::ClientHandle;
use crate::types::{GameName, ServerEvent};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn, Span};
use uuid::Uuid;

/// Gameplay event sent to a player once seated
pub const SEATED_EVENT: &str = "seated";

/// How long a game nobody joined stays open unless configured otherwise
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Default)]
struct SeatState {
    players: Vec<String>,
    ever_seated: bool,
    finished: bool,
}

/// A game session with a fixed number of seats
#[derive(Debug)]
pub struct SeatedGame {
    id: Uuid,
    capacity: usize,
    game_name: Option<GameName>,
    created: Option<DateTime<Utc>>,
    opened_at: DateTime<Utc>,
    idle_timeout: Duration,
    move_delay: Duration,
    debug: bool,
    span: Span,
    seats: Mutex<SeatState>,
}

impl SeatedGame {
    pub fn new(config: GameConfig, capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            capacity,
            game_name: config.game_name,
            created: config.created,
            opened_at: config.created.unwrap_or_else(Utc::now),
            idle_timeout,
            move_delay: config.move_delay,
            debug: config.debug,
            span: config.logger,
            seats: Mutex::new(SeatState::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn game_name(&self) -> Option<&str> {
        self.game_name.as_deref()
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn move_delay(&self) -> Duration {
        self.move_delay
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Names of the currently seated players
    pub fn players(&self) -> Vec<String> {
        self.seats
            .lock()
            .map(|seats| seats.players.clone())
            .unwrap_or_default()
    }

    /// Seat a player; false when the game is full or finished
    pub fn take_seat(&self, player_name: &str) -> bool {
        let _entered = self.span.enter();
        let Ok(mut seats) = self.seats.lock() else {
            return false;
        };

        self.close_if_idle(&mut seats);
        if seats.finished || seats.players.len() >= self.capacity {
            return false;
        }

        seats.players.push(player_name.to_string());
        seats.ever_seated = true;
        info!(
            "Player '{}' seated in game {} ({}/{})",
            player_name,
            self.id,
            seats.players.len(),
            self.capacity
        );
        true
    }

    /// Release a player's seat; the game ends when the last player leaves
    pub fn leave_seat(&self, player_name: &str) {
        let _entered = self.span.enter();
        let Ok(mut seats) = self.seats.lock() else {
            return;
        };

        if let Some(index) = seats.players.iter().position(|p| p == player_name) {
            seats.players.remove(index);
            debug!("Player '{}' left game {}", player_name, self.id);
        }

        if seats.players.is_empty() && !seats.finished {
            seats.finished = true;
            info!("Game {} is over, all players have left", self.id);
        }
    }

    /// Finish a game nobody has joined once it has been open for the idle timeout
    fn close_if_idle(&self, seats: &mut SeatState) {
        if seats.finished || seats.ever_seated {
            return;
        }

        let open_for = Utc::now()
            .signed_duration_since(self.opened_at)
            .to_std()
            .unwrap_or_default();
        if open_for >= self.idle_timeout {
            seats.finished = true;
            let _entered = self.span.enter();
            info!(
                "Game {} is over, nobody joined within {}s",
                self.id,
                self.idle_timeout.as_secs()
            );
        }
    }
}

impl GameSession for SeatedGame {
    fn can_join(&self) -> bool {
        self.seats
            .lock()
            .map(|mut seats| {
                self.close_if_idle(&mut seats);
                !seats.finished && seats.players.len() < self.capacity
            })
            .unwrap_or(false)
    }

    fn game_over(&self) -> bool {
        self.seats
            .lock()
            .map(|mut seats| {
                self.close_if_idle(&mut seats);
                seats.finished
            })
            .unwrap_or(true)
    }
}

/// Factory producing seated games with a configured number of seats
#[derive(Debug, Clone)]
pub struct SeatedGameFactory {
    capacity: usize,
    idle_timeout: Duration,
}

impl SeatedGameFactory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set how long a game nobody joins stays open
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

impl GameFactory for SeatedGameFactory {
    type Session = SeatedGame;

    fn create_game(&self, config: GameConfig) -> Arc<SeatedGame> {
        let game = SeatedGame::new(config, self.capacity, self.idle_timeout);
        {
            let _entered = game.span.enter();
            info!(
                "Created game {} - seats: {}, move_delay: {}ms, debug: {}",
                game.id,
                game.capacity,
                game.move_delay.as_millis(),
                game.debug
            );
        }
        Arc::new(game)
    }
}

/// Binds a connection to a seat in a `SeatedGame`
pub struct SeatAdapter {
    game: Arc<SeatedGame>,
    client: ClientHandle,
    player_name: String,
    seated: bool,
}

impl PlayerAdapter for SeatAdapter {
    fn player_name(&self) -> &str {
        &self.player_name
    }

    fn has_seat(&self) -> bool {
        self.seated
    }

    fn handle_event(&mut self, event: &str, data: &serde_json::Value) {
        let _entered = self.game.span.enter();
        debug!(
            "Gameplay event '{}' from '{}' on connection {}: {}",
            event,
            self.player_name,
            self.client.id(),
            data
        );
    }

    fn detach(&mut self) {
        if self.seated {
            self.game.leave_seat(&self.player_name);
            self.seated = false;
        }
    }
}

/// Attaches players to seated games
#[derive(Debug, Clone, Default)]
pub struct SeatAdapterFactory;

impl SeatAdapterFactory {
    pub fn new() -> Self {
        Self
    }
}

impl PlayerAdapterFactory<SeatedGame> for SeatAdapterFactory {
    fn attach(
        &self,
        session: Arc<SeatedGame>,
        client: &ClientHandle,
        player_name: &str,
    ) -> Box<dyn PlayerAdapter> {
        let seated = session.take_seat(player_name);

        if seated {
            let event = ServerEvent::Gameplay {
                event: SEATED_EVENT.to_string(),
                data: json!({
                    "gameName": session.game_name(),
                    "players": session.players(),
                    "capacity": session.capacity(),
                }),
            };
            if let Err(e) = client.emit(event) {
                warn!("Failed to notify '{}' of their seat: {}", player_name, e);
            }
        } else {
            warn!(
                "No seat for '{}' in game {}, connection {} stays unseated",
                player_name,
                session.id(),
                client.id()
            );
        }

        Box::new(SeatAdapter {
            game: session,
            client: client.clone(),
            player_name: player_name.to_string(),
            seated,
        })
    }
}
