//! Lobby controller handling join and create requests
//!
//! The controller owns the public queue and the private registry. Every
//! decision for a single request (queue pop, registry lookup, reap sweep,
//! attach and re-offer) happens under one lock, so requests from different
//! connections interleave only between handler calls.

use crate::config::GameSettings;
use crate::error::{LobbyError, Result};
use crate::game::session::{GameConfig, GameFactory, GameSession, PlayerAdapter, PlayerAdapterFactory};
use crate::lobby::queue::PublicQueue;
use crate::lobby::registry::PrivateRegistry;
use crate::lobby::validation::{truncate_game_name, validate_player_name, NameRejection};
use crate::metrics::collector::{JOIN_ATTACHED, JOIN_NOT_FOUND, JOIN_REJECTED};
use crate::metrics::MetricsCollector;
use crate::transport::publisher::ClientHandle;
use crate::types::{
    ConnectionId, CreateRequest, Created, GameKind, GameName, GameNotFound, JoinRequest,
    ServerEvent,
};
use crate::utils::{current_timestamp, elapsed_ms};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Statistics about lobby operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LobbyStats {
    /// Total number of public games created
    pub public_games_created: u64,
    /// Total number of private games created
    pub private_games_created: u64,
    /// Total number of players attached to a session
    pub players_attached: u64,
    /// Joins dropped because of an invalid player name
    pub joins_rejected: u64,
    /// Private joins naming an unregistered game
    pub games_not_found: u64,
    /// Finished private games removed from the registry
    pub private_games_reaped: u64,
    /// Public games popped without an open seat
    pub stale_games_discarded: u64,
    /// Current number of open connections
    pub active_connections: usize,
    /// Current number of public games waiting for players
    pub public_queue_depth: usize,
    /// Current number of registered private games
    pub private_games: usize,
}

/// Result of a join request
pub enum JoinOutcome {
    /// The player was attached to a session
    Attached {
        adapter: Box<dyn PlayerAdapter>,
        kind: GameKind,
        new_game: bool,
    },
    /// The player name failed validation; nothing was sent to the client
    Rejected(NameRejection),
    /// The named private game is not registered; `gamenotfound` was sent
    GameNotFound { game_name: GameName },
}

impl JoinOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, JoinOutcome::Attached { .. })
    }
}

impl std::fmt::Debug for JoinOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinOutcome::Attached {
                adapter,
                kind,
                new_game,
            } => f
                .debug_struct("Attached")
                .field("player_name", &adapter.player_name())
                .field("kind", kind)
                .field("new_game", new_game)
                .finish(),
            JoinOutcome::Rejected(reason) => f.debug_tuple("Rejected").field(reason).finish(),
            JoinOutcome::GameNotFound { game_name } => f
                .debug_struct("GameNotFound")
                .field("game_name", game_name)
                .finish(),
        }
    }
}

struct LobbyState<S: GameSession> {
    public_queue: PublicQueue<S>,
    private_games: PrivateRegistry<S>,
}

/// The lobby: matches players to public games and manages private games
pub struct LobbyController<S: GameSession + 'static> {
    /// Queue and registry, guarded together
    state: Mutex<LobbyState<S>>,
    /// Game engine factory
    games: Arc<dyn GameFactory<Session = S>>,
    /// Player adapter factory
    players: Arc<dyn PlayerAdapterFactory<S>>,
    /// Settings passed to every new session
    settings: GameSettings,
    /// Controller statistics
    stats: RwLock<LobbyStats>,
    /// Metrics collector for recording lobby activity
    metrics_collector: Arc<MetricsCollector>,
}

impl<S: GameSession + 'static> LobbyController<S> {
    /// Create a new controller with its own metrics collector
    pub fn new(
        games: Arc<dyn GameFactory<Session = S>>,
        players: Arc<dyn PlayerAdapterFactory<S>>,
        settings: GameSettings,
    ) -> Result<Self> {
        let metrics_collector = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_metrics(games, players, settings, metrics_collector))
    }

    /// Create a new controller with a shared metrics collector
    pub fn with_metrics(
        games: Arc<dyn GameFactory<Session = S>>,
        players: Arc<dyn PlayerAdapterFactory<S>>,
        settings: GameSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            state: Mutex::new(LobbyState {
                public_queue: PublicQueue::new(),
                private_games: PrivateRegistry::new(),
            }),
            games,
            players,
            settings,
            stats: RwLock::new(LobbyStats::default()),
            metrics_collector,
        }
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, LobbyState<S>>> {
        self.state.lock().map_err(|_| {
            LobbyError::InternalError {
                message: "Failed to acquire lobby state lock".to_string(),
            }
            .into()
        })
    }

    fn update_stats(&self, update: impl FnOnce(&mut LobbyStats)) -> Result<()> {
        let mut stats = self.stats.write().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire stats lock".to_string(),
        })?;
        update(&mut stats);
        Ok(())
    }

    /// Handle a `join` event from a connection
    ///
    /// A private join sweeps finished games out of the registry before the
    /// lookup, so a finished target yields `gamenotfound` instead of being
    /// adopted.
    pub fn handle_join(&self, client: &ClientHandle, request: JoinRequest) -> Result<JoinOutcome> {
        let start_time = Instant::now();
        let private_target = request.private_target().map(str::to_string);
        let kind = if private_target.is_some() {
            GameKind::Private
        } else {
            GameKind::Public
        };

        let player_name = match validate_player_name(request.player_name.as_deref()) {
            Ok(name) => name.to_string(),
            Err(reason) => {
                debug!(
                    "Dropping join from connection {}: {}",
                    client.id(),
                    reason
                );
                self.update_stats(|stats| stats.joins_rejected += 1)?;
                self.metrics_collector
                    .record_join(JOIN_REJECTED, kind, start_time.elapsed());
                return Ok(JoinOutcome::Rejected(reason));
            }
        };

        let mut state = self.lock_state()?;

        let (adapter, session, new_game) = match private_target {
            Some(game_name) => {
                self.reap_locked(&mut state)?;

                let found = state.private_games.lookup(&game_name);
                match found {
                    Some(session) => {
                        let adapter = self.players.attach(session.clone(), client, &player_name);
                        (adapter, session, false)
                    }
                    None => {
                        drop(state);
                        info!(
                            "Private game '{}' not found for '{}'",
                            game_name, player_name
                        );
                        let event = ServerEvent::GameNotFound(GameNotFound {
                            private_game_name: game_name.clone(),
                        });
                        if let Err(e) = client.emit(event) {
                            warn!("Failed to notify connection {}: {}", client.id(), e);
                        }
                        self.update_stats(|stats| stats.games_not_found += 1)?;
                        self.metrics_collector
                            .record_join(JOIN_NOT_FOUND, kind, start_time.elapsed());
                        return Ok(JoinOutcome::GameNotFound { game_name });
                    }
                }
            }
            None => self.attach_public(&mut state, client, &player_name)?,
        };

        if kind == GameKind::Public && session.can_join() {
            state.public_queue.offer(session);
        }

        let public_queue_depth = state.public_queue.len();
        let private_games = state.private_games.len();
        drop(state);

        info!(
            "Attached '{}' (connection {}) to {} game{} - time: {:.2}ms",
            player_name,
            client.id(),
            kind.as_label(),
            if new_game { " (new)" } else { "" },
            elapsed_ms(start_time)
        );

        self.update_stats(|stats| {
            stats.players_attached += 1;
            stats.public_queue_depth = public_queue_depth;
            stats.private_games = private_games;
        })?;
        self.metrics_collector
            .record_join(JOIN_ATTACHED, kind, start_time.elapsed());

        Ok(JoinOutcome::Attached {
            adapter,
            kind,
            new_game,
        })
    }

    /// Attach to a queued or new public game, moving on when the engine
    /// refuses the seat
    fn attach_public(
        &self,
        state: &mut LobbyState<S>,
        client: &ClientHandle,
        player_name: &str,
    ) -> Result<(Box<dyn PlayerAdapter>, Arc<S>, bool)> {
        loop {
            let (session, new_game) = self.match_public(state)?;
            let mut adapter = self.players.attach(session.clone(), client, player_name);
            if adapter.has_seat() || new_game {
                return Ok((adapter, session, new_game));
            }

            debug!(
                "Public game closed before '{}' was seated, trying another",
                player_name
            );
            adapter.detach();
            self.update_stats(|stats| stats.stale_games_discarded += 1)?;
            self.metrics_collector.record_stale_game_discarded();
        }
    }

    /// Pop queued sessions until one has a seat, or create a new one
    fn match_public(&self, state: &mut LobbyState<S>) -> Result<(Arc<S>, bool)> {
        while let Some(session) = state.public_queue.take() {
            if session.can_join() {
                return Ok((session, false));
            }

            debug!("Discarding public game without an open seat");
            self.update_stats(|stats| stats.stale_games_discarded += 1)?;
            self.metrics_collector.record_stale_game_discarded();
        }

        let session = self.games.create_game(GameConfig::public(&self.settings));
        self.update_stats(|stats| stats.public_games_created += 1)?;
        self.metrics_collector.record_game_created(GameKind::Public);
        Ok((session, true))
    }

    /// Handle a `create` event, returning the name the game was registered under
    pub fn handle_create(&self, client: &ClientHandle, request: CreateRequest) -> Result<GameName> {
        let mut state = self.lock_state()?;

        let requested = truncate_game_name(&request.game_name);
        let game_name = state.private_games.resolve_unique_name(requested);
        let config = GameConfig::private(&self.settings, &game_name, current_timestamp());
        let session = self.games.create_game(config);
        state.private_games.register(game_name.clone(), session);

        let private_games = state.private_games.len();
        drop(state);

        if game_name != request.game_name {
            info!(
                "Created private game '{}' (requested '{}') for connection {}",
                game_name,
                request.game_name,
                client.id()
            );
        } else {
            info!(
                "Created private game '{}' for connection {}",
                game_name,
                client.id()
            );
        }

        self.update_stats(|stats| {
            stats.private_games_created += 1;
            stats.private_games = private_games;
        })?;
        self.metrics_collector.record_game_created(GameKind::Private);

        let event = ServerEvent::Created(Created {
            game_name: game_name.clone(),
        });
        if let Err(e) = client.emit(event) {
            warn!("Failed to notify connection {}: {}", client.id(), e);
        }

        Ok(game_name)
    }

    /// Remove every finished private game, returning the removed names
    pub fn reap_finished(&self) -> Result<Vec<GameName>> {
        let mut state = self.lock_state()?;
        self.reap_locked(&mut state)
    }

    fn reap_locked(&self, state: &mut LobbyState<S>) -> Result<Vec<GameName>> {
        let reaped = state.private_games.reap_finished();

        if !reaped.is_empty() {
            let remaining = state.private_games.len();
            self.update_stats(|stats| {
                stats.private_games_reaped += reaped.len() as u64;
                stats.private_games = remaining;
            })?;
            self.metrics_collector.record_games_reaped(reaped.len());
        }

        Ok(reaped)
    }

    /// Record a newly accepted connection
    pub fn connection_opened(&self, connection_id: ConnectionId) -> Result<()> {
        debug!("Connection {} opened", connection_id);
        self.update_stats(|stats| stats.active_connections += 1)?;
        self.metrics_collector.record_connection_opened();
        Ok(())
    }

    /// Record a connection going away after its bindings were detached
    pub fn connection_closed(
        &self,
        connection_id: ConnectionId,
        detached: usize,
        lifetime: std::time::Duration,
    ) -> Result<()> {
        debug!(
            "Connection {} closed, detached {} player binding(s)",
            connection_id, detached
        );
        self.update_stats(|stats| {
            stats.active_connections = stats.active_connections.saturating_sub(1)
        })?;
        self.metrics_collector.record_connection_closed(lifetime);
        Ok(())
    }

    /// Names of the registered private games
    pub fn private_game_names(&self) -> Result<Vec<GameName>> {
        Ok(self.lock_state()?.private_games.names())
    }

    /// Get current lobby statistics
    pub fn stats(&self) -> Result<LobbyStats> {
        let (public_queue_depth, private_games) = {
            let state = self.lock_state()?;
            (state.public_queue.len(), state.private_games.len())
        };

        let stats = self.stats.read().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire stats lock".to_string(),
        })?;

        Ok(LobbyStats {
            public_queue_depth,
            private_games,
            ..stats.clone()
        })
    }
}
