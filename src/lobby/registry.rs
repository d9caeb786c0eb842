//! Private game registry
//!
//! Maps caller-chosen names to invitation-only sessions. Entries stay until a
//! reap sweep finds their session over.

use crate::game::session::GameSession;
use crate::types::GameName;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Suffix appended to a requested name until it no longer collides
pub const COLLISION_SUFFIX: char = 'x';

/// Named private sessions
pub struct PrivateRegistry<S: GameSession> {
    games: HashMap<GameName, Arc<S>>,
}

impl<S: GameSession> PrivateRegistry<S> {
    pub fn new() -> Self {
        Self {
            games: HashMap::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<S>> {
        self.games.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.games.contains_key(name)
    }

    /// Insert a session under a name that is not yet taken
    ///
    /// Callers resolve collisions first with `resolve_unique_name`.
    pub fn register(&mut self, name: GameName, session: Arc<S>) {
        debug_assert!(!self.games.contains_key(&name), "duplicate private game name");
        self.games.insert(name, session);
    }

    /// Turn a requested name into one that is not registered yet
    pub fn resolve_unique_name(&self, requested: &str) -> GameName {
        let mut name = requested.to_string();
        while self.games.contains_key(&name) {
            name.push(COLLISION_SUFFIX);
        }
        name
    }

    /// Remove every game whose session is over, returning the removed names
    pub fn reap_finished(&mut self) -> Vec<GameName> {
        let finished: Vec<GameName> = self
            .games
            .iter()
            .filter(|(_, session)| session.game_over())
            .map(|(name, _)| name.clone())
            .collect();

        for name in &finished {
            self.games.remove(name);
            info!("Reaping finished private game '{}'", name);
        }

        finished
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn names(&self) -> Vec<GameName> {
        self.games.keys().cloned().collect()
    }
}

impl<S: GameSession> Default for PrivateRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
