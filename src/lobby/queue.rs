//! Public matchmaking queue
//!
//! Holds public sessions that still had an open seat when they were offered.
//! The queue is a stack: the most recently offered session is matched first,
//! which keeps the number of half-filled public games small.

use crate::game::session::GameSession;
use std::sync::Arc;

/// LIFO queue of public sessions waiting for more players
pub struct PublicQueue<S: GameSession> {
    pending: Vec<Arc<S>>,
}

impl<S: GameSession> PublicQueue<S> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Make a session eligible for the next public joiner
    pub fn offer(&mut self, session: Arc<S>) {
        self.pending.push(session);
    }

    /// Pop the most recently offered session
    ///
    /// The session is not re-checked here; callers must confirm `can_join()`
    /// because a stale entry is never validated anywhere else.
    pub fn take(&mut self) -> Option<Arc<S>> {
        self.pending.pop()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<S: GameSession> Default for PublicQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}
