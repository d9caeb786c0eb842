//! Game engine integration
//!
//! The lobby consumes game engines through the traits in `session`. The
//! `seats` module provides the engine the service binary runs with.

pub mod seats;
pub mod session;

pub use seats::{SeatAdapterFactory, SeatedGame, SeatedGameFactory};
pub use session::{GameConfig, GameFactory, GameSession, PlayerAdapter, PlayerAdapterFactory};
