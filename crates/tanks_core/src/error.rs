//! Error types for the tank simulation.
//!
//! Only the command surface and construction return errors. Conditions the
//! engine recovers from on its own (a blocked move, an AI with nowhere to
//! go, an exhausted projectile pool) are logged and retried next tick.

use thiserror::Error;

use crate::components::ActorId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all tank simulation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// No live actor has this identifier.
    #[error("Actor not found: {0}")]
    ActorNotFound(ActorId),

    /// The operation needs an AI-controlled actor.
    #[error("Actor {0} is not AI controlled")]
    NotAiControlled(ActorId),

    /// The operation needs a player-controlled actor.
    #[error("Actor {0} is not player controlled")]
    NotPlayerControlled(ActorId),

    /// Tile dimensions must be positive.
    #[error("Invalid tile geometry: {tile_width}x{tile_height}")]
    InvalidGeometry {
        /// Tile width in pixels.
        tile_width: i32,
        /// Tile height in pixels.
        tile_height: i32,
    },

    /// Map layout text could not be turned into a grid.
    #[error("Invalid map layout: {0}")]
    InvalidLayout(String),

    /// Configuration file parsing or validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
