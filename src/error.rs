//! Error types for level loading and body creation

use thiserror::Error;

/// Errors raised while registering bodies in a [`PhysicsWorld`](crate::sim::PhysicsWorld)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Shape parameters are zero, negative or not finite
    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    /// The world already holds its maximum number of bodies
    #[error("physics world is full ({limit} bodies)")]
    WorldFull { limit: usize },
}

/// Errors surfaced by the game controller
///
/// All of these abort a level load; nothing is retried.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("level load failed: {0}")]
    Physics(#[from] PhysicsError),

    #[error("could not parse config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
