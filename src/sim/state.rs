//! Game phases and observable state

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball resting on the paddle, waiting for launch
    #[default]
    Idle,
    /// Ball in flight
    Playing,
    /// Ball fell below the paddle; re-served on the next update
    BallLost,
    /// Every brick destroyed; grid rebuilt on the next update
    LevelCleared,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "Idle",
            GamePhase::Playing => "Playing",
            GamePhase::BallLost => "BallLost",
            GamePhase::LevelCleared => "LevelCleared",
        }
    }

    /// Phases that end a round
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::BallLost | GamePhase::LevelCleared)
    }
}

/// Serializable summary of a controller, for HUDs and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    /// Levels cleared so far
    pub level_index: u32,
    pub balls_lost: u32,
    pub bricks_remaining: usize,
    pub paddle_x: f32,
    pub ball_position: Vec2,
    pub ball_velocity: Vec2,
    /// Fixed substeps simulated in the current world
    pub step_count: u64,
}
