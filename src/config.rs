//! Game and level configuration
//!
//! Every field has a default, so a config file only needs to list overrides.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;

/// Fixed brick grid laid out at level start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelLayout {
    pub rows: u32,
    pub columns: u32,
    /// Brick size (width, height)
    pub brick_size: Vec2,
    /// Gap between neighbouring bricks (horizontal, vertical)
    pub spacing: Vec2,
    /// Centre y of the top row
    pub top_row_y: f32,
}

impl Default for LevelLayout {
    fn default() -> Self {
        Self {
            rows: 2,
            columns: 5,
            brick_size: Vec2::new(1.6, 0.5),
            spacing: Vec2::new(0.2, 0.2),
            top_row_y: 11.7,
        }
    }
}

impl LevelLayout {
    /// Total number of bricks in the grid
    pub fn brick_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Brick centres, row by row from the top, columns centred on `center_x`
    pub fn brick_positions(&self, center_x: f32) -> Vec<Vec2> {
        let pitch = self.brick_size + self.spacing;
        let row_width = self.columns as f32 * pitch.x - self.spacing.x;
        let first_x = center_x - row_width / 2.0 + self.brick_size.x / 2.0;

        (0..self.rows)
            .flat_map(|row| {
                (0..self.columns).map(move |col| {
                    Vec2::new(
                        first_x + col as f32 * pitch.x,
                        self.top_row_y - row as f32 * pitch.y,
                    )
                })
            })
            .collect()
    }
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for launch jitter
    pub seed: u64,

    // === Physics ===
    pub gravity: Vec2,
    /// Fixed simulation step (seconds)
    pub fixed_dt: f32,
    pub solver_iterations: usize,
    pub max_bodies: usize,

    // === Playfield ===
    /// Lower-left corner of the playfield
    pub field_min: Vec2,
    /// Upper-right corner of the playfield
    pub field_max: Vec2,
    pub wall_thickness: f32,

    // === Paddle ===
    pub paddle_size: Vec2,
    pub paddle_y: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub launch_velocity: Vec2,
    /// Maximum random horizontal speed added at launch (0 disables)
    pub launch_jitter: f32,

    // === Scoring ===
    pub points_per_brick: u64,

    pub level: LevelLayout,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,

            gravity: Vec2::new(0.0, -9.81),
            fixed_dt: SIM_DT,
            solver_iterations: SOLVER_ITERATIONS,
            max_bodies: MAX_BODIES,

            field_min: Vec2::new(FIELD_LEFT, FIELD_BOTTOM),
            field_max: Vec2::new(FIELD_RIGHT, FIELD_TOP),
            wall_thickness: WALL_THICKNESS,

            paddle_size: Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
            paddle_y: PADDLE_Y,

            ball_radius: BALL_RADIUS,
            launch_velocity: Vec2::new(0.0, BALL_LAUNCH_SPEED),
            launch_jitter: 0.0,

            points_per_brick: 1,

            level: LevelLayout::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configs that can't produce a playable level
    ///
    /// Shape sizes are checked again at body creation; this only covers what
    /// body creation can't see.
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |msg: &str| Err(GameError::InvalidConfig(msg.to_string()));

        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return invalid("fixed_dt must be positive");
        }
        if self.solver_iterations == 0 {
            return invalid("solver_iterations must be at least 1");
        }
        if self.max_bodies == 0 {
            return invalid("max_bodies must be at least 1");
        }
        if !(self.field_min.x < self.field_max.x && self.field_min.y < self.field_max.y) {
            return invalid("field_min must be below and left of field_max");
        }
        if self.paddle_size.x >= self.field_width() {
            return invalid("paddle is wider than the playfield");
        }
        if !(self.paddle_y > self.field_min.y && self.paddle_y < self.field_max.y) {
            return invalid("paddle_y lies outside the playfield");
        }
        if !(self.launch_velocity.is_finite() && self.launch_velocity != Vec2::ZERO) {
            return invalid("launch_velocity must be finite and non-zero");
        }
        if !(self.launch_jitter >= 0.0 && self.launch_jitter <= self.launch_velocity.length()) {
            return invalid("launch_jitter must lie between zero and the launch speed");
        }
        if self.level.brick_count() == 0 {
            return invalid("level needs at least one brick");
        }
        Ok(())
    }

    pub fn field_width(&self) -> f32 {
        self.field_max.x - self.field_min.x
    }

    pub fn field_center_x(&self) -> f32 {
        (self.field_min.x + self.field_max.x) / 2.0
    }

    /// Paddle x range `[min_x, max_x]` keeping the paddle inside the walls
    pub fn paddle_range(&self) -> (f32, f32) {
        let half = self.paddle_size.x / 2.0;
        (self.field_min.x + half, self.field_max.x - half)
    }

    /// Ball centre height while resting on the paddle
    pub fn serve_height(&self) -> f32 {
        self.paddle_y + self.paddle_size.y / 2.0 + self.ball_radius + SERVE_GAP
    }
}
