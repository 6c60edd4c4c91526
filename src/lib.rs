//! Brick Physics - a brick-breaker game core on top of a 2D physics engine
//!
//! Core modules:
//! - `sim`: Physics world wrapper, collidable entities, game controller
//! - `renderer`: Vertex format and per-entity geometry for the graphics layer
//! - `platform`: Host bindings forwarding lifecycle calls to the controller
//! - `config`: Data-driven game and level configuration

pub mod config;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod sim;

pub use config::{GameConfig, LevelLayout};
pub use error::{GameError, PhysicsError};
pub use sim::{EntityId, EntityKind, GameController, GamePhase};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted by the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Solver iterations per substep
    pub const SOLVER_ITERATIONS: usize = 8;
    /// Body limit for a single world
    pub const MAX_BODIES: usize = 256;

    /// Playfield bounds (world units)
    pub const FIELD_LEFT: f32 = 0.0;
    pub const FIELD_RIGHT: f32 = 10.0;
    pub const FIELD_BOTTOM: f32 = 0.0;
    pub const FIELD_TOP: f32 = 15.0;
    pub const WALL_THICKNESS: f32 = 0.5;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 2.0;
    pub const PADDLE_HEIGHT: f32 = 0.3;
    pub const PADDLE_Y: f32 = 1.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.2;
    /// Gap between paddle top and a served ball
    pub const SERVE_GAP: f32 = 0.05;
    pub const BALL_LAUNCH_SPEED: f32 = 5.0;

    /// Outline resolution for circles
    pub const CIRCLE_SEGMENTS: u32 = 24;
}

/// Clamp `value` into `[min, max]`, saturating silently.
///
/// Falls back to the range midpoint when the range is inverted, and to `min`
/// for NaN input.
#[inline]
pub fn saturate(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        return (min + max) / 2.0;
    }
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}
