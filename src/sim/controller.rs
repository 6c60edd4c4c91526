//! Game controller
//!
//! Owns the level (world + entities) and all mutable game state, and receives
//! the platform's per-frame calls. Contacts only flag entities while the
//! world steps; removal happens afterwards in `update`, and `render` is a
//! read-only pass over what is left.

use glam::{Mat4, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::{EntityId, EntityKind, EntitySet};
use super::level::Level;
use super::state::{GamePhase, Snapshot};
use super::world::{ContactEvent, ListenerId};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::renderer::shapes::convex_fill;
use crate::renderer::{DrawCommand, DrawSink, color_for};
use crate::saturate;

pub struct GameController {
    config: GameConfig,
    /// `None` once destroyed
    level: Option<Level>,
    phase: GamePhase,
    score: u64,
    level_index: u32,
    balls_lost: u32,
    /// Clamped paddle target
    paddle_x: f32,
    /// Begin-contact events from the last `update`
    last_contacts: Vec<ContactEvent>,
    rng: Pcg32,
}

impl GameController {
    /// Validate the config and load the first level
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let level = Level::load(&config)?;
        log::info!("Game initialized with seed: {}", config.seed);

        Ok(Self {
            paddle_x: config.field_center_x(),
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            level: Some(level),
            phase: GamePhase::Idle,
            score: 0,
            level_index: 0,
            balls_lost: 0,
            last_contacts: Vec::new(),
        })
    }

    /// Build a controller from a JSON config
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        Self::new(GameConfig::from_json(json)?)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    pub fn balls_lost(&self) -> u32 {
        self.balls_lost
    }

    pub fn paddle_x(&self) -> f32 {
        self.paddle_x
    }

    pub fn is_destroyed(&self) -> bool {
        self.level.is_none()
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn entities(&self) -> Option<&EntitySet> {
        self.level.as_ref().map(Level::entities)
    }

    pub fn bricks_remaining(&self) -> usize {
        self.level.as_ref().map_or(0, Level::bricks_remaining)
    }

    pub fn ball_position(&self) -> Option<Vec2> {
        self.level.as_ref().map(Level::ball_position)
    }

    pub fn last_contacts(&self) -> &[ContactEvent] {
        &self.last_contacts
    }

    pub fn snapshot(&self) -> Snapshot {
        let level = self.level.as_ref();
        Snapshot {
            phase: self.phase,
            score: self.score,
            level_index: self.level_index,
            balls_lost: self.balls_lost,
            bricks_remaining: self.bricks_remaining(),
            paddle_x: self.paddle_x,
            ball_position: level.map_or(Vec2::ZERO, Level::ball_position),
            ball_velocity: level.map_or(Vec2::ZERO, Level::ball_velocity),
            step_count: level.map_or(0, |l| l.world().step_count()),
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::info!("Phase {} -> {}", self.phase.as_str(), phase.as_str());
            self.phase = phase;
        }
    }

    /// Advance one frame
    ///
    /// Terminal phases resolve back to `Idle` first. Otherwise the world
    /// steps, contact-flagged bricks are removed and scored, and the round
    /// outcome is checked.
    pub fn update(&mut self, elapsed: f32) -> Result<(), GameError> {
        let Some(level) = self.level.as_mut() else {
            return Ok(());
        };

        if self.phase.is_terminal() {
            self.last_contacts.clear();
            if self.phase == GamePhase::LevelCleared {
                level.rebuild_bricks(&self.config)?;
                self.level_index += 1;
                log::info!("Starting level {}", self.level_index + 1);
            }
            level.serve_ball(self.paddle_x, &self.config);
            self.set_phase(GamePhase::Idle);
            return Ok(());
        }
        if self.phase == GamePhase::Idle {
            level.serve_ball(self.paddle_x, &self.config);
        }

        level.world.step(elapsed, &mut level.entities);
        self.last_contacts = level.world.drain_contacts();

        if level.entities.take_hit_signals() > 0 {
            let removed = level.entities.remove_hit(&mut level.world);
            if !removed.is_empty() {
                self.score += removed.len() as u64 * self.config.points_per_brick;
                log::debug!(
                    "Removed {} brick(s), {} remaining",
                    removed.len(),
                    level.bricks_remaining()
                );
            }
        }

        if self.phase == GamePhase::Playing {
            if level.bricks_remaining() == 0 {
                log::info!("Level {} cleared, score {}", self.level_index + 1, self.score);
                self.set_phase(GamePhase::LevelCleared);
            } else if level.ball_position().y < level.paddle_position().y {
                self.balls_lost += 1;
                log::info!("Ball lost ({} so far)", self.balls_lost);
                self.set_phase(GamePhase::BallLost);
            }
        }

        Ok(())
    }

    /// Draw every live entity in id order
    pub fn render(&self, transform: &Mat4, sink: &mut dyn DrawSink) {
        let Some(level) = self.level.as_ref() else {
            return;
        };

        for entity in level.entities().iter() {
            let outline = entity.geometry(level.world());
            let vertices = convex_fill(&outline, color_for(entity.kind()));
            sink.draw(DrawCommand {
                entity: entity.id(),
                kind: entity.kind(),
                vertices: &vertices,
                transform,
            });
        }
    }

    /// Steer the paddle; out-of-range input saturates to the playfield
    pub fn move_player(&mut self, pos: f32) {
        let Some(level) = self.level.as_mut() else {
            return;
        };
        let (min_x, max_x) = self.config.paddle_range();
        self.paddle_x = saturate(pos, min_x, max_x);
        level.move_paddle(self.paddle_x, &self.config);
    }

    /// Launch the resting ball; ignored outside `Idle`
    pub fn launch_ball(&mut self) {
        if self.phase != GamePhase::Idle {
            return;
        }
        let Some(level) = self.level.as_mut() else {
            return;
        };

        let jitter = self.config.launch_jitter;
        let english = if jitter > 0.0 {
            self.rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        let velocity = self.config.launch_velocity + Vec2::new(english, 0.0);

        level.serve_ball(self.paddle_x, &self.config);
        level.set_ball_velocity(velocity);
        log::info!("Ball launched with velocity {:?}", velocity);
        self.set_phase(GamePhase::Playing);
    }

    /// Signal that a hit needs processing; handled by the next `update`
    ///
    /// No-op once destroyed.
    pub fn register_hit(&mut self) {
        if let Some(level) = self.level.as_mut() {
            level.entities.signal_hit();
        }
    }

    /// Observe begin-contact events; `None` once destroyed
    pub fn register_contact_listener<F>(&mut self, listener: F) -> Option<ListenerId>
    where
        F: FnMut(&ContactEvent) + 'static,
    {
        self.level
            .as_mut()
            .map(|level| level.world.register_contact_listener(listener))
    }

    pub fn unregister_contact_listener(&mut self, id: ListenerId) -> bool {
        self.level
            .as_mut()
            .is_some_and(|level| level.world.unregister_contact_listener(id))
    }

    /// Tear down the world and every entity in it
    ///
    /// Listeners are dropped before the bodies so nothing can be dispatched
    /// afterwards. Every later call is a no-op.
    pub fn destroy(&mut self) {
        if let Some(mut level) = self.level.take() {
            level.world.clear_contact_listeners();
            self.last_contacts.clear();
            log::info!(
                "Destroying world with {} bodies",
                level.world().body_count()
            );
        }
        self.phase = GamePhase::Idle;
    }

    /// Kind of a live entity
    pub fn entity_kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entities()?.get(id).map(|e| e.kind())
    }
}
