//! Level setup: walls, brick grid, paddle and ball in one world
//!
//! The world and the entities referencing its bodies live in the same value,
//! so dropping a level tears both down together.

use glam::Vec2;

use super::entity::{EntityId, EntityKind, EntitySet};
use super::shape::ShapeSpec;
use super::world::PhysicsWorld;
use crate::config::GameConfig;
use crate::error::PhysicsError;

pub struct Level {
    pub(crate) world: PhysicsWorld,
    pub(crate) entities: EntitySet,
    paddle: EntityId,
    ball: EntityId,
}

impl Level {
    /// Build a fresh world and populate it; any creation error aborts the load
    pub fn load(config: &GameConfig) -> Result<Self, PhysicsError> {
        let mut world = PhysicsWorld::from_config(config);
        let mut entities = EntitySet::new();

        spawn_walls(&mut world, &mut entities, config)?;
        spawn_bricks(&mut world, &mut entities, config)?;

        let center_x = config.field_center_x();
        let paddle = entities.spawn(
            &mut world,
            EntityKind::Player,
            ShapeSpec::rectangle(config.paddle_size),
            Vec2::new(center_x, config.paddle_y),
        )?;
        let ball = entities.spawn(
            &mut world,
            EntityKind::Ball,
            ShapeSpec::circle(config.ball_radius),
            Vec2::new(center_x, config.serve_height()),
        )?;

        log::info!(
            "Level loaded: {} entities, {} bricks",
            entities.len(),
            entities.count(EntityKind::Brick)
        );

        Ok(Self {
            world,
            entities,
            paddle,
            ball,
        })
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn bricks_remaining(&self) -> usize {
        self.entities.count(EntityKind::Brick)
    }

    pub fn paddle_position(&self) -> Vec2 {
        self.body_position(self.paddle)
    }

    pub fn ball_position(&self) -> Vec2 {
        self.body_position(self.ball)
    }

    pub fn ball_velocity(&self) -> Vec2 {
        self.entities
            .get(self.ball)
            .map(|e| e.velocity(&self.world))
            .unwrap_or(Vec2::ZERO)
    }

    fn body_position(&self, id: EntityId) -> Vec2 {
        self.entities
            .get(id)
            .map(|e| e.position(&self.world))
            .unwrap_or(Vec2::ZERO)
    }

    /// Steer the paddle; the body reaches `x` at the next substep
    pub fn move_paddle(&mut self, x: f32, config: &GameConfig) {
        if let Some(paddle) = self.entities.get(self.paddle) {
            self.world
                .set_kinematic_target(paddle.body(), Vec2::new(x, config.paddle_y));
        }
    }

    /// Put the ball at rest on top of the paddle at `x`
    pub fn serve_ball(&mut self, x: f32, config: &GameConfig) {
        if let Some(ball) = self.entities.get(self.ball) {
            self.world
                .set_position(ball.body(), Vec2::new(x, config.serve_height()));
        }
    }

    pub fn set_ball_velocity(&mut self, vel: Vec2) {
        if let Some(ball) = self.entities.get(self.ball) {
            self.world.set_velocity(ball.body(), vel);
        }
    }

    /// Replace whatever bricks remain with a fresh grid
    pub fn rebuild_bricks(&mut self, config: &GameConfig) -> Result<(), PhysicsError> {
        self.entities.remove_kind(&mut self.world, EntityKind::Brick);
        spawn_bricks(&mut self.world, &mut self.entities, config)
    }
}

/// Static walls on the left, right and top; the bottom stays open
fn spawn_walls(
    world: &mut PhysicsWorld,
    entities: &mut EntitySet,
    config: &GameConfig,
) -> Result<(), PhysicsError> {
    let t = config.wall_thickness;
    let min = config.field_min;
    let max = config.field_max;
    let mid = (min + max) / 2.0;
    let height = max.y - min.y;
    let width = max.x - min.x;

    let walls = [
        (Vec2::new(min.x - t / 2.0, mid.y), Vec2::new(t, height + 2.0 * t)),
        (Vec2::new(max.x + t / 2.0, mid.y), Vec2::new(t, height + 2.0 * t)),
        (Vec2::new(mid.x, max.y + t / 2.0), Vec2::new(width + 2.0 * t, t)),
    ];

    for (position, size) in walls {
        entities.spawn(world, EntityKind::Wall, ShapeSpec::rectangle(size), position)?;
    }
    Ok(())
}

fn spawn_bricks(
    world: &mut PhysicsWorld,
    entities: &mut EntitySet,
    config: &GameConfig,
) -> Result<(), PhysicsError> {
    let shape = ShapeSpec::rectangle(config.level.brick_size);
    for position in config.level.brick_positions(config.field_center_x()) {
        entities.spawn(world, EntityKind::Brick, shape, position)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelLayout;

    #[test]
    fn test_load_default_level() {
        let config = GameConfig::default();
        let level = Level::load(&config).expect("level");

        assert_eq!(level.entities().count(EntityKind::Wall), 3);
        assert_eq!(level.bricks_remaining(), 10);
        assert_eq!(level.entities().count(EntityKind::Player), 1);
        assert_eq!(level.entities().count(EntityKind::Ball), 1);
        assert_eq!(level.world().body_count(), level.entities().len());

        assert_eq!(level.paddle_position(), Vec2::new(5.0, config.paddle_y));
        assert_eq!(level.ball_position(), Vec2::new(5.0, config.serve_height()));
    }

    #[test]
    fn test_load_aborts_on_degenerate_brick() {
        let config = GameConfig {
            level: LevelLayout {
                brick_size: Vec2::new(1.0, 0.0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            Level::load(&config),
            Err(PhysicsError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_load_aborts_when_world_full() {
        let config = GameConfig {
            max_bodies: 5,
            ..Default::default()
        };
        assert_eq!(
            Level::load(&config).err(),
            Some(PhysicsError::WorldFull { limit: 5 })
        );
    }

    #[test]
    fn test_rebuild_bricks_replaces_grid() {
        let config = GameConfig::default();
        let mut level = Level::load(&config).expect("level");
        let bodies = level.world().body_count();

        level.rebuild_bricks(&config).expect("rebuild");
        assert_eq!(level.bricks_remaining(), 10);
        assert_eq!(level.world().body_count(), bodies);
    }
}
