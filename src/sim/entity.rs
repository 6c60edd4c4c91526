//! Collidable entities
//!
//! Every entity wraps exactly one body in a [`PhysicsWorld`]. The world owns
//! the body; the entity only holds its handle. Entities are kept sorted by id
//! so iteration order is stable.

use std::fmt;

use glam::Vec2;
use rapier2d::prelude::CoefficientCombineRule;
use serde::{Deserialize, Serialize};

use super::shape::ShapeSpec;
use super::world::{BodyDesc, BodyHandle, BodyType, ContactDispatch, PhysicsWorld};
use crate::error::PhysicsError;

/// Unique entity identifier, also stored in the body's user data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Dynamic circle bouncing around the playfield
    Ball,
    /// Kinematic paddle driven by input
    Player,
    /// Static rectangle removed once hit
    Brick,
    /// Static playfield boundary
    Wall,
}

impl EntityKind {
    pub fn body_type(self) -> BodyType {
        match self {
            EntityKind::Ball => BodyType::Dynamic,
            EntityKind::Player => BodyType::Kinematic,
            EntityKind::Brick | EntityKind::Wall => BodyType::Static,
        }
    }

    /// Whether contact with `other` breaks this entity
    ///
    /// Only bricks break, and only when the ball touches them.
    pub fn absorbs_hit_from(self, other: EntityKind) -> bool {
        matches!((self, other), (EntityKind::Brick, EntityKind::Ball))
    }

    fn body_desc(self, shape: ShapeSpec, position: Vec2) -> BodyDesc {
        let desc = BodyDesc::new(self.body_type(), shape, position);
        match self {
            // Perfectly elastic, frictionless, ballistic
            EntityKind::Ball => desc
                .with_restitution(1.0, CoefficientCombineRule::Max)
                .with_friction(0.0, CoefficientCombineRule::Min)
                .with_gravity_scale(0.0)
                .with_ccd(true),
            EntityKind::Player | EntityKind::Brick | EntityKind::Wall => desc,
        }
    }
}

/// A collidable game object
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    hit: bool,
    body: BodyHandle,
    shape: ShapeSpec,
}

impl Entity {
    /// Register a new body for this entity in `world`
    pub fn create(
        world: &mut PhysicsWorld,
        id: EntityId,
        kind: EntityKind,
        shape: ShapeSpec,
        position: Vec2,
    ) -> Result<Self, PhysicsError> {
        let body = world.create_body(id, &kind.body_desc(shape, position))?;
        Ok(Self {
            id,
            kind,
            hit: false,
            body,
            shape,
        })
    }

    pub fn brick(
        world: &mut PhysicsWorld,
        id: EntityId,
        size: Vec2,
        position: Vec2,
    ) -> Result<Self, PhysicsError> {
        Self::create(world, id, EntityKind::Brick, ShapeSpec::rectangle(size), position)
    }

    pub fn player(
        world: &mut PhysicsWorld,
        id: EntityId,
        size: Vec2,
        position: Vec2,
    ) -> Result<Self, PhysicsError> {
        Self::create(world, id, EntityKind::Player, ShapeSpec::rectangle(size), position)
    }

    pub fn ball(
        world: &mut PhysicsWorld,
        id: EntityId,
        radius: f32,
        position: Vec2,
    ) -> Result<Self, PhysicsError> {
        Self::create(world, id, EntityKind::Ball, ShapeSpec::circle(radius), position)
    }

    pub fn wall(
        world: &mut PhysicsWorld,
        id: EntityId,
        size: Vec2,
        position: Vec2,
    ) -> Result<Self, PhysicsError> {
        Self::create(world, id, EntityKind::Wall, ShapeSpec::rectangle(size), position)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn shape(&self) -> ShapeSpec {
        self.shape
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// Contact callback from the world's dispatcher
    ///
    /// Only flags the entity; the body stays in the world until the owner
    /// removes it after the step. Returns true on the false→true transition.
    pub fn on_contact(&mut self, other: EntityKind) -> bool {
        if self.hit || !self.kind.absorbs_hit_from(other) {
            return false;
        }
        self.hit = true;
        true
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        world.position(self.body)
    }

    pub fn velocity(&self, world: &PhysicsWorld) -> Vec2 {
        world.velocity(self.body)
    }

    /// Outline vertices from the shape and the body's current transform
    pub fn geometry(&self, world: &PhysicsWorld) -> Vec<Vec2> {
        self.shape
            .outline(world.position(self.body), world.rotation(self.body))
    }

    /// Remove the body from the world, consuming the entity
    pub fn destroy(self, world: &mut PhysicsWorld) {
        world.remove_body(self.body);
    }
}

/// The live entities of a level, sorted by id
#[derive(Debug)]
pub struct EntitySet {
    entities: Vec<Entity>,
    next_id: u32,
    /// Hit transitions since the last `take_hit_signals`
    hit_signals: u32,
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitySet {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
            hit_signals: 0,
        }
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create an entity with a fresh id and add it to the set
    pub fn spawn(
        &mut self,
        world: &mut PhysicsWorld,
        kind: EntityKind,
        shape: ShapeSpec,
        position: Vec2,
    ) -> Result<EntityId, PhysicsError> {
        let id = self.next_entity_id();
        let entity = Entity::create(world, id, kind, shape, position)?;
        self.insert(entity);
        Ok(id)
    }

    pub fn insert(&mut self, entity: Entity) {
        let pos = self
            .entities
            .binary_search_by_key(&entity.id, |e| e.id)
            .unwrap_or_else(|pos| pos);
        self.entities.insert(pos, entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let idx = self.entities.binary_search_by_key(&id, |e| e.id).ok()?;
        self.entities.get(idx)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let idx = self.entities.binary_search_by_key(&id, |e| e.id).ok()?;
        self.entities.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Record an external hit signal
    pub fn signal_hit(&mut self) {
        self.hit_signals += 1;
    }

    /// Number of hit signals since the last call, resetting the count
    pub fn take_hit_signals(&mut self) -> u32 {
        std::mem::take(&mut self.hit_signals)
    }

    /// Remove every hit entity and its body; returns the removed ids in order
    pub fn remove_hit(&mut self, world: &mut PhysicsWorld) -> Vec<EntityId> {
        let (hit, live): (Vec<Entity>, Vec<Entity>) =
            std::mem::take(&mut self.entities).into_iter().partition(|e| e.hit);
        self.entities = live;

        hit.into_iter()
            .map(|entity| {
                let id = entity.id;
                log::debug!("Removing {:?} {}", entity.kind, id);
                entity.destroy(world);
                id
            })
            .collect()
    }

    /// Remove every entity of `kind` along with its body
    pub fn remove_kind(&mut self, world: &mut PhysicsWorld, kind: EntityKind) -> usize {
        let (gone, live): (Vec<Entity>, Vec<Entity>) =
            std::mem::take(&mut self.entities).into_iter().partition(|e| e.kind == kind);
        self.entities = live;

        let count = gone.len();
        for entity in gone {
            entity.destroy(world);
        }
        count
    }
}

impl ContactDispatch for EntitySet {
    /// Map both bodies back to their entities and notify each of the other
    fn begin_contact(&mut self, a: EntityId, b: EntityId) {
        let (Some(kind_a), Some(kind_b)) =
            (self.get(a).map(|e| e.kind), self.get(b).map(|e| e.kind))
        else {
            return;
        };

        for (id, kind, other) in [(a, kind_a, kind_b), (b, kind_b, kind_a)] {
            let newly_hit = self.get_mut(id).is_some_and(|e| e.on_contact(other));
            if newly_hit {
                log::debug!("{:?} {} hit by {:?}", kind, id, other);
                self.hit_signals += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::ZERO)
    }

    #[test]
    fn test_kinds_get_matching_bodies() {
        let mut world = world();
        let mut set = EntitySet::new();
        let ball = set
            .spawn(&mut world, EntityKind::Ball, ShapeSpec::circle(0.2), Vec2::new(1.0, 1.0))
            .expect("ball");
        let brick = set
            .spawn(
                &mut world,
                EntityKind::Brick,
                ShapeSpec::rectangle(Vec2::new(1.0, 0.5)),
                Vec2::new(1.0, 5.0),
            )
            .expect("brick");

        assert_eq!(world.body_count(), 2);
        assert_eq!(ball, EntityId(1));
        assert_eq!(brick, EntityId(2));
        assert_eq!(set.get(ball).map(|e| e.kind().body_type()), Some(BodyType::Dynamic));
        assert_eq!(set.count(EntityKind::Brick), 1);
    }

    #[test]
    fn test_create_invalid_shape_registers_nothing() {
        let mut world = world();
        let result = Entity::brick(&mut world, EntityId(1), Vec2::new(-1.0, 0.5), Vec2::ZERO);
        assert!(matches!(result, Err(PhysicsError::InvalidShape { .. })));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_create_world_full() {
        let mut world = world().with_max_bodies(1);
        Entity::wall(&mut world, EntityId(1), Vec2::ONE, Vec2::ZERO).expect("first");
        let result = Entity::wall(&mut world, EntityId(2), Vec2::ONE, Vec2::ONE);
        assert!(matches!(result, Err(PhysicsError::WorldFull { limit: 1 })));
    }

    #[test]
    fn test_on_contact_only_breaks_bricks() {
        let mut world = world();
        let mut brick =
            Entity::brick(&mut world, EntityId(1), Vec2::ONE, Vec2::ZERO).expect("brick");
        let mut ball =
            Entity::ball(&mut world, EntityId(2), 0.2, Vec2::new(3.0, 0.0)).expect("ball");

        assert!(!brick.on_contact(EntityKind::Wall));
        assert!(!brick.is_hit());
        assert!(!ball.on_contact(EntityKind::Brick));
        assert!(!ball.is_hit());

        assert!(brick.on_contact(EntityKind::Ball));
        assert!(brick.is_hit());
        // Redundant hits are no-ops
        assert!(!brick.on_contact(EntityKind::Ball));
        assert!(brick.is_hit());
    }

    #[test]
    fn test_dispatch_marks_brick_not_ball() {
        let mut world = world();
        let mut set = EntitySet::new();
        let ball = set
            .spawn(&mut world, EntityKind::Ball, ShapeSpec::circle(0.2), Vec2::ZERO)
            .expect("ball");
        let brick = set
            .spawn(
                &mut world,
                EntityKind::Brick,
                ShapeSpec::rectangle(Vec2::ONE),
                Vec2::new(0.0, 1.0),
            )
            .expect("brick");

        set.begin_contact(ball, brick);
        assert!(set.get(brick).is_some_and(Entity::is_hit));
        assert!(!set.get(ball).is_some_and(Entity::is_hit));
        assert_eq!(set.take_hit_signals(), 1);

        // Same pair again: already hit, no new signal
        set.begin_contact(brick, ball);
        assert_eq!(set.take_hit_signals(), 0);

        // Unknown ids are ignored
        set.begin_contact(ball, EntityId(99));
        assert_eq!(set.take_hit_signals(), 0);
    }

    #[test]
    fn test_remove_hit_destroys_bodies() {
        let mut world = world();
        let mut set = EntitySet::new();
        let ball = set
            .spawn(&mut world, EntityKind::Ball, ShapeSpec::circle(0.2), Vec2::ZERO)
            .expect("ball");
        let brick = set
            .spawn(
                &mut world,
                EntityKind::Brick,
                ShapeSpec::rectangle(Vec2::ONE),
                Vec2::new(0.0, 2.0),
            )
            .expect("brick");

        set.begin_contact(ball, brick);
        assert_eq!(set.remove_hit(&mut world), vec![brick]);
        assert!(set.get(brick).is_none());
        assert_eq!(set.len(), 1);
        assert_eq!(world.body_count(), 1);
        assert!(set.remove_hit(&mut world).is_empty());
    }

    #[test]
    fn test_ball_brick_contact_marks_exactly_one_brick() {
        let mut world = world();
        let mut set = EntitySet::new();
        let ball = set
            .spawn(&mut world, EntityKind::Ball, ShapeSpec::circle(0.2), Vec2::new(2.5, 0.0))
            .expect("ball");
        for i in 0..3 {
            set.spawn(
                &mut world,
                EntityKind::Brick,
                ShapeSpec::rectangle(Vec2::new(1.6, 0.5)),
                Vec2::new(0.7 + i as f32 * 1.8, 3.0),
            )
            .expect("brick");
        }
        if let Some(b) = set.get(ball) {
            world.set_velocity(b.body(), Vec2::new(0.0, 5.0));
        }

        let mut hit_step = None;
        for step in 0..120 {
            world.step(SIM_DT, &mut set);
            if set.of_kind(EntityKind::Brick).any(Entity::is_hit) {
                hit_step = Some(step);
                break;
            }
        }

        assert!(hit_step.is_some(), "ball never reached the bricks");
        for _ in 0..30 {
            world.step(SIM_DT, &mut set);
        }
        assert_eq!(set.of_kind(EntityKind::Brick).filter(|e| e.is_hit()).count(), 1);
        assert!(!set.get(ball).is_some_and(Entity::is_hit));
        // Ball bounced back down, speed preserved
        let vel = set.get(ball).map(|b| b.velocity(&world)).unwrap_or_default();
        assert!(vel.y < 0.0);
        assert!((vel.length() - 5.0).abs() < 0.25);
    }

    #[test]
    fn test_geometry_follows_body() {
        let mut world = world();
        let ball = Entity::ball(&mut world, EntityId(1), 0.2, Vec2::ZERO).expect("ball");
        world.set_velocity(ball.body(), Vec2::new(1.0, 0.0));

        let before = ball.geometry(&world);
        assert_eq!(before, ball.geometry(&world));

        world.step(SIM_DT, &mut ());
        let after = ball.geometry(&world);
        assert_ne!(before, after);
        assert!(after[0].x > before[0].x);
    }

    proptest! {
        #[test]
        fn geometry_read_is_pure(
            x in -50.0f32..50.0,
            y in -50.0f32..50.0,
            w in 0.01f32..10.0,
            h in 0.01f32..10.0,
        ) {
            let mut world = world();
            let brick = Entity::brick(&mut world, EntityId(1), Vec2::new(w, h), Vec2::new(x, y))
                .expect("brick");
            let first = brick.geometry(&world);
            let second = brick.geometry(&world);
            prop_assert_eq!(first.len(), 4);
            prop_assert_eq!(first, second);
        }
    }
}
