//! Physics world wrapper
//!
//! Wraps the rapier2d boilerplate: body/collider arenas, the pipeline, and a
//! fixed-timestep accumulator. Begin-contact events are resolved back to
//! entity ids (stored in body user data) and dispatched synchronously after
//! every substep.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use glam::Vec2;
use rapier2d::na;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::shape::ShapeSpec;
use crate::config::GameConfig;
use crate::consts::*;
use crate::error::PhysicsError;

fn to_na(v: Vec2) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.y)
}

fn from_na(v: &na::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves (bricks, walls)
    Static,
    /// Moved directly by position (paddle)
    Kinematic,
    /// Moved by the solver (ball)
    Dynamic,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
            BodyType::Dynamic => RigidBodyType::Dynamic,
        }
    }
}

/// Description of a body before creation
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub shape: ShapeSpec,
    pub position: Vec2,
    pub velocity: Vec2,
    pub restitution: f32,
    pub restitution_rule: CoefficientCombineRule,
    pub friction: f32,
    pub friction_rule: CoefficientCombineRule,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    pub ccd: bool,
}

impl BodyDesc {
    pub fn new(body_type: BodyType, shape: ShapeSpec, position: Vec2) -> Self {
        Self {
            body_type,
            shape,
            position,
            velocity: Vec2::ZERO,
            restitution: 0.0,
            restitution_rule: CoefficientCombineRule::Average,
            friction: 0.0,
            friction_rule: CoefficientCombineRule::Average,
            gravity_scale: 1.0,
            fixed_rotation: true,
            ccd: false,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    /// Restitution and how it combines with the other collider's
    pub fn with_restitution(mut self, restitution: f32, rule: CoefficientCombineRule) -> Self {
        self.restitution = restitution;
        self.restitution_rule = rule;
        self
    }

    pub fn with_friction(mut self, friction: f32, rule: CoefficientCombineRule) -> Self {
        self.friction = friction;
        self.friction_rule = rule;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    fn build_collider(&self) -> ColliderBuilder {
        match self.shape {
            ShapeSpec::Rectangle { width, height } => {
                ColliderBuilder::cuboid(width / 2.0, height / 2.0)
            }
            ShapeSpec::Circle { radius } => ColliderBuilder::ball(radius),
        }
    }
}

/// Handle pair held by an entity; the bodies themselves live in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyHandle {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Two entities whose colliders began touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub a: EntityId,
    pub b: EntityId,
}

/// Receives begin-contact events synchronously while the world steps
pub trait ContactDispatch {
    fn begin_contact(&mut self, a: EntityId, b: EntityId);
}

/// Stepping with no entity dispatch
impl ContactDispatch for () {
    fn begin_contact(&mut self, _a: EntityId, _b: EntityId) {}
}

/// Registration token for a contact listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

type ContactListener = Box<dyn FnMut(&ContactEvent)>;

/// Collects collider pairs from the pipeline; rapier requires `Sync` here
struct StartedCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl StartedCollector {
    fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *started)
    }
}

impl EventHandler for StartedCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _) = event {
            self.started
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((h1, h2));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

/// Owns every body of a level and steps the simulation
pub struct PhysicsWorld {
    gravity: na::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: StartedCollector,
    /// Unsimulated frame time (seconds)
    accumulator: f32,
    max_bodies: usize,
    /// Contact events since the last drain
    contacts: Vec<ContactEvent>,
    listeners: Vec<(ListenerId, ContactListener)>,
    next_listener: u32,
    step_count: u64,
}

impl PhysicsWorld {
    /// Create a world with the given gravity and default step settings
    pub fn new(gravity: Vec2) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = SIM_DT;
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(SOLVER_ITERATIONS).unwrap_or(NonZeroUsize::MIN);

        Self {
            gravity: to_na(gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: StartedCollector::new(),
            accumulator: 0.0,
            max_bodies: MAX_BODIES,
            contacts: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            step_count: 0,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.gravity)
            .with_fixed_dt(config.fixed_dt)
            .with_solver_iterations(config.solver_iterations)
            .with_max_bodies(config.max_bodies)
    }

    pub fn with_fixed_dt(mut self, dt: f32) -> Self {
        if dt.is_finite() && dt > 0.0 {
            self.integration_parameters.dt = dt;
        }
        self
    }

    pub fn with_solver_iterations(mut self, iterations: usize) -> Self {
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(iterations).unwrap_or(NonZeroUsize::MIN);
        self
    }

    pub fn with_max_bodies(mut self, max_bodies: usize) -> Self {
        self.max_bodies = max_bodies;
        self
    }

    pub fn fixed_dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    pub fn gravity(&self) -> Vec2 {
        from_na(&self.gravity)
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Total fixed substeps taken since creation
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Create a rigid body + collider for `entity`
    ///
    /// The entity id is stored in the body's user data for contact lookups.
    pub fn create_body(
        &mut self,
        entity: EntityId,
        desc: &BodyDesc,
    ) -> Result<BodyHandle, PhysicsError> {
        desc.shape.validate()?;
        if self.bodies.len() >= self.max_bodies {
            return Err(PhysicsError::WorldFull {
                limit: self.max_bodies,
            });
        }

        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(to_na(desc.position))
            .linvel(to_na(desc.velocity))
            .gravity_scale(desc.gravity_scale)
            .locked_axes(if desc.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            })
            .ccd_enabled(desc.ccd)
            .user_data(entity.0 as u128)
            .build();
        let body = self.bodies.insert(rb);

        let collider = desc
            .build_collider()
            .restitution(desc.restitution)
            .restitution_combine_rule(desc.restitution_rule)
            .friction(desc.friction)
            .friction_combine_rule(desc.friction_rule)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        Ok(BodyHandle { body, collider })
    }

    /// Remove a body and its collider; false if it was already gone
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies
            .remove(
                handle.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.body)
    }

    /// Advance the simulation by `dt` seconds of frame time
    ///
    /// Runs whole fixed substeps only; the remainder carries into the next
    /// call. Returns the number of substeps taken.
    pub fn step(&mut self, dt: f32, dispatch: &mut dyn ContactDispatch) -> u32 {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;

        let fixed_dt = self.fixed_dt();
        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < MAX_SUBSTEPS {
            self.step_once(dispatch);
            self.accumulator -= fixed_dt;
            substeps += 1;
        }

        if self.accumulator >= fixed_dt {
            log::warn!(
                "Dropping {:.3}s of simulation backlog after {} substeps",
                self.accumulator - self.accumulator % fixed_dt,
                substeps
            );
            self.accumulator %= fixed_dt;
        }

        substeps
    }

    fn step_once(&mut self, dispatch: &mut dyn ContactDispatch) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );
        self.step_count += 1;

        for (h1, h2) in self.collector.drain() {
            let (Some(a), Some(b)) = (self.collider_entity(h1), self.collider_entity(h2)) else {
                continue;
            };
            log::debug!("Contact began: {} <-> {}", a, b);

            let event = ContactEvent { a, b };
            dispatch.begin_contact(a, b);
            for (_, listener) in &mut self.listeners {
                listener(&event);
            }
            self.contacts.push(event);
        }
    }

    /// Register an observer called for every begin-contact event during `step`
    pub fn register_contact_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ContactEvent) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not registered
    pub fn unregister_contact_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn clear_contact_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Take the contact events accumulated since the last drain
    pub fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    pub fn position(&self, handle: BodyHandle) -> Vec2 {
        self.bodies
            .get(handle.body)
            .map(|rb| from_na(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn rotation(&self, handle: BodyHandle) -> f32 {
        self.bodies
            .get(handle.body)
            .map(|rb| rb.rotation().angle())
            .unwrap_or(0.0)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Vec2 {
        self.bodies
            .get(handle.body)
            .map(|rb| from_na(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_linvel(to_na(vel), true);
        }
    }

    /// Teleport a body, clearing its velocity
    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_translation(to_na(pos), true);
            rb.set_linvel(na::Vector2::zeros(), true);
        }
    }

    /// Target position for a kinematic body, reached at the next substep
    pub fn set_kinematic_target(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_next_kinematic_translation(to_na(pos));
        }
    }

    fn collider_entity(&self, handle: ColliderHandle) -> Option<EntityId> {
        let collider = self.colliders.get(handle)?;
        let body = self.bodies.get(collider.parent()?)?;
        Some(EntityId(body.user_data as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder(Vec<(EntityId, EntityId)>);

    impl ContactDispatch for Recorder {
        fn begin_contact(&mut self, a: EntityId, b: EntityId) {
            self.0.push((a, b));
        }
    }

    fn ball_desc(pos: Vec2, vel: Vec2) -> BodyDesc {
        BodyDesc::new(BodyType::Dynamic, ShapeSpec::circle(0.25), pos)
            .with_velocity(vel)
            .with_gravity_scale(0.0)
    }

    fn box_desc(pos: Vec2) -> BodyDesc {
        BodyDesc::new(BodyType::Static, ShapeSpec::rectangle(Vec2::new(2.0, 0.5)), pos)
    }

    #[test]
    fn test_create_and_remove_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world
            .create_body(EntityId(1), &ball_desc(Vec2::ZERO, Vec2::ZERO))
            .expect("body");
        assert_eq!(world.body_count(), 1);
        assert!(world.contains(body));

        assert!(world.remove_body(body));
        assert_eq!(world.body_count(), 0);
        assert!(!world.remove_body(body));
    }

    #[test]
    fn test_create_body_errors() {
        let mut world = PhysicsWorld::new(Vec2::ZERO).with_max_bodies(1);
        let degenerate = BodyDesc::new(BodyType::Static, ShapeSpec::circle(0.0), Vec2::ZERO);
        assert!(matches!(
            world.create_body(EntityId(1), &degenerate),
            Err(PhysicsError::InvalidShape { .. })
        ));
        assert_eq!(world.body_count(), 0);

        world.create_body(EntityId(1), &box_desc(Vec2::ZERO)).expect("first");
        assert_eq!(
            world.create_body(EntityId(2), &box_desc(Vec2::ONE)),
            Err(PhysicsError::WorldFull { limit: 1 })
        );
    }

    #[test]
    fn test_gravity_scale() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
        let falling = world
            .create_body(
                EntityId(1),
                &BodyDesc::new(BodyType::Dynamic, ShapeSpec::circle(0.25), Vec2::ZERO),
            )
            .expect("falling");
        let floating = world
            .create_body(EntityId(2), &ball_desc(Vec2::new(5.0, 0.0), Vec2::ZERO))
            .expect("floating");

        for _ in 0..10 {
            world.step(SIM_DT, &mut ());
        }

        assert!(world.position(falling).y < 0.0);
        assert_eq!(world.position(floating), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_accumulator_carries_remainder() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        assert_eq!(world.step(SIM_DT / 2.0, &mut ()), 0);
        assert!(world.accumulator() > 0.0);
        assert_eq!(world.step(SIM_DT / 2.0, &mut ()), 1);
        assert_eq!(world.step_count(), 1);

        // Huge frame deltas are clamped, never more than MAX_SUBSTEPS
        let substeps = world.step(5.0, &mut ());
        assert!(substeps > 0 && substeps <= MAX_SUBSTEPS);
        assert!(world.accumulator() < world.fixed_dt());

        // Garbage input doesn't advance anything
        assert_eq!(world.step(f32::NAN, &mut ()), 0);
        assert_eq!(world.step(-1.0, &mut ()), 0);
    }

    #[test]
    fn test_backlog_is_dropped() {
        let mut world = PhysicsWorld::new(Vec2::ZERO).with_fixed_dt(1.0 / 240.0);
        let substeps = world.step(MAX_FRAME_DT, &mut ());
        assert_eq!(substeps, MAX_SUBSTEPS);
        assert!(world.accumulator() < world.fixed_dt());
    }

    #[test]
    fn test_contact_dispatch_and_listeners() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world
            .create_body(EntityId(1), &ball_desc(Vec2::ZERO, Vec2::new(0.0, 5.0)))
            .expect("ball");
        world
            .create_body(EntityId(2), &box_desc(Vec2::new(0.0, 1.0)))
            .expect("box");

        let heard = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&heard);
        let listener = world.register_contact_listener(move |event| sink.borrow_mut().push(*event));

        let mut recorder = Recorder::default();
        for _ in 0..60 {
            world.step(SIM_DT, &mut recorder);
            if !recorder.0.is_empty() {
                break;
            }
        }

        assert_eq!(recorder.0.len(), 1);
        let (a, b) = recorder.0[0];
        let mut pair = [a.0, b.0];
        pair.sort_unstable();
        assert_eq!(pair, [1, 2]);

        assert_eq!(heard.borrow().len(), 1);
        assert_eq!(world.drain_contacts().len(), 1);
        assert!(world.drain_contacts().is_empty());

        assert!(world.unregister_contact_listener(listener));
        assert!(!world.unregister_contact_listener(listener));
        assert_eq!(world.listener_count(), 0);
    }

    #[test]
    fn test_kinematic_target_applied_on_step() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let paddle = world
            .create_body(
                EntityId(1),
                &BodyDesc::new(
                    BodyType::Kinematic,
                    ShapeSpec::rectangle(Vec2::new(2.0, 0.3)),
                    Vec2::new(5.0, 1.0),
                ),
            )
            .expect("paddle");

        world.set_kinematic_target(paddle, Vec2::new(3.0, 1.0));
        assert_eq!(world.position(paddle), Vec2::new(5.0, 1.0));
        world.step(SIM_DT, &mut ());
        assert!((world.position(paddle) - Vec2::new(3.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let ball = world
                .create_body(EntityId(1), &ball_desc(Vec2::ZERO, Vec2::new(1.5, 5.0)))
                .expect("ball");
            world
                .create_body(EntityId(2), &box_desc(Vec2::new(0.5, 2.0)))
                .expect("box");
            for _ in 0..120 {
                world.step(SIM_DT, &mut ());
            }
            (world.position(ball), world.velocity(ball))
        };

        assert_eq!(run(), run());
    }
}
