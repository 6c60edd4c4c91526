//! Simulation module
//!
//! Everything that touches the physics engine lives here:
//! - Fixed timestep only
//! - Stable iteration order (by entity ID)
//! - Contacts flag entities; removal happens after the step
//! - No rendering or platform dependencies beyond draw commands

pub mod controller;
pub mod entity;
pub mod level;
pub mod shape;
pub mod state;
pub mod world;

pub use controller::GameController;
pub use entity::{Entity, EntityId, EntityKind, EntitySet};
pub use level::Level;
pub use shape::ShapeSpec;
pub use state::{GamePhase, Snapshot};
pub use world::{
    BodyDesc, BodyHandle, BodyType, ContactDispatch, ContactEvent, ListenerId, PhysicsWorld,
};
