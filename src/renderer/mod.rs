//! Rendering side of the game core
//!
//! Turns entity geometry into vertex lists and hands them to a [`DrawSink`].
//! Pipeline and surface setup belong to the host's graphics layer.

pub mod draw;
pub mod shapes;
pub mod vertex;

pub use draw::{DrawCommand, DrawRecorder, DrawSink, RecordedDraw};
pub use vertex::{Vertex, color_for, colors};
