//! Draw commands handed to the graphics layer

use glam::Mat4;

use super::vertex::Vertex;
use crate::sim::{EntityId, EntityKind};

/// One draw call: an entity's triangles in world space plus the frame transform
#[derive(Debug, Clone, Copy)]
pub struct DrawCommand<'a> {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub vertices: &'a [Vertex],
    pub transform: &'a Mat4,
}

/// Consumer of draw commands (GPU backend, recorder, CPU rasteriser...)
pub trait DrawSink {
    fn draw(&mut self, command: DrawCommand<'_>);
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub vertices: Vec<Vertex>,
    pub transform: Mat4,
}

/// Sink that keeps copies of every draw command, in order
#[derive(Debug, Clone, Default)]
pub struct DrawRecorder {
    pub draws: Vec<RecordedDraw>,
}

impl DrawRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.draws.clear();
    }

    /// All vertices of the frame, concatenated in draw order
    pub fn vertices(&self) -> Vec<Vertex> {
        self.draws
            .iter()
            .flat_map(|d| d.vertices.iter().copied())
            .collect()
    }
}

impl DrawSink for DrawRecorder {
    fn draw(&mut self, command: DrawCommand<'_>) {
        self.draws.push(RecordedDraw {
            entity: command.entity,
            kind: command.kind,
            vertices: command.vertices.to_vec(),
            transform: *command.transform,
        });
    }
}
