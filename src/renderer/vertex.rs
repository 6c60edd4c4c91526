//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

use crate::sim::EntityKind;

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Position at location 0, color at location 1
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    /// Buffer layout for the host's pipeline; matches what `project` emits
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const BALL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const PADDLE: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    pub const BRICK: [f32; 4] = [0.4, 0.7, 1.0, 1.0];
    pub const WALL: [f32; 4] = [0.3, 0.3, 0.4, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
}

/// Fill color for an entity kind
pub fn color_for(kind: EntityKind) -> [f32; 4] {
    match kind {
        EntityKind::Ball => colors::BALL,
        EntityKind::Player => colors::PADDLE,
        EntityKind::Brick => colors::BRICK,
        EntityKind::Wall => colors::WALL,
    }
}
