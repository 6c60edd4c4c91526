//! Triangle generation for entity outlines

use glam::{Mat4, Vec2};

use super::vertex::Vertex;

/// Triangle list filling a convex outline
///
/// Fans from the outline's centroid, so circles get even wedges and
/// rectangles get four triangles meeting in the middle.
pub fn convex_fill(outline: &[Vec2], color: [f32; 4]) -> Vec<Vertex> {
    if outline.len() < 3 {
        return Vec::new();
    }

    let center = outline.iter().copied().sum::<Vec2>() / outline.len() as f32;
    let mut vertices = Vec::with_capacity(outline.len() * 3);

    for (i, p1) in outline.iter().enumerate() {
        let p2 = outline[(i + 1) % outline.len()];

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(p1.x, p1.y, color));
        vertices.push(Vertex::new(p2.x, p2.y, color));
    }

    vertices
}

/// Apply a projection/model-view matrix to vertex positions on the CPU
pub fn project(vertices: &[Vertex], transform: &Mat4) -> Vec<Vertex> {
    vertices
        .iter()
        .map(|v| {
            let p = transform.project_point3(Vec2::from(v.position).extend(0.0));
            Vertex::new(p.x, p.y, v.color)
        })
        .collect()
}
