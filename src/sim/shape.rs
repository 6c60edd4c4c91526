//! Shape specifications for collidable bodies
//!
//! A shape is described in body-local space, centred on the body origin:
//! - Rectangle: full width and height
//! - Circle: radius
//!
//! Outlines are recomputed from the current body transform on every call.

use glam::{Mat2, Vec2};
use serde::{Deserialize, Serialize};

use crate::consts::CIRCLE_SEGMENTS;
use crate::error::PhysicsError;

/// Geometric shape attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeSpec {
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl ShapeSpec {
    pub fn rectangle(size: Vec2) -> Self {
        ShapeSpec::Rectangle {
            width: size.x,
            height: size.y,
        }
    }

    pub fn circle(radius: f32) -> Self {
        ShapeSpec::Circle { radius }
    }

    /// Reject degenerate dimensions
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let check = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PhysicsError::InvalidShape {
                    reason: format!("{name} must be positive and finite, got {value}"),
                })
            }
        };

        match *self {
            ShapeSpec::Rectangle { width, height } => {
                check("width", width)?;
                check("height", height)
            }
            ShapeSpec::Circle { radius } => check("radius", radius),
        }
    }

    /// Half extents of the axis-aligned local bounding box
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            ShapeSpec::Rectangle { width, height } => Vec2::new(width, height) / 2.0,
            ShapeSpec::Circle { radius } => Vec2::splat(radius),
        }
    }

    /// Outline vertices in world space, counter-clockwise
    ///
    /// Rectangles yield their 4 corners starting bottom-left; circles yield
    /// `CIRCLE_SEGMENTS` points starting at angle 0.
    pub fn outline(&self, position: Vec2, rotation: f32) -> Vec<Vec2> {
        let rot = Mat2::from_angle(rotation);
        let local: Vec<Vec2> = match *self {
            ShapeSpec::Rectangle { .. } => {
                let h = self.half_extents();
                vec![
                    Vec2::new(-h.x, -h.y),
                    Vec2::new(h.x, -h.y),
                    Vec2::new(h.x, h.y),
                    Vec2::new(-h.x, h.y),
                ]
            }
            ShapeSpec::Circle { radius } => (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let theta = (i as f32 / CIRCLE_SEGMENTS as f32) * std::f32::consts::TAU;
                    Vec2::new(radius * theta.cos(), radius * theta.sin())
                })
                .collect(),
        };

        local.into_iter().map(|p| position + rot * p).collect()
    }
}
