//! Position, rotation and scale of an entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Placement of an entity in world space.
///
/// Every entity owns exactly one transform. It is a field of the entity
/// rather than a removable component, so it always exists and is always
/// visited before any component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    /// Rotation in radians, clockwise in screen space.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn rotate(&mut self, radians: f32) {
        self.rotation += radians;
    }

    /// Map a point from local space into world space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        Vec2::from_angle(self.rotation).rotate(local * self.scale) + self.position
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec2::ZERO);
        assert_eq!(t.scale, Vec2::ONE);
        assert_eq!(t.transform_point(Vec2::new(3.0, 4.0)), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn transform_point_scales_rotates_then_translates() {
        let t = Transform {
            position: Vec2::new(10.0, 0.0),
            rotation: std::f32::consts::FRAC_PI_2,
            scale: Vec2::splat(2.0),
        };
        let p = t.transform_point(Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(10.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn serde_roundtrip() {
        let t = Transform::from_position(Vec2::new(1.5, -2.0));
        let json = serde_json::to_string(&t).unwrap();
        let back: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
