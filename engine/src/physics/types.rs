//! Rigid poses
//!
//! Core mathematical types used throughout the physics and building code,
//! re-exported from glam, plus the position/rotation pair every collider,
//! piece and connector is placed with.

pub use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position + rotation in world (or parent-local) space. No scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Pose rotated about +Y by `angle` radians.
    pub fn from_yaw(position: Vec3, angle: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(angle),
        }
    }

    /// Compose a child pose expressed in this pose's frame into world space.
    pub fn mul_pose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// Transform a point from this pose's local frame into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Transform a world-space point into this pose's local frame.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Rotate a world-space direction into this pose's local frame.
    pub fn inverse_transform_vector(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_mul_pose_applies_parent_rotation() {
        let parent = Pose::from_yaw(Vec3::new(10.0, 0.0, 0.0), FRAC_PI_2);
        let child = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));
        let world = parent.mul_pose(&child);

        // +X rotated 90 degrees about Y points to -Z
        assert!((world.position - Vec3::new(10.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_inverse_transform_round_trip() {
        let pose = Pose::from_yaw(Vec3::new(2.0, 1.0, -3.0), 0.7);
        let p = Vec3::new(0.3, -0.4, 5.0);
        let back = pose.inverse_transform_point(pose.transform_point(p));
        assert!((back - p).length() < 1e-5);
    }
}
