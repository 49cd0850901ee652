//! Raycast Module
//!
//! Builds the ray cast from the centre of the view each tick to find the
//! surface (terrain or connector marker) the player is aiming at.

use glam::{Quat, Vec3};

/// Forward direction for the given yaw/pitch (radians).
///
/// Yaw 0 looks down -Z, positive yaw turns towards +X, positive pitch looks up.
pub fn forward_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        -yaw.cos() * pitch.cos(),
    )
    .normalize()
}

/// Yaw-only rotation whose local -Z matches the viewer's horizontal facing.
///
/// Free-standing ghosts (aimed at terrain) use this so they stay upright and
/// face the way the player is looking.
pub fn ground_yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(-yaw)
}

/// Ray from the centre of the view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRay {
    /// Eye position in world space
    pub origin: Vec3,
    /// Normalized view direction
    pub direction: Vec3,
    /// Viewer yaw in radians, kept for ground-aligned placement
    pub yaw: f32,
}

impl ViewRay {
    pub fn from_angles(origin: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            origin,
            direction: forward_from_angles(yaw, pitch),
            yaw,
        }
    }

    /// Ray from `origin` towards `target`. Yaw is derived from the
    /// horizontal component of the direction.
    pub fn looking_at(origin: Vec3, target: Vec3) -> Self {
        let direction = (target - origin).normalize_or_zero();
        let yaw = direction.x.atan2(-direction.z);
        Self {
            origin,
            direction,
            yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_forward_default_looks_down_negative_z() {
        let f = forward_from_angles(0.0, 0.0);
        assert!((f - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_ground_rotation_matches_forward() {
        for yaw in [0.0, 0.5, FRAC_PI_2, -2.0] {
            let rotated = ground_yaw_rotation(yaw) * Vec3::NEG_Z;
            let forward = forward_from_angles(yaw, 0.0);
            assert!((rotated - forward).length() < 1e-5, "yaw {yaw}");
        }
    }

    #[test]
    fn test_looking_at_recovers_yaw() {
        let ray = ViewRay::looking_at(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert!((ray.yaw - FRAC_PI_2).abs() < 1e-5);
        assert!((ray.direction - Vec3::X).length() < 1e-6);
    }
}
