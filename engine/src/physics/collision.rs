//! Collision detection module
//!
//! Pure intersection math for the two primitive shapes building pieces and
//! connector markers are made of: oriented boxes and spheres.
//!
//! # Ray-AABB Intersection
//!
//! The slab method is used for ray-AABB intersection, which finds the
//! intersection points by computing entry and exit times for each axis.
//! Oriented boxes reuse it after moving the ray into the box's local frame.
//!
//! # Box-Box Overlap
//!
//! Oriented boxes are tested with the separating axis theorem: 3 face axes
//! per box plus the 9 edge cross products.
//!
//! # Example
//!
//! ```ignore
//! use homestead_engine::physics::collision::{ray_aabb_intersect, Shape};
//! use glam::Vec3;
//!
//! let origin = Vec3::new(0.0, 0.0, -5.0);
//! let direction = Vec3::new(0.0, 0.0, 1.0);
//!
//! if let Some(t) = ray_aabb_intersect(origin, direction, Vec3::splat(-1.0), Vec3::splat(1.0)) {
//!     println!("Hit at distance {}", t);
//! }
//!
//! let cube = Shape::cube(Vec3::splat(0.5));
//! assert!(cube.shrunk(0.1) == Shape::cube(Vec3::splat(0.4)));
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::Pose;

/// Cross products shorter than this are treated as parallel edges.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Primitive collision shape, centred on the pose it is placed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Oriented box with half-extents along the pose's local axes
    Box { half_extents: Vec3 },
    /// Sphere with radius
    Sphere { radius: f32 },
}

impl Shape {
    pub fn cube(half_extents: Vec3) -> Self {
        Shape::Box { half_extents }
    }

    pub fn sphere(radius: f32) -> Self {
        Shape::Sphere { radius }
    }

    /// Shrink the shape uniformly by `skin`, never below zero.
    pub fn shrunk(&self, skin: f32) -> Self {
        match *self {
            Shape::Box { half_extents } => Shape::Box {
                half_extents: (half_extents - Vec3::splat(skin)).max(Vec3::ZERO),
            },
            Shape::Sphere { radius } => Shape::Sphere {
                radius: (radius - skin).max(0.0),
            },
        }
    }

    /// World-space bounds of this shape placed at `pose`.
    pub fn bounding_aabb(&self, pose: &Pose) -> AABB {
        match *self {
            Shape::Box { half_extents } => {
                let corners = [
                    Vec3::new(-1.0, -1.0, -1.0),
                    Vec3::new(1.0, -1.0, -1.0),
                    Vec3::new(-1.0, 1.0, -1.0),
                    Vec3::new(1.0, 1.0, -1.0),
                    Vec3::new(-1.0, -1.0, 1.0),
                    Vec3::new(1.0, -1.0, 1.0),
                    Vec3::new(-1.0, 1.0, 1.0),
                    Vec3::new(1.0, 1.0, 1.0),
                ];

                let mut min = Vec3::splat(f32::MAX);
                let mut max = Vec3::splat(f32::MIN);

                for corner in corners {
                    let world_corner = pose.transform_point(corner * half_extents);
                    min = min.min(world_corner);
                    max = max.max(world_corner);
                }

                AABB { min, max }
            }
            Shape::Sphere { radius } => AABB {
                min: pose.position - Vec3::splat(radius),
                max: pose.position + Vec3::splat(radius),
            },
        }
    }

    /// Cast a ray against this shape.
    ///
    /// Returns the distance along the (normalized) ray and the outward
    /// world-space surface normal at the hit point.
    pub fn ray_cast(&self, pose: &Pose, ray_origin: Vec3, ray_dir: Vec3) -> Option<(f32, Vec3)> {
        match *self {
            Shape::Box { half_extents } => {
                let local_origin = pose.inverse_transform_point(ray_origin);
                let local_dir = pose.inverse_transform_vector(ray_dir);
                let t = ray_aabb_intersect(local_origin, local_dir, -half_extents, half_extents)?;
                let local_hit = local_origin + local_dir * t;
                let local_normal = aabb_surface_normal(local_hit, -half_extents, half_extents);
                Some((t, pose.rotation * local_normal))
            }
            Shape::Sphere { radius } => {
                let t = ray_sphere_intersect(ray_origin, ray_dir, pose.position, radius)?;
                let normal = (ray_origin + ray_dir * t - pose.position).normalize_or_zero();
                Some((t, normal))
            }
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if two AABBs overlap (touching counts)
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Performs ray-AABB (Axis-Aligned Bounding Box) intersection test using the slab method.
///
/// # Arguments
///
/// * `ray_origin` - Starting point of the ray
/// * `ray_dir` - Direction of the ray (must be normalized)
/// * `aabb_min` - Minimum corner of the AABB
/// * `aabb_max` - Maximum corner of the AABB
///
/// # Returns
///
/// * `Some(t)` - Distance along the ray to the intersection point (t >= 0)
/// * `None` - No intersection or intersection is behind the ray origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    // Handle near-zero directions by using large values
    let inv_dir = Vec3::new(
        if ray_dir.x.abs() > 1e-10 { 1.0 / ray_dir.x } else { f32::MAX * ray_dir.x.signum() },
        if ray_dir.y.abs() > 1e-10 { 1.0 / ray_dir.y } else { f32::MAX * ray_dir.y.signum() },
        if ray_dir.z.abs() > 1e-10 { 1.0 / ray_dir.z } else { f32::MAX * ray_dir.z.signum() },
    );

    let t1 = (aabb_min.x - ray_origin.x) * inv_dir.x;
    let t2 = (aabb_max.x - ray_origin.x) * inv_dir.x;

    let mut t_min = t1.min(t2);
    let mut t_max = t1.max(t2);

    let t3 = (aabb_min.y - ray_origin.y) * inv_dir.y;
    let t4 = (aabb_max.y - ray_origin.y) * inv_dir.y;

    t_min = t_min.max(t3.min(t4));
    t_max = t_max.min(t3.max(t4));

    let t5 = (aabb_min.z - ray_origin.z) * inv_dir.z;
    let t6 = (aabb_max.z - ray_origin.z) * inv_dir.z;

    t_min = t_min.max(t5.min(t6));
    t_max = t_max.min(t5.max(t6));

    if t_max >= t_min && t_max >= 0.0 {
        if t_min >= 0.0 {
            Some(t_min)
        } else {
            // Ray starts inside the AABB
            Some(t_max)
        }
    } else {
        None
    }
}

/// Computes the outward normal of the AABB face nearest to `point`.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(1e-6));
    let local = point - center;

    // Normalize to unit cube space
    let normalized = local / half_extents;
    let abs_normalized = normalized.abs();

    if abs_normalized.x >= abs_normalized.y && abs_normalized.x >= abs_normalized.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs_normalized.y >= abs_normalized.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}

/// Ray-sphere intersection. Returns the nearest non-negative distance.
pub fn ray_sphere_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    radius: f32,
) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.length_squared() - radius * radius;

    // Origin inside the sphere
    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

/// Overlap test between two placed shapes. Touching surfaces count as overlap.
pub fn shapes_overlap(a: &Shape, pose_a: &Pose, b: &Shape, pose_b: &Pose) -> bool {
    match (*a, *b) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            let reach = ra + rb;
            pose_a.position.distance_squared(pose_b.position) <= reach * reach
        }
        (Shape::Sphere { radius }, _) => sphere_overlaps_shape(pose_a.position, radius, b, pose_b),
        (_, Shape::Sphere { radius }) => sphere_overlaps_shape(pose_b.position, radius, a, pose_a),
        (Shape::Box { half_extents: ha }, Shape::Box { half_extents: hb }) => {
            obb_overlap(ha, pose_a, hb, pose_b)
        }
    }
}

/// Overlap test between a world-space sphere and a placed shape.
pub fn sphere_overlaps_shape(center: Vec3, radius: f32, shape: &Shape, pose: &Pose) -> bool {
    match *shape {
        Shape::Sphere { radius: other } => {
            let reach = radius + other;
            center.distance_squared(pose.position) <= reach * reach
        }
        Shape::Box { half_extents } => {
            let local = pose.inverse_transform_point(center);
            let closest = local.clamp(-half_extents, half_extents);
            closest.distance_squared(local) <= radius * radius
        }
    }
}

/// Separating axis test for two oriented boxes.
fn obb_overlap(ha: Vec3, pose_a: &Pose, hb: Vec3, pose_b: &Pose) -> bool {
    let axes_a = [pose_a.rotation * Vec3::X, pose_a.rotation * Vec3::Y, pose_a.rotation * Vec3::Z];
    let axes_b = [pose_b.rotation * Vec3::X, pose_b.rotation * Vec3::Y, pose_b.rotation * Vec3::Z];
    let offset = pose_b.position - pose_a.position;

    let separated_on = |axis: Vec3| -> bool {
        let ra = ha.x * axes_a[0].dot(axis).abs()
            + ha.y * axes_a[1].dot(axis).abs()
            + ha.z * axes_a[2].dot(axis).abs();
        let rb = hb.x * axes_b[0].dot(axis).abs()
            + hb.y * axes_b[1].dot(axis).abs()
            + hb.z * axes_b[2].dot(axis).abs();
        offset.dot(axis).abs() > ra + rb
    };

    for axis in axes_a.iter().chain(axes_b.iter()) {
        if separated_on(*axis) {
            return false;
        }
    }

    for a in &axes_a {
        for b in &axes_b {
            let cross = a.cross(*b);
            if cross.length_squared() < PARALLEL_EPSILON {
                continue;
            }
            if separated_on(cross.normalize()) {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_ray_aabb_hits_front_face() {
        let t = ray_aabb_intersect(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::Z,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert_eq!(t, Some(4.0));
    }

    #[test]
    fn test_ray_aabb_miss_behind() {
        let t = ray_aabb_intersect(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::Z,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert!(t.is_none());
    }

    #[test]
    fn test_ray_cast_rotated_box_normal() {
        let shape = Shape::cube(Vec3::new(2.0, 0.5, 0.5));
        let pose = Pose::from_yaw(Vec3::ZERO, std::f32::consts::FRAC_PI_2);
        // Long axis now lies along Z
        let (t, normal) = shape
            .ray_cast(&pose, Vec3::new(0.0, 0.0, -10.0), Vec3::Z)
            .expect("ray should hit the rotated box");
        assert!((t - 8.0).abs() < 1e-4);
        assert!((normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn test_ray_sphere() {
        let t = ray_sphere_intersect(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert!((t.unwrap() - 4.0).abs() < 1e-5);
        let miss = ray_sphere_intersect(Vec3::new(-5.0, 3.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert!(miss.is_none());
    }

    #[test]
    fn test_obb_rotated_corner_does_not_reach() {
        let a = Shape::cube(Vec3::splat(0.5));
        let pose_a = Pose::IDENTITY;
        let pose_b = Pose::from_yaw(Vec3::new(1.3, 0.0, 0.0), FRAC_PI_4);
        // Rotated corner reaches 1.3 - 0.707 = 0.593 > 0.5
        assert!(!shapes_overlap(&a, &pose_a, &a, &pose_b));

        let pose_c = Pose::from_yaw(Vec3::new(1.1, 0.0, 0.0), FRAC_PI_4);
        assert!(shapes_overlap(&a, &pose_a, &a, &pose_c));
    }

    #[test]
    fn test_shrunk_boxes_sharing_a_face_do_not_overlap() {
        let a = Shape::cube(Vec3::splat(1.5));
        let pose_b = Pose::from_position(Vec3::new(3.0, 0.0, 0.0));
        assert!(shapes_overlap(&a, &Pose::IDENTITY, &a, &pose_b));
        assert!(!shapes_overlap(&a.shrunk(0.05), &Pose::IDENTITY, &a, &pose_b));
    }

    #[test]
    fn test_sphere_box_overlap() {
        let cube = Shape::cube(Vec3::splat(1.0));
        assert!(sphere_overlaps_shape(Vec3::new(1.4, 0.0, 0.0), 0.5, &cube, &Pose::IDENTITY));
        assert!(!sphere_overlaps_shape(Vec3::new(1.6, 0.0, 0.0), 0.5, &cube, &Pose::IDENTITY));
    }

    #[test]
    fn test_aabb_intersection() {
        let a = AABB::new(Vec3::ZERO, Vec3::ONE);
        let b = AABB::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = AABB::new(Vec3::splat(2.0), Vec3::splat(3.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
