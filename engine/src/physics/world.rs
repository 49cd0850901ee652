//! In-memory collision world
//!
//! Brute-force implementation of [`SpatialQuery`] and [`ColliderRegistry`].
//! Every query walks every collider after a cheap layer/AABB reject, which is
//! plenty for the few hundred pieces a player base reaches.

use std::collections::BTreeMap;

use glam::Vec3;

use super::collision::{AABB, Shape, shapes_overlap, sphere_overlaps_shape};
use super::query::{
    ColliderDesc, ColliderHandle, ColliderInfo, ColliderRegistry, Layers, RayHit, SpatialQuery,
};
use super::types::Pose;

#[derive(Debug, Clone)]
struct Collider {
    desc: ColliderDesc,
    bounds: AABB,
}

/// Collider store keyed by handle. Iteration is in handle order, so query
/// results are deterministic.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    colliders: BTreeMap<ColliderHandle, Collider>,
    next_handle: u32,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flat slab of terrain whose top surface sits at `ground_y`.
    pub fn add_ground_slab(&mut self, center_xz: Vec3, half_size: f32, ground_y: f32) -> ColliderHandle {
        let thickness = 1.0;
        self.insert(ColliderDesc::new(
            Shape::cube(Vec3::new(half_size, thickness * 0.5, half_size)),
            Pose::from_position(Vec3::new(center_xz.x, ground_y - thickness * 0.5, center_xz.z)),
            Layers::TERRAIN,
        ))
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Number of enabled colliders on any layer in `mask`.
    pub fn count_enabled(&self, mask: Layers) -> usize {
        self.active(mask).count()
    }

    fn active(&self, mask: Layers) -> impl Iterator<Item = (&ColliderHandle, &Collider)> {
        self.colliders
            .iter()
            .filter(move |(_, c)| c.desc.enabled && mask.intersects(c.desc.layer))
    }
}

impl SpatialQuery for CollisionWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Layers) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for (handle, collider) in self.active(mask) {
            let Some((distance, normal)) = collider.desc.shape.ray_cast(&collider.desc.pose, origin, direction) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            if best.is_some_and(|b| b.distance <= distance) {
                continue;
            }
            best = Some(RayHit {
                point: origin + direction * distance,
                normal,
                distance,
                handle: *handle,
                layer: collider.desc.layer,
                owner: collider.desc.owner,
            });
        }
        best
    }

    fn overlap_shape(&self, shape: &Shape, pose: &Pose, mask: Layers) -> Vec<ColliderHandle> {
        let bounds = shape.bounding_aabb(pose);
        self.active(mask)
            .filter(|(_, c)| c.bounds.intersects(&bounds))
            .filter(|(_, c)| shapes_overlap(shape, pose, &c.desc.shape, &c.desc.pose))
            .map(|(h, _)| *h)
            .collect()
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Layers) -> Vec<ColliderHandle> {
        let bounds = AABB::new(center - Vec3::splat(radius), center + Vec3::splat(radius));
        self.active(mask)
            .filter(|(_, c)| c.bounds.intersects(&bounds))
            .filter(|(_, c)| sphere_overlaps_shape(center, radius, &c.desc.shape, &c.desc.pose))
            .map(|(h, _)| *h)
            .collect()
    }

    fn collider(&self, handle: ColliderHandle) -> Option<ColliderInfo> {
        self.colliders.get(&handle).map(|c| ColliderInfo {
            handle,
            shape: c.desc.shape,
            pose: c.desc.pose,
            layer: c.desc.layer,
            owner: c.desc.owner,
            enabled: c.desc.enabled,
        })
    }
}

impl ColliderRegistry for CollisionWorld {
    fn insert(&mut self, desc: ColliderDesc) -> ColliderHandle {
        let handle = ColliderHandle(self.next_handle);
        self.next_handle += 1;
        let bounds = desc.shape.bounding_aabb(&desc.pose);
        self.colliders.insert(handle, Collider { desc, bounds });
        handle
    }

    fn remove(&mut self, handle: ColliderHandle) -> bool {
        self.colliders.remove(&handle).is_some()
    }

    fn set_enabled(&mut self, handle: ColliderHandle, enabled: bool) {
        if let Some(collider) = self.colliders.get_mut(&handle) {
            collider.desc.enabled = enabled;
        }
    }

    fn contains(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains_key(&handle)
    }
}
