//! Spatial query contract
//!
//! The building system only ever talks to physics through these two traits.
//! A host engine implements them over its own physics scene; tests and the
//! sandbox use [`super::CollisionWorld`].

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Shape;
use super::types::Pose;

bitflags! {
    /// Collision layers. Every collider lives on exactly one layer; queries
    /// take a mask of layers to consider.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Layers: u32 {
        const TERRAIN = 1 << 0;
        /// Solid bodies of placed building pieces
        const PIECE = 1 << 1;
        const FOUNDATION_CONNECTOR = 1 << 2;
        const EDGE_CONNECTOR = 1 << 3;
        const CEILING_CONNECTOR = 1 << 4;
        const DOOR_CONNECTOR = 1 << 5;
        /// Fine-grained door colliders, enabled once a door sits in a frame
        const DOOR_DETAIL = 1 << 6;

        const CONNECTORS = Self::FOUNDATION_CONNECTOR.bits()
            | Self::EDGE_CONNECTOR.bits()
            | Self::CEILING_CONNECTOR.bits()
            | Self::DOOR_CONNECTOR.bits();
    }
}

/// Opaque handle to a registered collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// Who a collider belongs to: an entity id and an optional sub-part index
/// (for building pieces, the connector index of a marker collider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderOwner {
    pub entity: u32,
    pub part: Option<u32>,
}

impl ColliderOwner {
    pub fn entity(entity: u32) -> Self {
        Self { entity, part: None }
    }

    pub fn part(entity: u32, part: u32) -> Self {
        Self {
            entity,
            part: Some(part),
        }
    }
}

/// Everything needed to register a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub shape: Shape,
    pub pose: Pose,
    pub layer: Layers,
    /// `None` for world geometry such as terrain
    pub owner: Option<ColliderOwner>,
    pub enabled: bool,
}

impl ColliderDesc {
    pub fn new(shape: Shape, pose: Pose, layer: Layers) -> Self {
        Self {
            shape,
            pose,
            layer,
            owner: None,
            enabled: true,
        }
    }

    pub fn with_owner(mut self, owner: ColliderOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Read-only view of a registered collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderInfo {
    pub handle: ColliderHandle,
    pub shape: Shape,
    pub pose: Pose,
    pub layer: Layers,
    pub owner: Option<ColliderOwner>,
    pub enabled: bool,
}

/// Nearest ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Outward surface normal at `point`
    pub normal: Vec3,
    pub distance: f32,
    pub handle: ColliderHandle,
    /// Layer of the hit collider (plays the role of a surface tag)
    pub layer: Layers,
    pub owner: Option<ColliderOwner>,
}

/// Synchronous spatial queries. Disabled colliders never appear in results.
pub trait SpatialQuery {
    /// Nearest hit along a normalized ray within `max_distance`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Layers) -> Option<RayHit>;

    /// All colliders in `mask` overlapping `shape` placed at `pose`.
    fn overlap_shape(&self, shape: &Shape, pose: &Pose, mask: Layers) -> Vec<ColliderHandle>;

    /// All colliders in `mask` overlapping a sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Layers) -> Vec<ColliderHandle>;

    fn collider(&self, handle: ColliderHandle) -> Option<ColliderInfo>;
}

/// Collider lifecycle, driven by pieces being placed, consumed or removed.
pub trait ColliderRegistry: SpatialQuery {
    fn insert(&mut self, desc: ColliderDesc) -> ColliderHandle;

    /// Remove a collider. Returns false if the handle was unknown.
    fn remove(&mut self, handle: ColliderHandle) -> bool;

    fn set_enabled(&mut self, handle: ColliderHandle, enabled: bool);

    fn contains(&self, handle: ColliderHandle) -> bool {
        self.collider(handle).is_some()
    }
}
