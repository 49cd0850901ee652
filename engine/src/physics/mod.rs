//! Physics module for Homestead Engine
//!
//! The building system treats physics as an external collaborator: it never
//! simulates anything, it only asks questions ("what does this ray hit?",
//! "what overlaps this box?") and registers the colliders of placed pieces
//! and their connector markers.
//!
//! # Unit System
//!
//! **1 unit = 1 meter**, Y up.
//!
//! # Submodules
//!
//! - [`types`] - Rigid poses built on glam's `Vec3`/`Quat`
//! - [`collision`] - Primitive shapes and the pure intersection math
//! - [`query`] - Layer masks, handles and the `SpatialQuery`/`ColliderRegistry` traits
//! - [`world`] - `CollisionWorld`, a brute-force implementation of both traits

pub mod collision;
pub mod query;
pub mod types;
pub mod world;

// Re-export commonly used types at the physics module level
pub use collision::{AABB, Shape, ray_aabb_intersect, shapes_overlap, sphere_overlaps_shape};
pub use query::{
    ColliderDesc, ColliderHandle, ColliderInfo, ColliderOwner, ColliderRegistry, Layers, RayHit,
    SpatialQuery,
};
pub use types::{Pose, Quat, Vec3};
pub use world::CollisionWorld;
