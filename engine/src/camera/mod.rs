//! Camera Module
//!
//! View-ray math for the placement reticle. Window-system agnostic: it only
//! deals with an eye position and yaw/pitch angles.

pub mod raycast;

pub use raycast::{ViewRay, forward_from_angles, ground_yaw_rotation};
