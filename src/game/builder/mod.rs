//! Builder Module
//!
//! Player-facing placement: the ghost preview, snapping and the commit gate.

pub mod placement;

pub use placement::PlacementController;
