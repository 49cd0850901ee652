//! Homestead Engine Library
//!
//! Engine-agnostic modular building for survival games: ghost previews that
//! follow the player's aim, snapping onto typed connectors, overlap
//! validation, and house graphs that prune sockets once neighbouring pieces
//! cover them.
//!
//! # Modules
//!
//! - [`physics`] - The spatial query collaborator (ray casts, shape overlaps,
//!   collider registration) plus an in-memory [`physics::CollisionWorld`]
//! - [`camera`] - View-centre ray construction
//! - [`game`] - Building pieces, connectors, house graphs and placement
//!
//! # Example
//!
//! ```ignore
//! use homestead_engine::camera::ViewRay;
//! use homestead_engine::game::systems::BuildingSystem;
//! use homestead_engine::game::{BuildConfig, PieceCatalog};
//! use homestead_engine::physics::CollisionWorld;
//!
//! let mut system = BuildingSystem::new(
//!     CollisionWorld::new(),
//!     PieceCatalog::standard()?,
//!     BuildConfig::default(),
//! );
//! system.select_piece(Some("foundation"))?;
//!
//! // Each frame
//! system.tick(&ViewRay::from_angles(eye, yaw, pitch));
//! if clicked {
//!     system.place_block();
//! }
//! ```

pub mod camera;
pub mod physics;

// Game-specific modules (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

pub use camera::ViewRay;
pub use physics::{CollisionWorld, Layers, Pose};
