//! Game Module
//!
//! Building pieces, connectors, house graphs and the placement controller,
//! built on top of the engine's physics collaborator.

pub mod builder;
pub mod building;
pub mod config;
pub mod systems;

pub use builder::PlacementController;
pub use building::{
    BuildError, BuildEvent, BuildingPiece, BuildingPieceType, BuildingSnapshot, BuildingWorld,
    ConnectionKind, ConnectorRef, HouseGraph, HouseId, MaterialState, PieceCatalog, PieceId,
    PieceTemplate,
};
pub use config::BuildConfig;
pub use systems::BuildingSystem;
