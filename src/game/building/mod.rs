//! Building System - modular survival-base construction
//!
//! Features:
//! - Typed connectors (sockets) that pieces of the matching kind snap onto
//! - Ghost previews validated by shape overlap every tick
//! - House graphs that prune sockets once a neighbour covers them
//! - Snapshots of every placed piece for save/load

pub mod catalog;
pub mod connectivity;
pub mod connector;
pub mod error;
pub mod events;
pub mod house;
pub mod kinds;
pub mod persistence;
pub mod piece;
pub mod world;

pub use catalog::{BodyShape, ConnectorCapability, OverlapCheckCapability, PieceCatalog, PieceTemplate};
pub use connector::{Connector, ConnectorState, ConnectorTemplate};
pub use error::BuildError;
pub use events::BuildEvent;
pub use house::{HouseGraph, HouseId};
pub use kinds::{BuildingPieceType, ConnectionKind};
pub use persistence::{
    BuildingSnapshot, SNAPSHOT_VERSION, SavedConsumption, SavedPiece, load_snapshot, save_snapshot,
};
pub use piece::{BuildingPiece, MaterialState, PieceId};
pub use world::{BuildingWorld, ConnectorRef};
