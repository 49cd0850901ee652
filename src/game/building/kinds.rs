//! Piece types and connection kinds
//!
//! Explicit tags plus small dispatch tables; nothing here inspects a piece
//! to find out what it is.

use serde::{Deserialize, Serialize};

use crate::physics::Layers;

/// What a building piece is. Determines which connector kind it snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingPieceType {
    Foundation,
    /// Wall standing on a foundation or ceiling edge
    EdgeBlock,
    Ceiling,
    /// Wall with a door opening
    Doorframe,
    Door,
    /// Free-standing block with no sockets (crates, furniture)
    GenericBlock,
}

/// Category of socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Foundation,
    Edge,
    Ceiling,
    Door,
}

impl BuildingPieceType {
    pub const ALL: [BuildingPieceType; 6] = [
        BuildingPieceType::Foundation,
        BuildingPieceType::EdgeBlock,
        BuildingPieceType::Ceiling,
        BuildingPieceType::Doorframe,
        BuildingPieceType::Door,
        BuildingPieceType::GenericBlock,
    ];

    /// Connector kind a ghost of this type snaps onto.
    pub fn snap_kind(self) -> Option<ConnectionKind> {
        match self {
            BuildingPieceType::Foundation => Some(ConnectionKind::Foundation),
            BuildingPieceType::EdgeBlock | BuildingPieceType::Doorframe => Some(ConnectionKind::Edge),
            BuildingPieceType::Ceiling => Some(ConnectionKind::Ceiling),
            BuildingPieceType::Door => Some(ConnectionKind::Door),
            BuildingPieceType::GenericBlock => None,
        }
    }

    /// Layers the placement ray considers for a ghost of this type.
    pub fn raycast_mask(self) -> Layers {
        match self.snap_kind() {
            Some(kind) => Layers::TERRAIN | kind.layer(),
            None => Layers::TERRAIN,
        }
    }

    /// Which body types count as occupying a socket of `kind`.
    pub fn occupies(self, kind: ConnectionKind) -> bool {
        self.snap_kind() == Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            BuildingPieceType::Foundation => "Foundation",
            BuildingPieceType::EdgeBlock => "Edge Block",
            BuildingPieceType::Ceiling => "Ceiling",
            BuildingPieceType::Doorframe => "Doorframe",
            BuildingPieceType::Door => "Door",
            BuildingPieceType::GenericBlock => "Block",
        }
    }
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 4] = [
        ConnectionKind::Foundation,
        ConnectionKind::Edge,
        ConnectionKind::Ceiling,
        ConnectionKind::Door,
    ];

    /// Layer the marker colliders of this kind live on.
    pub fn layer(self) -> Layers {
        match self {
            ConnectionKind::Foundation => Layers::FOUNDATION_CONNECTOR,
            ConnectionKind::Edge => Layers::EDGE_CONNECTOR,
            ConnectionKind::Ceiling => Layers::CEILING_CONNECTOR,
            ConnectionKind::Door => Layers::DOOR_CONNECTOR,
        }
    }

    pub fn from_layer(layer: Layers) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.layer() == layer)
    }
}
