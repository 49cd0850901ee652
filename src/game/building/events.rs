//! Build events
//!
//! Everything the host scene graph needs to mirror: ghosts coming and
//! going, pieces being placed, reparented or removed, and connector
//! markers being destroyed or restored. Drained with `take_events()`.

use super::house::HouseId;
use super::kinds::BuildingPieceType;
use super::piece::PieceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildEvent {
    /// A new preview ghost exists
    GhostSpawned(PieceId, BuildingPieceType),
    /// The preview ghost was discarded
    GhostDestroyed(PieceId),
    /// A ghost was committed
    PiecePlaced(PieceId, BuildingPieceType),
    /// A placed piece was removed by the player
    PieceRemoved(PieceId),
    /// A piece now belongs to a different house
    Reparented { piece: PieceId, house: HouseId },
    /// A connector marker was destroyed because `by` covers it
    ConnectorConsumed { piece: PieceId, index: usize, by: PieceId },
    /// A connector marker was re-registered after its consumer went away
    ConnectorRestored { piece: PieceId, index: usize },
    /// A door's fine-grained colliders were switched on
    DoorDetailsEnabled(PieceId),
    /// `absorbed` no longer exists; its members joined `kept`
    HousesMerged { kept: HouseId, absorbed: HouseId },
}
