//! Building errors
//!
//! Only configuration, catalog and persistence paths fail. An invalid ghost
//! position is a state, not an error.

use thiserror::Error;

use super::piece::PieceId;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown piece template: {0}")]
    UnknownPiece(String),

    #[error("connector {connector} of piece template '{piece}' has no valid marker radius")]
    MissingMarkerRadius { piece: String, connector: usize },

    #[error("no placed piece with id {0:?}")]
    UnknownPieceId(PieceId),

    #[error("snapshot version {0} is newer than this build understands")]
    UnsupportedSnapshotVersion(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
