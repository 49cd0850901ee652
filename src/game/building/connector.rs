//! Connectors (sockets)
//!
//! A connector is a typed attachment point in its piece's local frame. A
//! ghost of the matching type snaps its pivot exactly onto the connector's
//! world pose. Placed pieces expose each connector through a small sphere
//! "marker" collider on the connector kind's layer; the marker is what the
//! placement ray hits and what the house proximity sweeps find.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::kinds::ConnectionKind;
use super::piece::PieceId;
use crate::physics::{ColliderHandle, Pose};

/// Connector as declared by a piece template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorTemplate {
    pub kind: ConnectionKind,
    /// Pose relative to the piece pivot
    pub local_pose: Pose,
    /// Radius of the marker sphere. Required; validated when the catalog is built.
    #[serde(default)]
    pub marker_radius: Option<f32>,
    /// Point, in the connector's frame, that lies inside the body of a piece
    /// snapped onto this connector. Defaults per kind.
    #[serde(default)]
    pub occupancy_probe: Option<Vec3>,
}

impl ConnectorTemplate {
    pub fn new(kind: ConnectionKind, local_pose: Pose, marker_radius: f32) -> Self {
        Self {
            kind,
            local_pose,
            marker_radius: Some(marker_radius),
            occupancy_probe: None,
        }
    }

    pub fn with_probe(mut self, probe: Vec3) -> Self {
        self.occupancy_probe = Some(probe);
        self
    }

    pub(crate) fn valid_marker_radius(&self) -> Option<f32> {
        self.marker_radius.filter(|r| r.is_finite() && *r > 0.0)
    }
}

/// Probe offset used when a template does not declare one: roughly the
/// centre of the stock piece that snaps onto a connector of this kind.
pub fn default_occupancy_probe(kind: ConnectionKind) -> Vec3 {
    match kind {
        ConnectionKind::Foundation => Vec3::new(0.0, 0.5, 0.0),
        ConnectionKind::Edge => Vec3::new(0.0, 1.5, 0.0),
        ConnectionKind::Ceiling => Vec3::new(0.0, 0.1, 0.0),
        ConnectionKind::Door => Vec3::ZERO,
    }
}

/// Lifecycle of a connector on one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    /// Piece is still a ghost; no marker exists
    Dormant,
    /// Exposed; the marker collider is registered
    Active { marker: ColliderHandle },
    /// Covered by a neighbouring piece; the marker collider has been destroyed
    Consumed { by: PieceId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub kind: ConnectionKind,
    pub local_pose: Pose,
    pub marker_radius: f32,
    pub occupancy_probe: Vec3,
    pub state: ConnectorState,
}

impl Connector {
    /// Build a dormant connector from a validated template.
    pub(crate) fn dormant(template: &ConnectorTemplate, marker_radius: f32) -> Self {
        Self {
            kind: template.kind,
            local_pose: template.local_pose,
            marker_radius,
            occupancy_probe: template
                .occupancy_probe
                .unwrap_or_else(|| default_occupancy_probe(template.kind)),
            state: ConnectorState::Dormant,
        }
    }

    pub fn world_pose(&self, piece_pose: &Pose) -> Pose {
        piece_pose.mul_pose(&self.local_pose)
    }

    pub fn probe_point(&self, piece_pose: &Pose) -> Vec3 {
        self.world_pose(piece_pose).transform_point(self.occupancy_probe)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ConnectorState::Active { .. })
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self.state, ConnectorState::Consumed { .. })
    }

    pub fn marker(&self) -> Option<ColliderHandle> {
        match self.state {
            ConnectorState::Active { marker } => Some(marker),
            _ => None,
        }
    }

    pub fn consumed_by(&self) -> Option<PieceId> {
        match self.state {
            ConnectorState::Consumed { by } => Some(by),
            _ => None,
        }
    }
}
