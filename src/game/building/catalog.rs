//! Piece Catalog
//!
//! Templates keyed by name, used to spawn ghosts. Capabilities are optional
//! records on the template: a piece either carries a connector layout and/or
//! an overlap check, and callers match on them.
//!
//! Stock dimensions (meters):
//! - Foundation: 3 x 1 x 3, pivot at the bottom centre
//! - Wall / doorframe: 3 wide, 3 high, 0.2 thick, pivot at the bottom centre of the edge
//! - Ceiling: 3 x 0.2 x 3, pivot at the bottom centre
//! - Door: 1 x 2, pivot at its centre

use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;
use std::sync::Arc;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::connector::ConnectorTemplate;
use super::error::BuildError;
use super::kinds::{BuildingPieceType, ConnectionKind};
use crate::physics::{Pose, Shape};

pub const FOUNDATION_SIZE: f32 = 3.0;
pub const FOUNDATION_HEIGHT: f32 = 1.0;
pub const WALL_HEIGHT: f32 = 3.0;
pub const WALL_THICKNESS: f32 = 0.2;
pub const CEILING_THICKNESS: f32 = 0.2;
pub const DOOR_WIDTH: f32 = 1.0;
pub const DOOR_HEIGHT: f32 = 2.0;
pub const MARKER_RADIUS: f32 = 0.5;

/// Collider shape placed relative to the piece pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyShape {
    pub shape: Shape,
    #[serde(default)]
    pub offset: Pose,
}

impl BodyShape {
    pub fn new(shape: Shape, offset: Vec3) -> Self {
        Self {
            shape,
            offset: Pose::from_position(offset),
        }
    }

    pub fn world_pose(&self, piece_pose: &Pose) -> Pose {
        piece_pose.mul_pose(&self.offset)
    }
}

/// The piece exposes sockets once placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorCapability {
    pub connectors: Vec<ConnectorTemplate>,
}

/// The piece checks its body for overlaps while it is a ghost.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlapCheckCapability {
    /// Overrides `BuildConfig::overlap_skin` for this piece
    #[serde(default)]
    pub skin: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceTemplate {
    pub name: String,
    pub piece_type: BuildingPieceType,
    pub body: BodyShape,
    #[serde(default)]
    pub connectors: Option<ConnectorCapability>,
    #[serde(default)]
    pub overlap_check: Option<OverlapCheckCapability>,
    /// Fine-grained colliders, disabled until the piece consumes a door socket
    #[serde(default)]
    pub detail_colliders: Vec<BodyShape>,
}

impl PieceTemplate {
    pub fn connector_templates(&self) -> &[ConnectorTemplate] {
        match &self.connectors {
            Some(capability) => &capability.connectors,
            None => &[],
        }
    }

    /// Every connector must carry a positive marker radius, since the
    /// proximity sweeps are sized from it.
    pub fn validate(&self) -> Result<(), BuildError> {
        for (index, connector) in self.connector_templates().iter().enumerate() {
            if connector.valid_marker_radius().is_none() {
                return Err(BuildError::MissingMarkerRadius {
                    piece: self.name.clone(),
                    connector: index,
                });
            }
        }
        Ok(())
    }
}

/// Validated templates keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PieceCatalog {
    templates: BTreeMap<String, Arc<PieceTemplate>>,
}

#[derive(Deserialize)]
struct CatalogFile {
    pieces: Vec<PieceTemplate>,
}

impl PieceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: PieceTemplate) -> Result<(), BuildError> {
        template.validate()?;
        self.templates.insert(template.name.clone(), Arc::new(template));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<PieceTemplate>> {
        self.templates.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<PieceTemplate>, BuildError> {
        self.get(name).ok_or_else(|| BuildError::UnknownPiece(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse `{ "pieces": [ ... ] }`. Any invalid template fails the whole catalog.
    pub fn from_json_str(json: &str) -> Result<Self, BuildError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for template in file.pieces {
            catalog.insert(template)?;
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        log::info!("Piece catalog: loaded {} templates from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// The stock piece set: foundation, wall, ceiling, doorframe, door, crate.
    /// Validated like any JSON catalog.
    pub fn standard() -> Result<Self, BuildError> {
        let mut catalog = Self::new();
        for template in [
            foundation_template(),
            wall_template("wall", BuildingPieceType::EdgeBlock),
            ceiling_template(),
            wall_template("doorframe", BuildingPieceType::Doorframe),
            door_template(),
            crate_template(),
        ] {
            catalog.insert(template)?;
        }
        Ok(catalog)
    }
}

/// Sockets around a square slab: one per side where a neighbouring slab's
/// pivot goes, in +X, -X, +Z, -Z order.
fn side_connectors(kind: ConnectionKind, y: f32) -> Vec<ConnectorTemplate> {
    [Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z]
        .into_iter()
        .map(|dir| {
            ConnectorTemplate::new(
                kind,
                Pose::from_position(dir * FOUNDATION_SIZE + Vec3::Y * y),
                MARKER_RADIUS,
            )
        })
        .collect()
}

/// Edge sockets along the top of a square slab, in +X, -X, +Z, -Z order.
/// A wall's local -Z faces away from the slab centre.
fn edge_connectors(top: f32) -> Vec<ConnectorTemplate> {
    let half = FOUNDATION_SIZE * 0.5;
    [
        (Vec3::new(half, top, 0.0), -FRAC_PI_2),
        (Vec3::new(-half, top, 0.0), FRAC_PI_2),
        (Vec3::new(0.0, top, half), PI),
        (Vec3::new(0.0, top, -half), 0.0),
    ]
    .into_iter()
    .map(|(position, yaw)| {
        ConnectorTemplate::new(
            ConnectionKind::Edge,
            Pose::new(position, Quat::from_rotation_y(yaw)),
            MARKER_RADIUS,
        )
    })
    .collect()
}

fn foundation_template() -> PieceTemplate {
    let mut connectors = side_connectors(ConnectionKind::Foundation, 0.0);
    connectors.extend(edge_connectors(FOUNDATION_HEIGHT));
    PieceTemplate {
        name: "foundation".to_string(),
        piece_type: BuildingPieceType::Foundation,
        body: BodyShape::new(
            Shape::cube(Vec3::new(FOUNDATION_SIZE * 0.5, FOUNDATION_HEIGHT * 0.5, FOUNDATION_SIZE * 0.5)),
            Vec3::new(0.0, FOUNDATION_HEIGHT * 0.5, 0.0),
        ),
        connectors: Some(ConnectorCapability { connectors }),
        overlap_check: Some(OverlapCheckCapability::default()),
        detail_colliders: Vec::new(),
    }
}

fn wall_template(name: &str, piece_type: BuildingPieceType) -> PieceTemplate {
    let half = FOUNDATION_SIZE * 0.5;
    // Ceiling pivots on either side of the wall top; +Z faces the slab the wall stands on
    let mut connectors = vec![
        ConnectorTemplate::new(
            ConnectionKind::Ceiling,
            Pose::from_position(Vec3::new(0.0, WALL_HEIGHT, half)),
            MARKER_RADIUS,
        ),
        ConnectorTemplate::new(
            ConnectionKind::Ceiling,
            Pose::from_position(Vec3::new(0.0, WALL_HEIGHT, -half)),
            MARKER_RADIUS,
        ),
    ];
    if piece_type == BuildingPieceType::Doorframe {
        connectors.push(ConnectorTemplate::new(
            ConnectionKind::Door,
            Pose::from_position(Vec3::new(0.0, DOOR_HEIGHT * 0.5, 0.0)),
            MARKER_RADIUS,
        ));
    }

    PieceTemplate {
        name: name.to_string(),
        piece_type,
        body: BodyShape::new(
            Shape::cube(Vec3::new(half, WALL_HEIGHT * 0.5, WALL_THICKNESS * 0.5)),
            Vec3::new(0.0, WALL_HEIGHT * 0.5, 0.0),
        ),
        connectors: Some(ConnectorCapability { connectors }),
        overlap_check: Some(OverlapCheckCapability::default()),
        detail_colliders: Vec::new(),
    }
}

fn ceiling_template() -> PieceTemplate {
    let mut connectors = side_connectors(ConnectionKind::Ceiling, 0.0);
    connectors.extend(edge_connectors(CEILING_THICKNESS));
    PieceTemplate {
        name: "ceiling".to_string(),
        piece_type: BuildingPieceType::Ceiling,
        body: BodyShape::new(
            Shape::cube(Vec3::new(FOUNDATION_SIZE * 0.5, CEILING_THICKNESS * 0.5, FOUNDATION_SIZE * 0.5)),
            Vec3::new(0.0, CEILING_THICKNESS * 0.5, 0.0),
        ),
        connectors: Some(ConnectorCapability { connectors }),
        overlap_check: Some(OverlapCheckCapability::default()),
        detail_colliders: Vec::new(),
    }
}

fn door_template() -> PieceTemplate {
    let half_w = DOOR_WIDTH * 0.5;
    let half_h = DOOR_HEIGHT * 0.5;
    PieceTemplate {
        name: "door".to_string(),
        piece_type: BuildingPieceType::Door,
        body: BodyShape::new(Shape::cube(Vec3::new(half_w, half_h, 0.05)), Vec3::ZERO),
        connectors: None,
        overlap_check: Some(OverlapCheckCapability::default()),
        detail_colliders: vec![
            // Panel
            BodyShape::new(Shape::cube(Vec3::new(half_w - 0.05, half_h - 0.05, 0.03)), Vec3::ZERO),
            // Handle
            BodyShape::new(Shape::cube(Vec3::new(0.05, 0.05, 0.08)), Vec3::new(half_w - 0.15, 0.0, 0.0)),
        ],
    }
}

fn crate_template() -> PieceTemplate {
    PieceTemplate {
        name: "crate".to_string(),
        piece_type: BuildingPieceType::GenericBlock,
        body: BodyShape::new(Shape::cube(Vec3::splat(0.5)), Vec3::new(0.0, 0.5, 0.0)),
        connectors: None,
        overlap_check: Some(OverlapCheckCapability::default()),
        detail_colliders: Vec::new(),
    }
}
