//! Building pieces
//!
//! A piece starts life as a ghost: no colliders registered, connectors
//! dormant, material red or green depending on whether its body overlaps
//! anything. Committing it registers its body, switches its connectors on
//! and freezes it in the `Final` material.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::catalog::PieceTemplate;
use super::connector::{Connector, ConnectorState};
use super::error::BuildError;
use super::house::HouseId;
use super::kinds::BuildingPieceType;
use crate::physics::{
    ColliderDesc, ColliderHandle, ColliderInfo, ColliderOwner, ColliderRegistry, Layers, Pose,
    Shape, SpatialQuery,
};

/// Stable id of a piece (ghost or placed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// Visual state. Ghosts flip between the two previews every tick; a placed
/// piece is `Final` and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialState {
    /// Red preview
    PreviewInvalid,
    /// Green preview
    PreviewValid,
    /// Original material of a placed piece
    Final,
}

#[derive(Debug, Clone)]
pub struct BuildingPiece {
    id: PieceId,
    template: Arc<PieceTemplate>,
    pub(crate) pose: Pose,
    connectors: Vec<Connector>,
    detected_overlaps: BTreeSet<ColliderHandle>,
    is_placed: bool,
    visible: bool,
    material: MaterialState,
    pub(crate) house: Option<HouseId>,
    body_collider: Option<ColliderHandle>,
    detail_colliders: Vec<ColliderHandle>,
    details_enabled: bool,
}

impl BuildingPiece {
    /// Spawn a ghost. Connector indices follow the template one to one, so
    /// a connector without a usable marker radius fails the whole piece.
    pub fn ghost(
        id: PieceId,
        template: Arc<PieceTemplate>,
        pose: Pose,
    ) -> Result<Self, BuildError> {
        let connectors = template
            .connector_templates()
            .iter()
            .enumerate()
            .map(|(index, t)| {
                t.valid_marker_radius()
                    .map(|radius| Connector::dormant(t, radius))
                    .ok_or_else(|| BuildError::MissingMarkerRadius {
                        piece: template.name.clone(),
                        connector: index,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            template,
            pose,
            connectors,
            detected_overlaps: BTreeSet::new(),
            is_placed: false,
            visible: true,
            material: MaterialState::PreviewValid,
            house: None,
            body_collider: None,
            detail_colliders: Vec::new(),
            details_enabled: false,
        })
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn template(&self) -> &Arc<PieceTemplate> {
        &self.template
    }

    pub fn template_name(&self) -> &str {
        &self.template.name
    }

    pub fn piece_type(&self) -> BuildingPieceType {
        self.template.piece_type
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector(&self, index: usize) -> Option<&Connector> {
        self.connectors.get(index)
    }

    pub fn connector_world_pose(&self, index: usize) -> Option<Pose> {
        self.connectors.get(index).map(|c| c.world_pose(&self.pose))
    }

    pub fn active_connector_count(&self) -> usize {
        self.connectors.iter().filter(|c| c.is_active()).count()
    }

    pub fn detected_overlaps(&self) -> &BTreeSet<ColliderHandle> {
        &self.detected_overlaps
    }

    /// Placement is allowed exactly when nothing overlaps the body.
    pub fn can_place(&self) -> bool {
        self.detected_overlaps.is_empty()
    }

    pub fn is_placed(&self) -> bool {
        self.is_placed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn material(&self) -> MaterialState {
        self.material
    }

    pub fn house(&self) -> Option<HouseId> {
        self.house
    }

    pub fn body_collider(&self) -> Option<ColliderHandle> {
        self.body_collider
    }

    pub fn detail_colliders(&self) -> &[ColliderHandle] {
        &self.detail_colliders
    }

    pub fn details_enabled(&self) -> bool {
        self.details_enabled
    }

    /// Body shape and world pose.
    pub fn world_body(&self) -> (Shape, Pose) {
        (self.template.body.shape, self.template.body.world_pose(&self.pose))
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Recompute `detected_overlaps` from scratch and refresh the preview
    /// material. Colliders for which `ignore` returns true are dropped.
    /// Pieces without an overlap-check capability never report overlaps.
    pub fn check_overlaps<S, F>(&mut self, physics: &S, mask: Layers, default_skin: f32, ignore: F)
    where
        S: SpatialQuery + ?Sized,
        F: Fn(&ColliderInfo) -> bool,
    {
        if self.is_placed {
            return;
        }
        self.detected_overlaps.clear();

        if let Some(check) = self.template.overlap_check {
            let skin = check.skin.unwrap_or(default_skin);
            let (shape, pose) = self.world_body();
            for handle in physics.overlap_shape(&shape.shrunk(skin), &pose, mask) {
                let ignored = physics.collider(handle).is_some_and(|info| ignore(&info));
                if !ignored {
                    self.detected_overlaps.insert(handle);
                }
            }
        }

        self.material = if self.can_place() {
            MaterialState::PreviewValid
        } else {
            MaterialState::PreviewInvalid
        };
    }

    /// Promote a ghost: register its body (and disabled detail colliders),
    /// switch on its connectors and freeze the final material.
    pub(crate) fn finalize<R: ColliderRegistry + ?Sized>(&mut self, physics: &mut R) {
        if self.is_placed {
            return;
        }
        let owner = ColliderOwner::entity(self.id.0);
        let (shape, pose) = self.world_body();
        let body = ColliderDesc::new(shape, pose, Layers::PIECE).with_owner(owner);
        self.body_collider = Some(physics.insert(body));

        self.detail_colliders = self
            .template
            .detail_colliders
            .iter()
            .map(|detail| {
                let pose = detail.world_pose(&self.pose);
                physics.insert(
                    ColliderDesc::new(detail.shape, pose, Layers::DOOR_DETAIL)
                        .with_owner(owner)
                        .disabled(),
                )
            })
            .collect();

        self.is_placed = true;
        self.visible = true;
        self.detected_overlaps.clear();
        self.material = MaterialState::Final;

        if self.template.connectors.is_some() {
            self.turn_on_connections(physics);
        }
    }

    /// Register a marker for every dormant connector.
    fn turn_on_connections<R: ColliderRegistry + ?Sized>(&mut self, physics: &mut R) {
        for index in 0..self.connectors.len() {
            if self.connectors[index].state == ConnectorState::Dormant {
                let marker = self.register_marker(index, physics);
                self.connectors[index].state = ConnectorState::Active { marker };
            }
        }
    }

    fn register_marker<R: ColliderRegistry + ?Sized>(
        &self,
        index: usize,
        physics: &mut R,
    ) -> ColliderHandle {
        let connector = &self.connectors[index];
        physics.insert(
            ColliderDesc::new(
                Shape::sphere(connector.marker_radius),
                connector.world_pose(&self.pose),
                connector.kind.layer(),
            )
            .with_owner(ColliderOwner::part(self.id.0, index as u32)),
        )
    }

    /// Destroy an active connector's marker. Returns false if it was not active.
    pub(crate) fn consume_connector<R: ColliderRegistry + ?Sized>(
        &mut self,
        index: usize,
        by: PieceId,
        physics: &mut R,
    ) -> bool {
        let Some(marker) = self.connectors.get(index).and_then(Connector::marker) else {
            return false;
        };
        physics.remove(marker);
        self.connectors[index].state = ConnectorState::Consumed { by };
        true
    }

    /// Re-expose a consumed connector with a fresh marker.
    pub(crate) fn restore_connector<R: ColliderRegistry + ?Sized>(
        &mut self,
        index: usize,
        physics: &mut R,
    ) -> bool {
        if !self.connectors.get(index).is_some_and(Connector::is_consumed) {
            return false;
        }
        let marker = self.register_marker(index, physics);
        self.connectors[index].state = ConnectorState::Active { marker };
        true
    }

    /// Switch on the fine-grained colliders (door seated in a frame).
    pub(crate) fn enable_details<R: ColliderRegistry + ?Sized>(&mut self, physics: &mut R) -> bool {
        if self.details_enabled || self.detail_colliders.is_empty() {
            return false;
        }
        for handle in &self.detail_colliders {
            physics.set_enabled(*handle, true);
        }
        self.details_enabled = true;
        true
    }

    /// Remove every collider this piece registered.
    pub(crate) fn release_colliders<R: ColliderRegistry + ?Sized>(&mut self, physics: &mut R) {
        if let Some(body) = self.body_collider.take() {
            physics.remove(body);
        }
        for handle in self.detail_colliders.drain(..) {
            physics.remove(handle);
        }
        for connector in &mut self.connectors {
            if let Some(marker) = connector.marker() {
                physics.remove(marker);
                connector.state = ConnectorState::Dormant;
            }
        }
        self.details_enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::building::catalog::PieceCatalog;
    use crate::physics::CollisionWorld;
    use glam::Vec3;

    fn ghost(name: &str, position: Vec3) -> BuildingPiece {
        let template = PieceCatalog::standard().unwrap().require(name).unwrap();
        BuildingPiece::ghost(PieceId(1), template, Pose::from_position(position)).unwrap()
    }

    #[test]
    fn test_ghost_starts_dormant() {
        let piece = ghost("foundation", Vec3::ZERO);
        assert!(!piece.is_placed());
        assert!(piece.body_collider().is_none());
        assert_eq!(piece.connectors().len(), 8);
        assert!(piece.connectors().iter().all(|c| c.state == ConnectorState::Dormant));
    }

    #[test]
    fn test_ghost_rejects_connector_without_marker_radius() {
        let catalog = PieceCatalog::standard().unwrap();
        let mut template = (*catalog.require("foundation").unwrap()).clone();
        if let Some(capability) = template.connectors.as_mut() {
            capability.connectors[0].marker_radius = None;
        }

        let result = BuildingPiece::ghost(PieceId(1), Arc::new(template), Pose::IDENTITY);
        match result {
            Err(BuildError::MissingMarkerRadius { piece, connector }) => {
                assert_eq!(piece, "foundation");
                assert_eq!(connector, 0);
            }
            other => panic!("expected MissingMarkerRadius, got {other:?}"),
        }
    }

    #[test]
    fn test_overlap_drives_material() {
        let mut physics = CollisionWorld::new();
        let mut piece = ghost("crate", Vec3::ZERO);

        piece.check_overlaps(&physics, Layers::PIECE, 0.05, |_| false);
        assert!(piece.can_place());
        assert_eq!(piece.material(), MaterialState::PreviewValid);

        let blocker = physics.insert(ColliderDesc::new(
            Shape::cube(Vec3::splat(0.5)),
            Pose::from_position(Vec3::new(0.3, 0.5, 0.0)),
            Layers::PIECE,
        ));
        piece.check_overlaps(&physics, Layers::PIECE, 0.05, |_| false);
        assert!(!piece.can_place());
        assert!(piece.detected_overlaps().contains(&blocker));
        assert_eq!(piece.material(), MaterialState::PreviewInvalid);

        piece.check_overlaps(&physics, Layers::PIECE, 0.05, |info| info.handle == blocker);
        assert!(piece.can_place());
    }

    #[test]
    fn test_finalize_registers_body_and_markers() {
        let mut physics = CollisionWorld::new();
        let mut piece = ghost("foundation", Vec3::ZERO);
        piece.finalize(&mut physics);

        assert!(piece.is_placed());
        assert_eq!(piece.material(), MaterialState::Final);
        assert_eq!(piece.active_connector_count(), 8);
        // body + 8 markers
        assert_eq!(physics.len(), 9);

        let marker = piece.connector(0).unwrap().marker().unwrap();
        assert!(piece.consume_connector(0, PieceId(2), &mut physics));
        assert!(!physics.contains(marker));
        assert_eq!(piece.connector(0).unwrap().consumed_by(), Some(PieceId(2)));
        assert!(!piece.consume_connector(0, PieceId(2), &mut physics));

        assert!(piece.restore_connector(0, &mut physics));
        assert!(piece.connector(0).unwrap().is_active());

        piece.release_colliders(&mut physics);
        assert!(physics.is_empty());
    }

    #[test]
    fn test_door_details_start_disabled() {
        let mut physics = CollisionWorld::new();
        let mut door = ghost("door", Vec3::new(0.0, 1.0, 0.0));
        door.finalize(&mut physics);

        assert_eq!(door.detail_colliders().len(), 2);
        assert_eq!(physics.count_enabled(Layers::DOOR_DETAIL), 0);
        assert!(door.enable_details(&mut physics));
        assert_eq!(physics.count_enabled(Layers::DOOR_DETAIL), 2);
        assert!(!door.enable_details(&mut physics));
    }
}
