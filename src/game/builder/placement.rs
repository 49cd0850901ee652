//! Placement Controller
//!
//! Owns the single ghost piece that follows the player's aim. Each tick the
//! view ray is cast against terrain plus the connector layer the ghost
//! snaps to; a connector hit snaps the ghost exactly onto that socket,
//! anything else stands it on the hit point facing the viewer. Validity is
//! recomputed in the same tick it is read.

use std::sync::Arc;

use log::{debug, error, trace, warn};

use crate::camera::{ViewRay, ground_yaw_rotation};
use crate::game::building::{
    BuildError, BuildEvent, BuildingPiece, BuildingWorld, ConnectorRef, PieceId, PieceTemplate,
};
use crate::physics::{ColliderRegistry, Pose, SpatialQuery};

/// Ghost lifecycle and commit gate.
#[derive(Debug)]
pub struct PlacementController {
    selected: Option<Arc<PieceTemplate>>,
    ghost: Option<BuildingPiece>,
    binding: Option<ConnectorRef>,
    enabled: bool,
}

impl Default for PlacementController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementController {
    /// Enabled, with nothing selected.
    pub fn new() -> Self {
        Self {
            selected: None,
            ghost: None,
            binding: None,
            enabled: true,
        }
    }

    pub fn selected(&self) -> Option<&Arc<PieceTemplate>> {
        self.selected.as_ref()
    }

    pub fn ghost(&self) -> Option<&BuildingPiece> {
        self.ghost.as_ref()
    }

    /// Connector the ghost is currently snapped to.
    pub fn binding(&self) -> Option<ConnectorRef> {
        self.binding
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A visible ghost with no detected overlaps.
    pub fn can_place(&self) -> bool {
        self.ghost.as_ref().is_some_and(|g| g.is_visible() && g.can_place())
    }

    /// Switch piece type: the current ghost is destroyed and, while enabled,
    /// a ghost of the new selection replaces it. `None` clears the selection.
    /// An invalid template is refused and the current selection kept.
    pub fn change_building_block(
        &mut self,
        template: Option<Arc<PieceTemplate>>,
        world: &mut BuildingWorld,
    ) -> Result<(), BuildError> {
        if let Some(template) = &template {
            template.validate()?;
        }
        self.destroy_ghost(world);
        self.selected = template;
        if self.enabled {
            self.spawn_ghost(world);
        }
        Ok(())
    }

    /// Disabling destroys the ghost outright; enabling respawns it.
    pub fn set_enabled(&mut self, enabled: bool, world: &mut BuildingWorld) {
        self.enabled = enabled;
        self.destroy_ghost(world);
        if enabled {
            self.spawn_ghost(world);
        }
    }

    fn spawn_ghost(&mut self, world: &mut BuildingWorld) {
        let Some(template) = self.selected.clone() else {
            return;
        };
        let id = world.allocate_piece_id();
        let piece_type = template.piece_type;
        let mut ghost = match BuildingPiece::ghost(id, template, Pose::IDENTITY) {
            Ok(ghost) => ghost,
            Err(e) => {
                error!("Ghost {:?} not spawned: {e}", id);
                return;
            }
        };
        // Hidden until a tick finds a surface
        ghost.set_visible(false);
        debug!("Ghost {:?} spawned ({})", id, piece_type.name());
        world.push_event(BuildEvent::GhostSpawned(id, piece_type));
        self.ghost = Some(ghost);
        self.binding = None;
    }

    fn destroy_ghost(&mut self, world: &mut BuildingWorld) {
        if let Some(ghost) = self.ghost.take() {
            debug!("Ghost {:?} destroyed", ghost.id());
            world.push_event(BuildEvent::GhostDestroyed(ghost.id()));
        }
        self.binding = None;
    }

    /// Track the aim for one tick.
    pub fn tick<S: SpatialQuery + ?Sized>(&mut self, view: &ViewRay, world: &BuildingWorld, physics: &S) {
        if !self.enabled {
            return;
        }
        let Some(ghost) = self.ghost.as_mut() else {
            return;
        };

        let piece_type = ghost.piece_type();
        let hit = physics.raycast(
            view.origin,
            view.direction,
            world.config().max_reach,
            piece_type.raycast_mask(),
        );
        let Some(hit) = hit else {
            ghost.set_visible(false);
            self.binding = None;
            return;
        };
        ghost.set_visible(true);

        let snapped = piece_type
            .snap_kind()
            .filter(|kind| hit.layer == kind.layer())
            .and(hit.owner)
            .and_then(|owner| world.connector_ref_for(owner))
            .and_then(|connector| world.connector_world_pose(connector).map(|pose| (connector, pose)));

        match snapped {
            Some((connector, pose)) => {
                ghost.pose = pose;
                self.binding = Some(connector);
            }
            None => {
                ghost.pose = Pose::new(hit.point, ground_yaw_rotation(view.yaw));
                self.binding = None;
            }
        }

        refresh_overlaps(ghost, self.binding, world, physics);
        trace!(
            "Ghost {:?} at {:?} bound={:?} overlaps={}",
            ghost.id(),
            ghost.pose().position,
            self.binding,
            ghost.detected_overlaps().len()
        );
    }

    /// Commit the ghost. Rejected (returning `None`, ghost kept) unless the
    /// ghost is visible and nothing overlaps it; a fresh ghost of the same
    /// type is spawned after a successful commit.
    pub fn place_block<R: ColliderRegistry + ?Sized>(
        &mut self,
        world: &mut BuildingWorld,
        physics: &mut R,
    ) -> Option<PieceId> {
        if !self.enabled {
            return None;
        }
        let ghost = self.ghost.as_mut()?;
        if !ghost.is_visible() {
            return None;
        }
        refresh_overlaps(ghost, self.binding, world, &*physics);
        if !ghost.can_place() {
            warn!(
                "Placement of {} rejected: {} overlapping colliders",
                ghost.piece_type().name(),
                ghost.detected_overlaps().len()
            );
            return None;
        }

        let ghost = self.ghost.take()?;
        let binding = self.binding.take();
        let id = world.commit(ghost, binding, physics);
        self.spawn_ghost(world);
        Some(id)
    }
}

/// Overlap check that ignores the piece being snapped onto and every member
/// of its house.
fn refresh_overlaps<S: SpatialQuery + ?Sized>(
    ghost: &mut BuildingPiece,
    binding: Option<ConnectorRef>,
    world: &BuildingWorld,
    physics: &S,
) {
    let host = binding.map(|b| b.piece);
    let house = host.and_then(|h| world.house_of(h));
    let config = world.config();
    ghost.check_overlaps(physics, config.blocking_layers, config.overlap_skin, |info| {
        let Some(owner) = info.owner else {
            return false;
        };
        let id = PieceId(owner.entity);
        host == Some(id) || house.is_some_and(|h| h.contains(id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::building::{MaterialState, PieceCatalog};
    use crate::physics::CollisionWorld;
    use glam::Vec3;

    fn setup() -> (PlacementController, BuildingWorld, CollisionWorld) {
        let mut physics = CollisionWorld::new();
        physics.add_ground_slab(Vec3::ZERO, 50.0, 0.0);
        (PlacementController::new(), BuildingWorld::default(), physics)
    }

    #[test]
    fn test_no_selection_is_a_no_op() {
        let (mut controller, mut world, mut physics) = setup();
        controller.change_building_block(None, &mut world).unwrap();
        controller.tick(&ViewRay::looking_at(Vec3::new(0.0, 4.0, 4.0), Vec3::ZERO), &world, &physics);

        assert!(controller.ghost().is_none());
        assert!(!controller.can_place());
        assert_eq!(controller.place_block(&mut world, &mut physics), None);
        assert_eq!(world.piece_count(), 0);
    }

    #[test]
    fn test_ghost_hidden_without_hit() {
        let (mut controller, mut world, physics) = setup();
        let crate_template = PieceCatalog::standard().unwrap().get("crate");
        controller.change_building_block(crate_template, &mut world).unwrap();

        // Looking at the sky
        controller.tick(&ViewRay::from_angles(Vec3::new(0.0, 2.0, 0.0), 0.0, 0.5), &world, &physics);
        let ghost = controller.ghost().unwrap();
        assert!(!ghost.is_visible());
        assert!(!controller.can_place());
    }

    #[test]
    fn test_terrain_hit_faces_viewer() {
        let (mut controller, mut world, physics) = setup();
        let crate_template = PieceCatalog::standard().unwrap().get("crate");
        controller.change_building_block(crate_template, &mut world).unwrap();

        let view = ViewRay::looking_at(Vec3::new(4.0, 4.0, 0.0), Vec3::new(0.0, 0.0, 0.0));
        controller.tick(&view, &world, &physics);

        let ghost = controller.ghost().unwrap();
        assert!(ghost.is_visible());
        assert!(ghost.pose().position.length() < 1e-4);
        // Ghost local -Z points where the viewer looks (towards -X)
        let forward = ghost.pose().rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_X).length() < 1e-4);
        assert_eq!(ghost.material(), MaterialState::PreviewValid);
        assert!(controller.binding().is_none());
    }

    #[test]
    fn test_invalid_template_keeps_current_ghost() {
        let (mut controller, mut world, _) = setup();
        let catalog = PieceCatalog::standard().unwrap();
        controller.change_building_block(catalog.get("crate"), &mut world).unwrap();
        let ghost_id = controller.ghost().unwrap().id();

        let mut broken = (*catalog.require("wall").unwrap()).clone();
        if let Some(capability) = broken.connectors.as_mut() {
            capability.connectors[1].marker_radius = None;
        }
        let result = controller.change_building_block(Some(Arc::new(broken)), &mut world);

        assert!(matches!(result, Err(BuildError::MissingMarkerRadius { connector: 1, .. })));
        assert_eq!(controller.selected().unwrap().name, "crate");
        assert_eq!(controller.ghost().unwrap().id(), ghost_id);
    }

    #[test]
    fn test_place_spawns_fresh_ghost() {
        let (mut controller, mut world, mut physics) = setup();
        let crate_template = PieceCatalog::standard().unwrap().get("crate");
        controller.change_building_block(crate_template, &mut world).unwrap();
        controller.tick(&ViewRay::looking_at(Vec3::new(0.0, 4.0, 4.0), Vec3::ZERO), &world, &physics);

        let placed = controller.place_block(&mut world, &mut physics).unwrap();
        let ghost = controller.ghost().unwrap();
        assert_ne!(ghost.id(), placed);
        assert!(!ghost.is_placed());
        assert_eq!(world.piece(placed).unwrap().material(), MaterialState::Final);
    }
}
