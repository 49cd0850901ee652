//! Placement Tests - Ghost Preview, Snapping and Commit
//!
//! Drives the building system the way a player would: aim, tick, place.

use glam::Vec3;
use homestead_engine::ViewRay;
use homestead_engine::game::{
    BuildConfig, BuildEvent, BuildingPieceType, BuildingSystem, ConnectorRef, MaterialState,
    PieceCatalog, PieceId,
};
use homestead_engine::physics::{
    ColliderDesc, ColliderRegistry, CollisionWorld, Layers, Pose, Shape,
};

// ============================================================================
// Helpers
// ============================================================================

fn sandbox() -> BuildingSystem<CollisionWorld> {
    let mut physics = CollisionWorld::new();
    physics.add_ground_slab(Vec3::ZERO, 50.0, 0.0);
    BuildingSystem::new(physics, PieceCatalog::standard().unwrap(), BuildConfig::default())
}

/// Eye above and behind `target` (yaw 0), looking straight at it.
fn aim_at(target: Vec3) -> ViewRay {
    ViewRay::looking_at(target + Vec3::new(0.0, 3.0, 3.0), target)
}

fn connector_pose(system: &BuildingSystem<CollisionWorld>, piece: PieceId, index: usize) -> Pose {
    system.world.piece(piece).unwrap().connector_world_pose(index).unwrap()
}

fn place(system: &mut BuildingSystem<CollisionWorld>, name: &str, target: Vec3) -> Option<PieceId> {
    system.select_piece(Some(name)).unwrap();
    system.tick(&aim_at(target));
    system.place_block()
}

fn place_on(
    system: &mut BuildingSystem<CollisionWorld>,
    name: &str,
    piece: PieceId,
    index: usize,
) -> Option<PieceId> {
    let target = connector_pose(system, piece, index).position;
    place(system, name, target)
}

// ============================================================================
// Snapping
// ============================================================================

#[test]
fn test_free_standing_foundation_on_terrain() {
    let mut system = sandbox();
    let a = place(&mut system, "foundation", Vec3::ZERO).unwrap();

    let piece = system.world.piece(a).unwrap();
    assert!(piece.is_placed());
    assert_eq!(piece.material(), MaterialState::Final);
    assert!(piece.pose().position.length() < 1e-4);
    assert!(piece.house().is_none());
    assert_eq!(piece.active_connector_count(), 8);
    assert_eq!(system.physics.count_enabled(Layers::CONNECTORS), 8);
}

#[test]
fn test_snap_pose_is_exact_and_house_holds_both() {
    let mut system = sandbox();
    let a = place(&mut system, "foundation", Vec3::ZERO).unwrap();
    let target = connector_pose(&system, a, 0);

    system.select_piece(Some("foundation")).unwrap();
    system.tick(&aim_at(target.position));

    let ghost = system.controller.ghost().unwrap();
    assert_eq!(system.controller.binding(), Some(ConnectorRef { piece: a, index: 0 }));
    assert_eq!(ghost.pose(), target);
    assert!(system.can_place());

    let b = system.place_block().unwrap();
    assert_eq!(system.world.piece(b).unwrap().pose(), target);

    let house = system.world.house_of(a).unwrap();
    assert!(house.contains(a));
    assert!(house.contains(b));
    assert_eq!(house.len(), 2);
    assert_eq!(system.world.piece(b).unwrap().house(), Some(house.id()));
}

#[test]
fn test_ghost_only_snaps_to_its_own_kind() {
    let mut system = sandbox();
    let a = place(&mut system, "foundation", Vec3::ZERO).unwrap();
    let foundation_socket = connector_pose(&system, a, 0).position;

    // A wall aimed at a foundation socket falls through to the terrain
    system.select_piece(Some("wall")).unwrap();
    system.tick(&aim_at(foundation_socket));
    assert_eq!(system.controller.binding(), None);

    let edge = connector_pose(&system, a, 7);
    system.tick(&aim_at(edge.position));
    assert_eq!(system.controller.binding(), Some(ConnectorRef { piece: a, index: 7 }));
    assert_eq!(system.controller.ghost().unwrap().pose(), edge);
}

// ============================================================================
// Validity
// ============================================================================

#[test]
fn test_can_place_mirrors_detected_overlaps() {
    let mut system = sandbox();
    place(&mut system, "foundation", Vec3::ZERO).unwrap();
    system.select_piece(Some("crate")).unwrap();

    for target in [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)] {
        system.tick(&aim_at(target));
        let ghost = system.controller.ghost().unwrap();
        assert_eq!(ghost.can_place(), ghost.detected_overlaps().is_empty());
        let expected = if ghost.can_place() {
            MaterialState::PreviewValid
        } else {
            MaterialState::PreviewInvalid
        };
        assert_eq!(ghost.material(), expected);
    }
}

#[test]
fn test_crate_inside_foundation_is_rejected() {
    let mut system = sandbox();
    let a = place(&mut system, "foundation", Vec3::ZERO).unwrap();
    let body = system.world.piece(a).unwrap().body_collider().unwrap();

    system.select_piece(Some("crate")).unwrap();
    system.tick(&aim_at(Vec3::ZERO));
    let ghost_id = system.controller.ghost().unwrap().id();

    assert!(!system.can_place());
    let ghost = system.controller.ghost().unwrap();
    assert!(ghost.detected_overlaps().contains(&body));
    assert_eq!(ghost.material(), MaterialState::PreviewInvalid);

    system.take_events();
    assert_eq!(system.place_block(), None);
    assert_eq!(system.world.piece_count(), 1);
    assert_eq!(system.controller.ghost().unwrap().id(), ghost_id);
    assert!(system.take_events().is_empty());
}

#[test]
fn test_crate_beside_foundation_is_accepted() {
    let mut system = sandbox();
    place(&mut system, "foundation", Vec3::ZERO).unwrap();
    let c = place(&mut system, "crate", Vec3::new(4.0, 0.0, 0.0)).unwrap();

    let placed = system.world.piece(c).unwrap();
    assert_eq!(placed.piece_type(), BuildingPieceType::GenericBlock);
    assert!(placed.house().is_none());
    assert!(placed.connectors().is_empty());
}

#[test]
fn test_ghost_buried_in_terrain_is_rejected() {
    let mut system = sandbox();
    // Boulder half sunk into the ground slab
    let boulder = system.physics.insert(ColliderDesc::new(
        Shape::cube(Vec3::ONE),
        Pose::from_position(Vec3::new(0.0, 0.5, 0.0)),
        Layers::TERRAIN,
    ));

    system.select_piece(Some("crate")).unwrap();
    system.tick(&aim_at(Vec3::new(1.2, 0.0, 0.0)));
    let ghost = system.controller.ghost().unwrap();
    assert!(ghost.is_visible());
    assert!(ghost.detected_overlaps().contains(&boulder));
    assert!(!system.can_place());
    assert_eq!(system.place_block(), None);

    // Resting on flat ground is not an overlap
    system.tick(&aim_at(Vec3::new(4.0, 0.0, 0.0)));
    assert!(system.can_place());
}

// ============================================================================
// Ghost lifecycle
// ============================================================================

#[test]
fn test_disable_enable_leaves_exactly_one_ghost() {
    let mut system = sandbox();
    system.select_piece(Some("foundation")).unwrap();
    system.set_enabled(false);
    assert!(system.controller.ghost().is_none());
    system.set_enabled(true);

    let ghost = system.controller.ghost().unwrap();
    assert_eq!(ghost.piece_type(), BuildingPieceType::Foundation);
    let ghost_id = ghost.id();

    let events = system.take_events();
    let spawned = events.iter().filter(|e| matches!(e, BuildEvent::GhostSpawned(..))).count();
    let destroyed = events.iter().filter(|e| matches!(e, BuildEvent::GhostDestroyed(_))).count();
    assert_eq!(spawned - destroyed, 1);
    assert!(events.contains(&BuildEvent::GhostSpawned(ghost_id, BuildingPieceType::Foundation)));
}

#[test]
fn test_disabled_controller_ignores_input() {
    let mut system = sandbox();
    system.select_piece(Some("crate")).unwrap();
    system.set_enabled(false);
    system.tick(&aim_at(Vec3::ZERO));
    assert_eq!(system.place_block(), None);
    assert_eq!(system.world.piece_count(), 0);
}

#[test]
fn test_unknown_piece_keeps_current_selection() {
    let mut system = sandbox();
    system.select_piece(Some("crate")).unwrap();
    assert!(system.select_piece(Some("tower")).is_err());
    assert_eq!(system.controller.selected().unwrap().name, "crate");

    system.select_piece(None).unwrap();
    assert!(system.controller.ghost().is_none());
    system.tick(&aim_at(Vec3::ZERO));
    assert_eq!(system.place_block(), None);
}

// ============================================================================
// Connector consumption at commit
// ============================================================================

#[test]
fn test_wall_consumes_edge_connector() {
    let mut system = sandbox();
    let a = place(&mut system, "foundation", Vec3::ZERO).unwrap();
    let marker = system.world.piece(a).unwrap().connector(7).unwrap().marker().unwrap();

    let wall = place_on(&mut system, "wall", a, 7).unwrap();

    let edge = system.world.piece(a).unwrap().connector(7).unwrap();
    assert_eq!(edge.consumed_by(), Some(wall));
    assert!(!system.physics.contains(marker));
    assert!(system.world.house_of(a).unwrap().contains(wall));
}

#[test]
fn test_door_enables_details_and_removes_frame_socket() {
    let mut system = sandbox();
    let a = place(&mut system, "foundation", Vec3::ZERO).unwrap();
    let frame = place_on(&mut system, "doorframe", a, 6).unwrap();

    let socket = system.world.piece(frame).unwrap().connector(2).unwrap();
    let marker = socket.marker().unwrap();
    assert_eq!(system.physics.count_enabled(Layers::DOOR_DETAIL), 0);

    let socket_pose = connector_pose(&system, frame, 2);
    system.take_events();
    let door = place(&mut system, "door", socket_pose.position).unwrap();

    let placed = system.world.piece(door).unwrap();
    assert_eq!(placed.pose(), socket_pose);
    assert!(placed.details_enabled());
    assert_eq!(system.physics.count_enabled(Layers::DOOR_DETAIL), 2);
    assert!(!system.physics.contains(marker));
    assert_eq!(system.world.piece(frame).unwrap().connector(2).unwrap().consumed_by(), Some(door));
    assert!(system.take_events().contains(&BuildEvent::DoorDetailsEnabled(door)));
}
