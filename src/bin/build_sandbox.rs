//! Build Sandbox
//!
//! Headless walk-through of the building system: two foundations, a wall,
//! a ceiling, a doorframe and a door, then a save/load round trip.
//!
//! Run with: cargo run --bin build_sandbox
//! Optional args: [catalog.json] [build_config.json]

use std::path::PathBuf;

use glam::Vec3;
use log::{error, info};

use homestead_engine::ViewRay;
use homestead_engine::game::{BuildConfig, BuildError, BuildingSystem, PieceCatalog, PieceId};
use homestead_engine::physics::{CollisionWorld, Layers};

/// Eye placed above and behind `target`, looking straight at it.
fn aim_at(target: Vec3) -> ViewRay {
    ViewRay::looking_at(target + Vec3::new(0.0, 3.0, 3.0), target)
}

fn connector_position(system: &BuildingSystem<CollisionWorld>, piece: PieceId, index: usize) -> Option<Vec3> {
    system.world.piece(piece)?.connector_world_pose(index).map(|pose| pose.position)
}

fn place(system: &mut BuildingSystem<CollisionWorld>, name: &str, target: Vec3) -> Result<Option<PieceId>, BuildError> {
    system.select_piece(Some(name))?;
    system.tick(&aim_at(target));
    let placed = system.place_block();
    match placed {
        Some(id) => info!("{name}: placed as {id:?}"),
        None => error!("{name}: placement at {target:?} rejected"),
    }
    Ok(placed)
}

fn report(system: &BuildingSystem<CollisionWorld>) {
    for house in system.world.houses() {
        let members: Vec<_> = house.members().collect();
        info!("House {:?}: {} members {:?}", house.id(), house.len(), members);
    }
    for piece in system.world.pieces() {
        info!(
            "  {:?} {:<10} at {:?}: {}/{} connectors exposed",
            piece.id(),
            piece.template_name(),
            piece.pose().position,
            piece.active_connector_count(),
            piece.connectors().len()
        );
    }
    info!(
        "Markers registered: {}, door details enabled: {}",
        system.physics.count_enabled(Layers::CONNECTORS),
        system.physics.count_enabled(Layers::DOOR_DETAIL)
    );
}

fn run() -> Result<(), BuildError> {
    let args: Vec<String> = std::env::args().collect();
    let catalog = match args.get(1) {
        Some(path) => PieceCatalog::load(&PathBuf::from(path))?,
        None => PieceCatalog::standard()?,
    };
    let config = match args.get(2) {
        Some(path) => BuildConfig::load(&PathBuf::from(path))?,
        None => BuildConfig::default(),
    };

    let mut physics = CollisionWorld::new();
    physics.add_ground_slab(Vec3::ZERO, 100.0, 0.0);
    let mut system = BuildingSystem::new(physics, catalog, config);

    let Some(a) = place(&mut system, "foundation", Vec3::ZERO)? else {
        return Ok(());
    };
    if let Some(target) = connector_position(&system, a, 0) {
        place(&mut system, "foundation", target)?;
    }

    // -Z edge of the first foundation
    let wall = match connector_position(&system, a, 7) {
        Some(target) => place(&mut system, "wall", target)?,
        None => None,
    };
    if let Some(target) = wall.and_then(|w| connector_position(&system, w, 0)) {
        place(&mut system, "ceiling", target)?;
    }

    // +Z edge, opposite the wall
    let frame = match connector_position(&system, a, 6) {
        Some(target) => place(&mut system, "doorframe", target)?,
        None => None,
    };
    if let Some(target) = frame.and_then(|f| connector_position(&system, f, 2)) {
        place(&mut system, "door", target)?;
    }

    system.set_enabled(false);
    report(&system);
    info!("{} build events emitted", system.take_events().len());

    let path = std::env::temp_dir().join("homestead_sandbox.json");
    system.save(&path)?;
    let restored = system.load(&path)?;
    info!("Reloaded {} pieces from {}", restored, path.display());
    report(&system);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("Build sandbox failed: {e}");
        std::process::exit(1);
    }
}
