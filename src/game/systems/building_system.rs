//! Building lifecycle system.
//!
//! Owns the physics collaborator, the building world, the placement
//! controller and the piece catalog, providing a single interface for all
//! building operations with zero rendering coupling.

use std::path::Path;

use log::info;

use crate::camera::ViewRay;
use crate::game::builder::PlacementController;
use crate::game::building::{
    BuildError, BuildEvent, BuildingWorld, PieceCatalog, PieceId, load_snapshot, save_snapshot,
};
use crate::game::config::BuildConfig;
use crate::physics::{ColliderRegistry, Layers, SpatialQuery};

/// Manages the full lifecycle of building pieces.
///
/// Hosts drive it once per frame with `tick`, forward the player's place and
/// remove inputs, and drain `take_events` to mirror the scene graph.
pub struct BuildingSystem<S: ColliderRegistry> {
    pub physics: S,
    pub world: BuildingWorld,
    pub controller: PlacementController,
    pub catalog: PieceCatalog,
}

impl<S: ColliderRegistry> BuildingSystem<S> {
    pub fn new(physics: S, catalog: PieceCatalog, config: BuildConfig) -> Self {
        Self {
            physics,
            world: BuildingWorld::new(config),
            controller: PlacementController::new(),
            catalog,
        }
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Select a piece by catalog name; `None` clears the selection.
    pub fn select_piece(&mut self, name: Option<&str>) -> Result<(), BuildError> {
        let template = name.map(|n| self.catalog.require(n)).transpose()?;
        self.controller.change_building_block(template, &mut self.world)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.controller.set_enabled(enabled, &mut self.world);
    }

    pub fn tick(&mut self, view: &ViewRay) {
        self.controller.tick(view, &self.world, &self.physics);
    }

    pub fn can_place(&self) -> bool {
        self.controller.can_place()
    }

    /// Commit the current ghost. `None` when the placement was rejected.
    pub fn place_block(&mut self) -> Option<PieceId> {
        self.controller.place_block(&mut self.world, &mut self.physics)
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    pub fn remove_piece(&mut self, id: PieceId) -> Result<(), BuildError> {
        self.world.remove_piece(id, &mut self.physics)?;
        Ok(())
    }

    /// Remove the placed piece under the crosshair, if any.
    pub fn remove_aimed(&mut self, view: &ViewRay) -> Option<PieceId> {
        let hit = self.physics.raycast(
            view.origin,
            view.direction,
            self.world.config().max_reach,
            Layers::PIECE,
        )?;
        let id = PieceId(hit.owner?.entity);
        self.world.remove_piece(id, &mut self.physics).ok().map(|_| id)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<(), BuildError> {
        save_snapshot(path, &self.world.snapshot())
    }

    /// Replace every placed piece with the contents of a snapshot file.
    pub fn load(&mut self, path: &Path) -> Result<usize, BuildError> {
        let snapshot = load_snapshot(path)?;
        let restored = self.world.restore(&snapshot, &self.catalog, &mut self.physics)?;
        info!("Building system: {} pieces loaded", restored);
        Ok(restored)
    }

    pub fn take_events(&mut self) -> Vec<BuildEvent> {
        self.world.take_events()
    }
}
