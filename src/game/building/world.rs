//! Building World
//!
//! Owns every placed piece and every house graph. Commit and removal are
//! the only structural changes; both end by re-deriving the exposed
//! connectors of the houses they touched (see `connectivity`).

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

use super::error::BuildError;
use super::events::BuildEvent;
use super::house::{HouseGraph, HouseId};
use super::kinds::{BuildingPieceType, ConnectionKind};
use super::piece::{BuildingPiece, PieceId};
use crate::game::config::BuildConfig;
use crate::physics::{ColliderHandle, ColliderOwner, ColliderRegistry, Pose, SpatialQuery};

/// One connector on one placed piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorRef {
    pub piece: PieceId,
    pub index: usize,
}

#[derive(Debug)]
pub struct BuildingWorld {
    pub(crate) config: BuildConfig,
    pub(crate) pieces: BTreeMap<PieceId, BuildingPiece>,
    pub(crate) houses: BTreeMap<HouseId, HouseGraph>,
    next_piece_id: u32,
    next_house_id: u32,
    events: Vec<BuildEvent>,
}

impl Default for BuildingWorld {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl BuildingWorld {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            pieces: BTreeMap::new(),
            houses: BTreeMap::new(),
            next_piece_id: 0,
            next_house_id: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Ids are shared by ghosts and placed pieces and never reused.
    pub fn allocate_piece_id(&mut self) -> PieceId {
        let id = PieceId(self.next_piece_id);
        self.next_piece_id += 1;
        id
    }

    pub fn piece(&self, id: PieceId) -> Option<&BuildingPiece> {
        self.pieces.get(&id)
    }

    /// Placed pieces in ascending id order.
    pub fn pieces(&self) -> impl Iterator<Item = &BuildingPiece> {
        self.pieces.values()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn house(&self, id: HouseId) -> Option<&HouseGraph> {
        self.houses.get(&id)
    }

    pub fn houses(&self) -> impl Iterator<Item = &HouseGraph> {
        self.houses.values()
    }

    pub fn house_of(&self, piece: PieceId) -> Option<&HouseGraph> {
        self.pieces
            .get(&piece)
            .and_then(|p| p.house)
            .and_then(|h| self.houses.get(&h))
    }

    pub fn take_events(&mut self) -> Vec<BuildEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: BuildEvent) {
        self.events.push(event);
    }

    /// Resolve a marker collider's owner to an active connector.
    pub fn connector_ref_for(&self, owner: ColliderOwner) -> Option<ConnectorRef> {
        let piece = PieceId(owner.entity);
        let index = owner.part? as usize;
        self.pieces
            .get(&piece)?
            .connector(index)
            .filter(|c| c.is_active())
            .map(|_| ConnectorRef { piece, index })
    }

    pub fn connector_world_pose(&self, connector: ConnectorRef) -> Option<Pose> {
        self.pieces.get(&connector.piece)?.connector_world_pose(connector.index)
    }

    /// Placed piece owning a collider, if any.
    pub(crate) fn owner_piece<S: SpatialQuery + ?Sized>(
        &self,
        physics: &S,
        handle: ColliderHandle,
    ) -> Option<PieceId> {
        let owner = physics.collider(handle)?.owner?;
        let id = PieceId(owner.entity);
        self.pieces.contains_key(&id).then_some(id)
    }

    // ========================================================================
    // Commit / removal
    // ========================================================================

    /// Promote a ghost to a placed piece.
    ///
    /// When bound, the piece snaps once more onto the connector, joins the
    /// host's house (creating it around the host if needed), consumes the
    /// connector where its kind calls for it, and the house is rebuilt.
    /// Unbound pieces stand free and belong to no house.
    pub fn commit<R: ColliderRegistry + ?Sized>(
        &mut self,
        mut ghost: BuildingPiece,
        binding: Option<ConnectorRef>,
        physics: &mut R,
    ) -> PieceId {
        let id = ghost.id();
        let piece_type = ghost.piece_type();

        let binding = binding.filter(|b| {
            let active = self
                .pieces
                .get(&b.piece)
                .and_then(|p| p.connector(b.index))
                .is_some_and(|c| c.is_active());
            if !active {
                warn!(
                    "Commit: connector {:?} is no longer exposed, placing {:?} free-standing",
                    b, id
                );
            }
            active
        });
        if let Some(pose) = binding.and_then(|b| self.connector_world_pose(b)) {
            ghost.pose = pose;
        }

        ghost.finalize(physics);
        info!(
            "Placed {} {:?} at {:?}",
            piece_type.name(),
            id,
            ghost.pose().position
        );
        self.pieces.insert(id, ghost);
        self.push_event(BuildEvent::PiecePlaced(id, piece_type));

        if let Some(binding) = binding {
            let house = self.ensure_house(binding.piece);
            self.join_house(id, house);
            self.consume_on_commit(binding, id, piece_type, physics);
            self.rebuild_connectivity(house, physics);
        }
        id
    }

    fn consume_on_commit<R: ColliderRegistry + ?Sized>(
        &mut self,
        binding: ConnectorRef,
        by: PieceId,
        piece_type: BuildingPieceType,
        physics: &mut R,
    ) {
        let kind = self
            .pieces
            .get(&binding.piece)
            .and_then(|p| p.connector(binding.index))
            .map(|c| c.kind);
        let Some(kind) = kind else {
            return;
        };
        let consumes = match kind {
            ConnectionKind::Edge => matches!(
                piece_type,
                BuildingPieceType::EdgeBlock | BuildingPieceType::Doorframe
            ),
            ConnectionKind::Door => piece_type == BuildingPieceType::Door,
            // Left to the house proximity sweeps
            ConnectionKind::Foundation | ConnectionKind::Ceiling => false,
        };
        if consumes {
            self.consume(binding, by, physics);
        }
    }

    /// Destroy a connector's marker on behalf of `by`. A consumed door
    /// socket also switches on the door's detail colliders.
    pub(crate) fn consume<R: ColliderRegistry + ?Sized>(
        &mut self,
        target: ConnectorRef,
        by: PieceId,
        physics: &mut R,
    ) -> bool {
        let Some(piece) = self.pieces.get_mut(&target.piece) else {
            return false;
        };
        let Some(kind) = piece.connector(target.index).map(|c| c.kind) else {
            return false;
        };
        if !piece.consume_connector(target.index, by, physics) {
            return false;
        }
        debug!("Connector {:?}#{} ({:?}) consumed by {:?}", target.piece, target.index, kind, by);
        self.push_event(BuildEvent::ConnectorConsumed {
            piece: target.piece,
            index: target.index,
            by,
        });

        if kind == ConnectionKind::Door {
            let enabled = self.pieces.get_mut(&by).is_some_and(|door| door.enable_details(physics));
            if enabled {
                debug!("Door {:?}: detail colliders enabled", by);
                self.push_event(BuildEvent::DoorDetailsEnabled(by));
            }
        }
        true
    }

    /// Remove a placed piece: its colliders go, it leaves its house, and
    /// every connector it had consumed elsewhere is exposed again before
    /// the affected houses are rebuilt.
    pub fn remove_piece<R: ColliderRegistry + ?Sized>(
        &mut self,
        id: PieceId,
        physics: &mut R,
    ) -> Result<BuildingPiece, BuildError> {
        let mut piece = self.pieces.remove(&id).ok_or(BuildError::UnknownPieceId(id))?;
        piece.release_colliders(physics);

        let mut affected = BTreeSet::new();
        if let Some(house_id) = piece.house.take() {
            if let Some(house) = self.houses.get_mut(&house_id) {
                house.remove(id);
                if house.is_empty() {
                    self.houses.remove(&house_id);
                    debug!("House {:?} dropped (no members left)", house_id);
                } else {
                    affected.insert(house_id);
                }
            }
        }

        for other in self.pieces.values_mut() {
            for index in 0..other.connectors().len() {
                if other.connector(index).and_then(|c| c.consumed_by()) != Some(id) {
                    continue;
                }
                if other.restore_connector(index, physics) {
                    self.events.push(BuildEvent::ConnectorRestored { piece: other.id(), index });
                    if let Some(house) = other.house {
                        affected.insert(house);
                    }
                }
            }
        }

        info!("Removed {} {:?}", piece.piece_type().name(), id);
        self.push_event(BuildEvent::PieceRemoved(id));

        for house in affected {
            self.rebuild_connectivity(house, physics);
        }
        Ok(piece)
    }

    /// Rebuild every house. Returns the number of connectors consumed.
    pub fn rebuild_all<R: ColliderRegistry + ?Sized>(&mut self, physics: &mut R) -> usize {
        let ids: Vec<HouseId> = self.houses.keys().copied().collect();
        ids.into_iter()
            .map(|house| self.rebuild_connectivity(house, physics))
            .sum()
    }

    /// Drop every piece and house, releasing their colliders.
    pub fn clear<R: ColliderRegistry + ?Sized>(&mut self, physics: &mut R) {
        for piece in self.pieces.values_mut() {
            piece.release_colliders(physics);
        }
        self.pieces.clear();
        self.houses.clear();
    }

    // ========================================================================
    // House membership
    // ========================================================================

    pub(crate) fn create_house(&mut self) -> HouseId {
        let id = HouseId(self.next_house_id);
        self.next_house_id += 1;
        self.houses.insert(id, HouseGraph::new(id));
        id
    }

    /// House of `piece`, creating one around it if it stands free.
    fn ensure_house(&mut self, piece: PieceId) -> HouseId {
        if let Some(house) = self.pieces.get(&piece).and_then(|p| p.house) {
            return house;
        }
        let house = self.create_house();
        debug!("House {:?} created around {:?}", house, piece);
        self.join_house(piece, house);
        house
    }

    pub(crate) fn join_house(&mut self, piece: PieceId, house: HouseId) {
        let Some(graph) = self.houses.get_mut(&house) else {
            return;
        };
        graph.insert(piece);
        if let Some(p) = self.pieces.get_mut(&piece) {
            p.house = Some(house);
        }
        self.push_event(BuildEvent::Reparented { piece, house });
    }

    /// Union by size: the smaller house moves into the larger one (ties keep
    /// the lower id). Returns the surviving house.
    pub fn merge_houses(&mut self, a: HouseId, b: HouseId) -> HouseId {
        if a == b {
            return a;
        }
        let size_a = self.houses.get(&a).map(HouseGraph::len);
        let size_b = self.houses.get(&b).map(HouseGraph::len);
        let (Some(size_a), Some(size_b)) = (size_a, size_b) else {
            return a;
        };
        let (kept, absorbed) = if size_a > size_b || (size_a == size_b && a < b) {
            (a, b)
        } else {
            (b, a)
        };

        let Some(graph) = self.houses.remove(&absorbed) else {
            return kept;
        };
        let moved: Vec<PieceId> = graph.members().collect();
        if let Some(target) = self.houses.get_mut(&kept) {
            target.absorb(graph);
        }
        for piece in moved {
            if let Some(p) = self.pieces.get_mut(&piece) {
                p.house = Some(kept);
            }
            self.push_event(BuildEvent::Reparented { piece, house: kept });
        }

        info!("Merged house {:?} into {:?}", absorbed, kept);
        self.push_event(BuildEvent::HousesMerged { kept, absorbed });
        kept
    }
}
