//! House connectivity rebuild
//!
//! After every structural change the touched house re-derives which of its
//! members' connectors are still exposed. A connector is consumed when
//! either
//! - a body of the matching type sits on it (its occupancy probe lies inside
//!   a Foundation, wall, Ceiling or Door body), or
//! - another piece exposes a coincident marker of the same kind, in which
//!   case only one of the pair survives.
//!
//! Members are visited in ascending id order and every consumption removes
//! its marker immediately, so of two coincident markers the first one
//! visited goes and the later one stays.

use glam::Vec3;
use log::{debug, trace};

use super::house::HouseId;
use super::kinds::{BuildingPieceType, ConnectionKind};
use super::piece::PieceId;
use super::world::{BuildingWorld, ConnectorRef};
use crate::physics::{ColliderRegistry, Layers, SpatialQuery};

impl BuildingWorld {
    /// Prune the exposed connectors of every member of `house`. Returns how
    /// many connectors were consumed; a second call without structural
    /// change returns 0.
    ///
    /// With `merge_adjacent_houses` set, a consumption caused by a piece of
    /// another house merges the two houses (a free-standing consumer is
    /// adopted) and the surviving house is swept again.
    pub fn rebuild_connectivity<R: ColliderRegistry + ?Sized>(
        &mut self,
        house: HouseId,
        physics: &mut R,
    ) -> usize {
        let mut current = house;
        let mut consumed = 0;

        loop {
            let Some(graph) = self.houses.get(&current) else {
                return consumed;
            };
            let members: Vec<PieceId> = graph.members().collect();
            let mut regrouped = false;

            for piece_id in members {
                let connector_count =
                    self.pieces.get(&piece_id).map_or(0, |p| p.connectors().len());
                for index in 0..connector_count {
                    let target = ConnectorRef { piece: piece_id, index };
                    let Some(by) = self.find_cover(target, &*physics) else {
                        continue;
                    };
                    if !self.consume(target, by, physics) {
                        continue;
                    }
                    consumed += 1;

                    if self.config.merge_adjacent_houses {
                        let (house, changed) = self.absorb_consumer(current, by);
                        current = house;
                        regrouped |= changed;
                    }
                }
            }

            if !regrouped {
                break;
            }
        }

        debug!("House {:?} rebuilt: {} connectors consumed", current, consumed);
        consumed
    }

    /// Piece covering an active connector, if any.
    fn find_cover<S: SpatialQuery + ?Sized>(
        &self,
        target: ConnectorRef,
        physics: &S,
    ) -> Option<PieceId> {
        let piece = self.pieces.get(&target.piece)?;
        let connector = piece.connector(target.index)?;
        let marker = connector.marker()?;
        let pose = connector.world_pose(&piece.pose);

        // Occupancy: a body of the kind that snaps here
        let probe = connector.probe_point(&piece.pose);
        let occupant = physics
            .overlap_sphere(probe, self.config.occupancy_probe_radius, Layers::PIECE)
            .into_iter()
            .filter_map(|handle| self.owner_piece(physics, handle))
            .filter(|id| *id != target.piece)
            .find(|id| {
                self.pieces
                    .get(id)
                    .is_some_and(|p| p.piece_type().occupies(connector.kind))
            });
        if occupant.is_some() {
            trace!("{:?}#{} occupied by {:?}", target.piece, target.index, occupant);
            return occupant;
        }

        // Duplicate markers
        let radius = connector.marker_radius;
        match (piece.piece_type(), connector.kind) {
            (BuildingPieceType::Foundation, ConnectionKind::Foundation) => self
                .marker_owners(physics, pose.position, radius, Layers::FOUNDATION_CONNECTOR)
                .filter(|id| *id != target.piece)
                .find(|id| {
                    self.pieces
                        .get(id)
                        .is_some_and(|p| p.piece_type() == BuildingPieceType::Foundation)
                }),

            (BuildingPieceType::Foundation | BuildingPieceType::Ceiling, ConnectionKind::Edge) => {
                let center = pose.position - Vec3::Y * self.config.edge_sweep_offset;
                let sweep = self.config.edge_sweep_radius;
                let hits = physics.overlap_sphere(center, sweep, Layers::EDGE_CONNECTOR);
                if hits.len() < 2 {
                    return None;
                }
                hits.into_iter()
                    .filter(|handle| *handle != marker)
                    .filter_map(|handle| self.owner_piece(physics, handle))
                    .find(|id| *id != target.piece)
            }

            (BuildingPieceType::Ceiling, ConnectionKind::Ceiling) => self
                .marker_owners(physics, pose.position, radius, Layers::CEILING_CONNECTOR)
                .find(|id| *id != target.piece),

            _ => None,
        }
    }

    fn marker_owners<'a, S: SpatialQuery + ?Sized>(
        &'a self,
        physics: &'a S,
        center: Vec3,
        radius: f32,
        layer: Layers,
    ) -> impl Iterator<Item = PieceId> + 'a {
        physics
            .overlap_sphere(center, radius, layer)
            .into_iter()
            .filter_map(move |handle| self.owner_piece(physics, handle))
    }

    /// Pull the consumer's house into `house`. Returns the surviving house
    /// and whether membership changed.
    fn absorb_consumer(&mut self, house: HouseId, by: PieceId) -> (HouseId, bool) {
        match self.pieces.get(&by).and_then(|p| p.house) {
            Some(other) if other == house => (house, false),
            Some(other) => (self.merge_houses(house, other), true),
            None => {
                self.join_house(by, house);
                (house, true)
            }
        }
    }
}
