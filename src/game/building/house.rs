//! House graphs
//!
//! A house is the set of physically connected pieces treated as one
//! structure when pruning sockets. Membership is an explicit id set,
//! grown on commit and shrunk on removal; each member's `house` field
//! mirrors it for the host's scene graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::piece::PieceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseGraph {
    id: HouseId,
    members: BTreeSet<PieceId>,
}

impl HouseGraph {
    pub fn new(id: HouseId) -> Self {
        Self {
            id,
            members: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> HouseId {
        self.id
    }

    /// Members in ascending id order.
    pub fn members(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.members.iter().copied()
    }

    pub fn contains(&self, piece: PieceId) -> bool {
        self.members.contains(&piece)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert(&mut self, piece: PieceId) -> bool {
        self.members.insert(piece)
    }

    pub(crate) fn remove(&mut self, piece: PieceId) -> bool {
        self.members.remove(&piece)
    }

    /// Move every member of `other` into this house.
    pub(crate) fn absorb(&mut self, other: HouseGraph) {
        self.members.extend(other.members);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_are_ordered() {
        let mut house = HouseGraph::new(HouseId(0));
        house.insert(PieceId(5));
        house.insert(PieceId(2));
        assert!(!house.insert(PieceId(5)));
        assert_eq!(house.members().collect::<Vec<_>>(), vec![PieceId(2), PieceId(5)]);
    }

    #[test]
    fn test_absorb_unions_members() {
        let mut a = HouseGraph::new(HouseId(0));
        a.insert(PieceId(1));
        let mut b = HouseGraph::new(HouseId(1));
        b.insert(PieceId(2));
        b.insert(PieceId(3));

        a.absorb(b);
        assert_eq!(a.len(), 3);
        assert!(a.contains(PieceId(3)));
        assert!(a.remove(PieceId(1)));
        assert_eq!(a.len(), 2);
    }
}
