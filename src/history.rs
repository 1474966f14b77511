use std::collections::HashSet;

use crate::model::entity::Id;
use crate::model::table::Seating;

/// Unordered pair of guests, stored smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(Id, Id);

impl PairKey {
    pub fn new(a: Id, b: Id) -> PairKey {
        if a <= b { PairKey(a, b) } else { PairKey(b, a) }
    }
}

/// Pairs that already sat together at an earlier meal of this run.
/// Grows only; a fresh value starts every run.
#[derive(Debug, Clone, Default)]
pub struct NeighbourHistory {
    pairs: HashSet<PairKey>,
}

impl NeighbourHistory {
    pub fn new() -> NeighbourHistory {
        NeighbourHistory::default()
    }

    pub fn contains(&self, a: Id, b: Id) -> bool {
        self.pairs.contains(&PairKey::new(a, b))
    }

    /// Records every adjacent pair of `seating`. Returns how many were new.
    pub fn commit(&mut self, seating: &Seating) -> usize {
        seating.adjacent_pairs()
            .filter(|&(a, b)| self.pairs.insert(PairKey::new(a, b)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
