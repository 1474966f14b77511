use itertools::Itertools;

use crate::history::NeighbourHistory;
use crate::model::condition::{Score, Weights};
use crate::model::entity::Id;
use crate::model::table::Seating;
use crate::registry::GuestRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairFlags {
    pub preferred: bool,
    pub related: bool,
    pub same_sex: bool,
    pub repeat: bool,
}

/// Contribution of two guests sitting side by side. Same-sex pairs are
/// counted per table by [`Evaluator`], not here.
#[derive(Debug, Clone, Copy)]
pub struct PairScorer<'a> {
    registry: &'a GuestRegistry,
    weights: &'a Weights,
}

impl<'a> PairScorer<'a> {
    pub fn new(registry: &'a GuestRegistry, weights: &'a Weights) -> PairScorer<'a> {
        PairScorer { registry, weights }
    }

    pub fn score(&self, a: Id, b: Id, history: &NeighbourHistory) -> Score {
        let flags = self.flags(a, b, history);
        let mut score: Score = 0;
        if flags.preferred {
            score = score.saturating_add(self.weights.bonus_preferred);
        }
        if flags.related {
            score = score.saturating_sub(self.weights.penalty_relation);
        }
        if flags.repeat {
            score = score.saturating_sub(self.weights.penalty_repeat);
        }
        score
    }

    pub fn is_same_sex(&self, a: Id, b: Id) -> bool {
        match (self.registry.sex(a), self.registry.sex(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn flags(&self, a: Id, b: Id, history: &NeighbourHistory) -> PairFlags {
        PairFlags {
            preferred: self.registry.is_preferred(a, b) || self.registry.is_preferred(b, a),
            related: self.registry.is_related(a, b),
            same_sex: self.is_same_sex(a, b),
            repeat: history.contains(a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    pub left: Id,
    pub right: Id,
    pub flags: PairFlags,
    pub score: Score,
}

/// Score of one full seating plus the per-pair breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub total: Score,
    pub adjacencies: Vec<Adjacency>,
    pub same_sex_pairs: usize,
    /// Same-sex pairs beyond the configured limit.
    pub same_sex_excess: usize,
}

impl Evaluation {
    fn count(&self, pred: impl Fn(&PairFlags) -> bool) -> usize {
        self.adjacencies.iter().filter(|adj| pred(&adj.flags)).count()
    }

    pub fn preferred_pairs(&self) -> usize {
        self.count(|f| f.preferred)
    }

    pub fn related_pairs(&self) -> usize {
        self.count(|f| f.related)
    }

    pub fn repeat_pairs(&self) -> usize {
        self.count(|f| f.repeat)
    }

    /// No repeat neighbours and the same-sex limit holds.
    pub fn is_compliant(&self) -> bool {
        self.repeat_pairs() == 0 && self.same_sex_excess == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    scorer: PairScorer<'a>,
    weights: &'a Weights,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a GuestRegistry, weights: &'a Weights) -> Evaluator<'a> {
        Evaluator { scorer: PairScorer::new(registry, weights), weights }
    }

    fn table_penalty(&self, same_sex_pairs: usize) -> (usize, Score) {
        let excess = same_sex_pairs.saturating_sub(self.weights.same_sex_limit);
        let penalty = self.weights.penalty_same_sex.saturating_mul(same_sex_pairs as Score)
            .saturating_add(self.weights.penalty_same_sex_excess.saturating_mul(excess as Score));
        (excess, penalty)
    }

    pub fn evaluate(&self, seating: &Seating, history: &NeighbourHistory) -> Evaluation {
        let adjacencies: Vec<Adjacency> = seating.adjacent_pairs()
            .map(|(left, right)| Adjacency {
                left,
                right,
                flags: self.scorer.flags(left, right, history),
                score: self.scorer.score(left, right, history),
            })
            .collect();
        let same_sex_pairs = adjacencies.iter().filter(|adj| adj.flags.same_sex).count();
        let (same_sex_excess, penalty) = self.table_penalty(same_sex_pairs);
        let total = adjacencies.iter()
            .fold(0 as Score, |sum, adj| sum.saturating_add(adj.score))
            .saturating_sub(penalty);
        Evaluation { total, adjacencies, same_sex_pairs, same_sex_excess }
    }

    /// Same total as [`Evaluator::evaluate`] without building the breakdown.
    pub fn total(&self, seating: &Seating, history: &NeighbourHistory) -> Score {
        let (pair_sum, same_sex_pairs) = seating.adjacent_pairs()
            .fold((0 as Score, 0), |(sum, same_sex), (a, b)| {
                (
                    sum.saturating_add(self.scorer.score(a, b, history)),
                    same_sex + self.scorer.is_same_sex(a, b) as usize,
                )
            });
        pair_sum.saturating_sub(self.table_penalty(same_sex_pairs).1)
    }

    /// No seating of `attendees` can score above this: every other term is a
    /// penalty and each guest has at most two neighbours.
    pub fn upper_bound(&self, attendees: &[Id]) -> Score {
        let preferred = attendees.iter()
            .tuple_combinations()
            .filter(|&(&a, &b)| {
                self.scorer.registry.is_preferred(a, b) || self.scorer.registry.is_preferred(b, a)
            })
            .count();
        self.weights.bonus_preferred.saturating_mul(preferred.min(attendees.len()) as Score)
    }
}
