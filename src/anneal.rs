use std::cmp::Ordering;
use std::time::{Duration, Instant};

use itertools::Itertools;
use rand::prelude::{Rng, SliceRandom};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::action::{Action, Index};
use crate::history::NeighbourHistory;
use crate::model::condition::Score;
use crate::model::entity::{Id, Sex};
use crate::model::table::Seating;
use crate::registry::GuestRegistry;
use crate::score::{Evaluation, Evaluator};

/// Rule for taking a perturbed seating as the new current one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Acceptance {
    /// Accept when the score does not drop.
    Greedy,
    /// Also accept a drop `d` with probability `exp(-d / t)`; `t` is multiplied
    /// by `cooling_rate` after every iteration and reset on restart.
    Annealing { temperature: f64, cooling_rate: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub restarts: usize,
    /// Iterations per restart.
    pub iterations: usize,
    pub acceptance: Acceptance,
    /// Stop as soon as this score is reached. The search also stops at the
    /// best score attainable for the attendee set.
    pub target_score: Option<Score>,
    pub time_limit_ms: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            restarts: 10,
            iterations: 5000,
            acceptance: Acceptance::Greedy,
            target_score: None,
            time_limit_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Fewer than three attendees; nothing to search.
    Trivial,
    BudgetExhausted,
    TargetReached,
    TimeLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStats {
    pub restarts: usize,
    pub iterations: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrangement {
    pub seating: Seating,
    pub evaluation: Evaluation,
    pub stats: SearchStats,
}

impl Arrangement {
    /// False when a repeat neighbour or an extra same-sex pair could not be avoided.
    pub fn is_success(&self) -> bool {
        self.evaluation.is_compliant()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealPlan {
    /// Nobody attends the meal.
    NoPlan,
    Seated(Arrangement),
}

impl MealPlan {
    pub fn arrangement(&self) -> Option<&Arrangement> {
        match self {
            MealPlan::NoPlan => None,
            MealPlan::Seated(arrangement) => Some(arrangement),
        }
    }
}

/// A seating seen during the search, ranked by score and then by discovery order.
#[derive(Debug, Clone)]
struct Candidate {
    seating: Seating,
    score: Score,
    sequence: u64,
}

impl Candidate {
    /// Higher score ranks first; on equal scores the earlier candidate does.
    fn rank(&self, other: &Candidate) -> Ordering {
        self.score.cmp(&other.score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

struct State {
    seating: Seating,
    score: Score,
    temperature: f64,
}

struct MoveGenerator {
    size: Index,
}

impl MoveGenerator {
    fn next(&self, rng: &mut SmallRng) -> Action {
        let n = self.size;
        if rng.gen_bool(0.5) {
            let i = rng.gen_range(0..n);
            let j = (i + rng.gen_range(1..n)) % n;
            Action::Swap(i, j)
        } else {
            Action::Reverse { start: rng.gen_range(0..n), len: rng.gen_range(2..n) }
        }
    }
}

pub struct Search<'a> {
    registry: &'a GuestRegistry,
    evaluator: Evaluator<'a>,
    params: &'a Params,
}

impl<'a> Search<'a> {
    pub fn new(registry: &'a GuestRegistry, evaluator: Evaluator<'a>, params: &'a Params) -> Search<'a> {
        Search { registry, evaluator, params }
    }

    /// Seats `attendees` for one meal. Never fails for a non-empty set; an
    /// empty set yields [`MealPlan::NoPlan`].
    pub fn solve(&self, attendees: &[Id], history: &NeighbourHistory, rng: &mut SmallRng) -> MealPlan {
        let n = attendees.len();
        if n == 0 {
            return MealPlan::NoPlan;
        }
        if n < 3 {
            let seating = Seating::new(attendees.to_vec());
            let evaluation = self.evaluator.evaluate(&seating, history);
            let stats = SearchStats { restarts: 0, iterations: 0, stop: StopReason::Trivial };
            return MealPlan::Seated(Arrangement { seating, evaluation, stats });
        }

        let bound = self.evaluator.upper_bound(attendees);
        let target = self.params.target_score.map_or(bound, |t| t.min(bound));
        let deadline = self.params.time_limit_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        let generator = MoveGenerator { size: n };

        let mut sequence = 0u64;
        let mut best: Option<Candidate> = None;
        let mut stats = SearchStats { restarts: 0, iterations: 0, stop: StopReason::BudgetExhausted };

        'restarts: for restart in 0..self.params.restarts {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                stats.stop = StopReason::TimeLimit;
                break;
            }
            stats.restarts += 1;
            let seating = if restart == 0 {
                self.alternating_seating(attendees, rng)
            } else {
                fresh_seating(attendees, best.as_ref().map(|b| &b.seating), rng)
            };
            let score = self.evaluator.total(&seating, history);
            let mut state = State { seating, score, temperature: self.initial_temperature() };
            offer(&mut best, Candidate { seating: state.seating.clone(), score, sequence });
            sequence += 1;
            debug!(restart, score, "restart");
            if best.as_ref().map_or(false, |b| b.score >= target) {
                stats.stop = StopReason::TargetReached;
                break;
            }

            for _ in 0..self.params.iterations {
                if deadline.map_or(false, |d| Instant::now() >= d) {
                    stats.stop = StopReason::TimeLimit;
                    break 'restarts;
                }
                stats.iterations += 1;
                let action = generator.next(rng);
                if let Err(err) = action.apply(&mut state.seating) {
                    debug!(%err, "skipped move");
                    continue;
                }
                let score = self.evaluator.total(&state.seating, history);
                if self.accept(&state, score, rng) {
                    trace!(?action, from = state.score, to = score, "accepted");
                    state.score = score;
                    offer(&mut best, Candidate { seating: state.seating.clone(), score, sequence });
                    sequence += 1;
                } else {
                    // self-inverse, so this restores the previous seating
                    let undone = action.apply(&mut state.seating);
                    debug_assert!(undone.is_ok());
                }
                if let Acceptance::Annealing { cooling_rate, .. } = self.params.acceptance {
                    state.temperature *= cooling_rate;
                }
                if best.as_ref().map_or(false, |b| b.score >= target) {
                    stats.stop = StopReason::TargetReached;
                    break 'restarts;
                }
            }
        }

        // at least one restart ran unless the deadline had already passed
        let seating = match best {
            Some(candidate) => candidate.seating,
            None => Seating::new(attendees.to_vec()),
        };
        let evaluation = self.evaluator.evaluate(&seating, history);
        MealPlan::Seated(Arrangement { seating, evaluation, stats })
    }

    fn initial_temperature(&self) -> f64 {
        match self.params.acceptance {
            Acceptance::Greedy => 0.0,
            Acceptance::Annealing { temperature, .. } => temperature,
        }
    }

    fn accept(&self, state: &State, score: Score, rng: &mut SmallRng) -> bool {
        if score >= state.score {
            return true;
        }
        match self.params.acceptance {
            Acceptance::Greedy => false,
            Acceptance::Annealing { .. } => {
                state.temperature > 0.0
                    && rng.gen::<f64>() < (score.saturating_sub(state.score) as f64 / state.temperature).exp()
            }
        }
    }

    /// Men and women interleaved, each group shuffled; the surplus of the
    /// larger group ends up seated together.
    fn alternating_seating(&self, attendees: &[Id], rng: &mut SmallRng) -> Seating {
        let (mut men, mut women): (Vec<Id>, Vec<Id>) = attendees.iter()
            .partition(|&&id| self.registry.sex(id) == Some(Sex::Male));
        men.shuffle(rng);
        women.shuffle(rng);
        let (first, second) = if men.len() >= women.len() { (men, women) } else { (women, men) };
        Seating::new(first.into_iter().interleave(second).collect())
    }
}

/// A shuffled seating that is not a rotation of `best`. Reversing a cycle of
/// three or more seats always gives a different cycle.
fn fresh_seating(attendees: &[Id], best: Option<&Seating>, rng: &mut SmallRng) -> Seating {
    let mut seats = attendees.to_vec();
    seats.shuffle(rng);
    let mut seating = Seating::new(seats);
    if best.map_or(false, |b| b.same_cycle(&seating)) {
        seating.seats.reverse();
    }
    seating
}

fn offer(best: &mut Option<Candidate>, candidate: Candidate) {
    let replace = match best {
        Some(current) => candidate.rank(current) == Ordering::Greater,
        None => true,
    };
    if replace {
        *best = Some(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::condition::Weights;
    use crate::registry::GuestRecord;
    use rand::SeedableRng;

    fn registry(records: Vec<GuestRecord>) -> GuestRegistry {
        GuestRegistry::build(records, vec!["m".into()]).0
    }

    fn mixed(n: usize) -> Vec<GuestRecord> {
        (0..n).map(|i| {
            let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
            GuestRecord::new(&format!("G{}", i), sex).attends(&["m"])
        }).collect()
    }

    #[test]
    fn earlier_candidate_wins_ties() {
        let seating = Seating::new(vec![0, 1, 2]);
        let first = Candidate { seating: seating.clone(), score: 5, sequence: 0 };
        let later = Candidate { seating: seating.clone(), score: 5, sequence: 1 };
        let better = Candidate { seating, score: 6, sequence: 2 };
        let mut best = Some(first);
        offer(&mut best, later);
        assert_eq!(best.as_ref().unwrap().sequence, 0);
        offer(&mut best, better);
        assert_eq!(best.as_ref().unwrap().sequence, 2);
    }

    #[test]
    fn restarts_never_begin_at_a_rotation_of_the_best() {
        let best = Seating::new(vec![0, 1, 2]);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            let seating = fresh_seating(&[0, 1, 2], Some(&best), &mut rng);
            assert!(!best.same_cycle(&seating));
            let mut seats = seating.seats.clone();
            seats.sort();
            assert_eq!(seats, vec![0, 1, 2]);
        }
    }

    #[test]
    fn expired_time_limit_still_seats_everyone() {
        let registry = registry(mixed(7));
        let weights = Weights::default();
        let params = Params { time_limit_ms: Some(0), ..Params::default() };
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let attendees = registry.attendees_for("m");
        let plan = search.solve(&attendees, &NeighbourHistory::new(), &mut SmallRng::seed_from_u64(2));
        let arrangement = plan.arrangement().unwrap();
        assert_eq!(arrangement.stats.stop, StopReason::TimeLimit);
        let mut seats = arrangement.seating.seats.clone();
        seats.sort();
        assert_eq!(seats, attendees);
        assert_eq!(arrangement.evaluation.adjacencies.len(), 7);
    }

    #[test]
    fn reachable_target_stops_early() {
        let mut records = mixed(6);
        records[0] = records[0].clone().prefers(&["G3"]);
        let registry = registry(records);
        let weights = Weights::default();
        let params = Params { target_score: Some(-10_000), ..Params::default() };
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let attendees = registry.attendees_for("m");
        let plan = search.solve(&attendees, &NeighbourHistory::new(), &mut SmallRng::seed_from_u64(4));
        let arrangement = plan.arrangement().unwrap();
        assert_eq!(arrangement.stats.stop, StopReason::TargetReached);
        assert!(arrangement.evaluation.total >= -10_000);
        assert!(arrangement.stats.iterations < params.restarts * params.iterations);
    }

    #[test]
    fn empty_meal_has_no_plan() {
        let registry = registry(mixed(3));
        let weights = Weights::default();
        let params = Params::default();
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(search.solve(&[], &NeighbourHistory::new(), &mut rng), MealPlan::NoPlan);
    }

    #[test]
    fn small_tables_are_trivial() {
        let registry = registry(mixed(2));
        let weights = Weights::default();
        let params = Params::default();
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let mut rng = SmallRng::seed_from_u64(0);
        for attendees in [vec![0], vec![0, 1]] {
            let plan = search.solve(&attendees, &NeighbourHistory::new(), &mut rng);
            let arrangement = plan.arrangement().unwrap();
            assert_eq!(arrangement.seating.seats, attendees);
            assert_eq!(arrangement.stats.stop, StopReason::Trivial);
        }
    }

    #[test]
    fn same_seed_same_result() {
        let mut records = mixed(8);
        records[0] = records[0].clone().prefers(&["G5"]);
        records[2] = records[2].clone().related_to(&["G3"]);
        let registry = registry(records);
        let weights = Weights::default();
        let params = Params { restarts: 3, iterations: 200, ..Params::default() };
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let attendees = registry.attendees_for("m");
        let run = |seed| search.solve(&attendees, &NeighbourHistory::new(), &mut SmallRng::seed_from_u64(seed));
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn seats_everyone_exactly_once() {
        let registry = registry(mixed(9));
        let weights = Weights::default();
        let params = Params {
            acceptance: Acceptance::Annealing { temperature: 500.0, cooling_rate: 0.99 },
            ..Params::default()
        };
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let attendees = registry.attendees_for("m");
        let plan = search.solve(&attendees, &NeighbourHistory::new(), &mut SmallRng::seed_from_u64(7));
        let mut seats = plan.arrangement().unwrap().seating.seats.clone();
        seats.sort();
        assert_eq!(seats, attendees);
    }

    #[test]
    fn balanced_table_meets_same_sex_limit() {
        let registry = registry(mixed(6));
        let weights = Weights::default();
        let params = Params::default();
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let attendees = registry.attendees_for("m");
        let plan = search.solve(&attendees, &NeighbourHistory::new(), &mut SmallRng::seed_from_u64(3));
        let arrangement = plan.arrangement().unwrap();
        assert!(arrangement.is_success());
        assert_eq!(arrangement.evaluation.same_sex_pairs, 0);
        assert_eq!(arrangement.stats.stop, StopReason::TargetReached);
    }

    #[test]
    fn imbalanced_table_still_gets_a_seating() {
        let records = (0..5).map(|i| GuestRecord::new(&format!("M{}", i), Sex::Male).attends(&["m"])).collect();
        let registry = registry(records);
        let weights = Weights::default();
        let params = Params { restarts: 2, iterations: 100, ..Params::default() };
        let search = Search::new(&registry, Evaluator::new(&registry, &weights), &params);
        let attendees = registry.attendees_for("m");
        let plan = search.solve(&attendees, &NeighbourHistory::new(), &mut SmallRng::seed_from_u64(1));
        let arrangement = plan.arrangement().unwrap();
        assert_eq!(arrangement.seating.len(), 5);
        assert!(!arrangement.is_success());
        assert_eq!(arrangement.evaluation.same_sex_pairs, 5);
    }
}
