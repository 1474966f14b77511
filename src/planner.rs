use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::info;

use crate::anneal::{MealPlan, Search};
use crate::config::{ConfigError, SolverConfig};
use crate::history::NeighbourHistory;
use crate::model::entity::MealId;
use crate::registry::GuestRegistry;
use crate::score::Evaluator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealOutcome {
    pub meal: MealId,
    pub attendees: usize,
    pub plan: MealPlan,
}

/// One planning run: owns the neighbour history and the seeded random
/// source, and solves meals strictly in the order they are given.
pub struct Planner<'a> {
    registry: &'a GuestRegistry,
    config: &'a SolverConfig,
    history: NeighbourHistory,
    rng: SmallRng,
}

impl<'a> Planner<'a> {
    pub fn new(registry: &'a GuestRegistry, config: &'a SolverConfig) -> Result<Planner<'a>, ConfigError> {
        config.validate()?;
        Ok(Planner {
            registry,
            config,
            history: NeighbourHistory::new(),
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    pub fn history(&self) -> &NeighbourHistory {
        &self.history
    }

    /// Solves one meal against everything committed so far, then commits it.
    pub fn solve_meal(&mut self, meal: &str) -> MealOutcome {
        let meal = meal.trim().to_string();
        let attendees = self.registry.attendees_for(&meal);
        let evaluator = Evaluator::new(self.registry, &self.config.weights);
        let search = Search::new(self.registry, evaluator, &self.config.search);
        let plan = search.solve(&attendees, &self.history, &mut self.rng);
        match plan.arrangement() {
            None => info!(meal = %meal, "no attendees, no plan"),
            Some(arrangement) => {
                let added = self.history.commit(&arrangement.seating);
                info!(
                    meal = %meal,
                    attendees = attendees.len(),
                    score = arrangement.evaluation.total,
                    success = arrangement.is_success(),
                    restarts = arrangement.stats.restarts,
                    iterations = arrangement.stats.iterations,
                    new_pairs = added,
                    "meal seated",
                );
            }
        }
        MealOutcome { meal, attendees: attendees.len(), plan }
    }

    /// Every meal of the registry, in declaration order.
    pub fn solve_all(&mut self) -> Vec<MealOutcome> {
        let meals = self.registry.meals().to_vec();
        meals.iter().map(|meal| self.solve_meal(meal)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Sex;
    use crate::registry::GuestRecord;

    fn registry() -> GuestRegistry {
        let names = ["Ann", "Ben", "Cat", "Dan", "Eve", "Fin"];
        let records = names.iter().enumerate().map(|(i, name)| {
            let sex = if i % 2 == 0 { Sex::Female } else { Sex::Male };
            GuestRecord::new(name, sex).attends(&["Lunch", "Dinner"])
        }).collect();
        GuestRegistry::build(records, vec!["Lunch".into(), "Empty".into(), "Dinner".into()]).0
    }

    #[test]
    fn rejects_invalid_config() {
        let registry = registry();
        let mut config = SolverConfig::default();
        config.search.iterations = 0;
        assert!(Planner::new(&registry, &config).is_err());
    }

    #[test]
    fn oversized_weight_fails_before_solving() {
        let records = (0..5).map(|i| GuestRecord::new(&format!("M{}", i), Sex::Male).attends(&["Lunch"])).collect();
        let registry = GuestRegistry::build(records, vec!["Lunch".into()]).0;
        let mut config = SolverConfig::default();
        config.weights.penalty_same_sex_excess = i64::MAX / 2;
        assert!(matches!(Planner::new(&registry, &config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn solves_in_order_and_commits() {
        let registry = registry();
        let config = SolverConfig::default().with_seed(11);
        let mut planner = Planner::new(&registry, &config).unwrap();
        let outcomes = planner.solve_all();
        let meals: Vec<_> = outcomes.iter().map(|o| o.meal.as_str()).collect();
        assert_eq!(meals, vec!["Lunch", "Empty", "Dinner"]);
        assert_eq!(outcomes[1].plan, MealPlan::NoPlan);

        // K3,3 has nine mixed pairs, so dinner cannot avoid every lunch pair
        let dinner = outcomes[2].plan.arrangement().unwrap();
        assert!(dinner.seating.adjacent_pairs().all(|(a, b)| planner.history().contains(a, b)));
        assert_eq!(planner.history().len(), 6 + 6 - dinner.evaluation.repeat_pairs());
    }

    #[test]
    fn runs_are_reproducible() {
        let registry = registry();
        let config = SolverConfig::default().with_seed(5);
        let first = Planner::new(&registry, &config).unwrap().solve_all();
        let second = Planner::new(&registry, &config).unwrap().solve_all();
        assert_eq!(first, second);
    }
}
