//! Seating plans for recurring group meals around a circular table.
//!
//! Guests are loaded into a [`registry::GuestRegistry`], then a
//! [`planner::Planner`] solves each meal in order, remembering who already
//! sat together so later meals mix people up.

pub mod action;
pub mod anneal;
pub mod config;
pub mod history;
pub mod model;
pub mod planner;
pub mod registry;
pub mod render;
pub mod roster;
pub mod score;

pub use anneal::{Acceptance, Arrangement, MealPlan, Params};
pub use config::{ConfigError, SolverConfig};
pub use history::NeighbourHistory;
pub use model::condition::{Score, Weights};
pub use model::entity::{Guest, Id, ParseSexError, Sex};
pub use model::table::Seating;
pub use planner::{MealOutcome, Planner};
pub use registry::{DataWarning, GuestRecord, GuestRegistry};
pub use roster::{Roster, RosterError};
pub use score::{Evaluation, Evaluator, PairScorer};
