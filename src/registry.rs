use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::model::entity::{normalize_name, Guest, Id, MealId, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Relations,
    Preferences,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Relations => write!(f, "relations"),
            ListKind::Preferences => write!(f, "preferred people"),
        }
    }
}

/// Data-quality problems. None of them stop planning; the offending row or
/// reference is dropped and the rest is processed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataWarning {
    #[error("line {line}: missing {field}, row skipped")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: invalid sex '{value}' for '{name}', row skipped")]
    InvalidSex { line: usize, name: String, value: String },
    #[error("duplicate guest '{name}', later row ignored")]
    DuplicateGuest { name: String },
    #[error("'{guest}' lists unknown name '{name}' in {list}")]
    UnknownName { guest: String, name: String, list: ListKind },
    #[error("'{guest}' lists themselves in {list}")]
    SelfReference { guest: String, list: ListKind },
    #[error("meal '{meal}' appears more than once, later column ignored")]
    DuplicateMeal { meal: MealId },
    #[error("meal '{meal}' has no attendees")]
    NoAttendees { meal: MealId },
}

/// One attendee before names are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestRecord {
    pub name: String,
    pub sex: Sex,
    pub relations: Vec<String>,
    pub preferred: Vec<String>,
    pub meals: Vec<MealId>,
}

impl GuestRecord {
    pub fn new(name: &str, sex: Sex) -> GuestRecord {
        GuestRecord {
            name: name.to_string(),
            sex,
            relations: Vec::new(),
            preferred: Vec::new(),
            meals: Vec::new(),
        }
    }

    pub fn related_to(mut self, names: &[&str]) -> GuestRecord {
        self.relations.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn prefers(mut self, names: &[&str]) -> GuestRecord {
        self.preferred.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn attends(mut self, meals: &[&str]) -> GuestRecord {
        self.meals.extend(meals.iter().map(|m| m.trim().to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct GuestRegistry {
    guests: Vec<Guest>,
    meals: Vec<MealId>,
    by_name: HashMap<String, Id>,
}

impl GuestRegistry {
    /// Builds the registry and resolves every relation and preference name.
    /// Unresolvable references are reported and treated as absent.
    pub fn build(records: Vec<GuestRecord>, meals: Vec<MealId>) -> (GuestRegistry, Vec<DataWarning>) {
        let mut warnings = Vec::new();
        let mut unique: Vec<MealId> = Vec::new();
        for meal in meals.into_iter().map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
            if unique.contains(&meal) {
                warnings.push(DataWarning::DuplicateMeal { meal });
            } else {
                unique.push(meal);
            }
        }
        let meals = unique;

        let mut by_name = HashMap::new();
        let mut kept = Vec::new();
        for record in records {
            let key = normalize_name(&record.name);
            if by_name.contains_key(&key) {
                warnings.push(DataWarning::DuplicateGuest { name: record.name.trim().to_string() });
                continue;
            }
            by_name.insert(key, kept.len() as Id);
            kept.push(record);
        }

        let guests = kept.iter().enumerate().map(|(index, record)| {
            let id = index as Id;
            let name = record.name.split_whitespace().collect::<Vec<_>>().join(" ");
            let mut resolve = |names: &[String], list: ListKind| -> HashSet<Id> {
                names.iter().filter_map(|other| {
                    match by_name.get(&normalize_name(other)) {
                        Some(&other_id) if other_id == id => {
                            warnings.push(DataWarning::SelfReference { guest: name.clone(), list });
                            None
                        }
                        Some(&other_id) => Some(other_id),
                        None => {
                            warnings.push(DataWarning::UnknownName {
                                guest: name.clone(),
                                name: other.trim().to_string(),
                                list,
                            });
                            None
                        }
                    }
                }).collect()
            };
            let relations = resolve(&record.relations, ListKind::Relations);
            let preferred = resolve(&record.preferred, ListKind::Preferences);
            let attended: HashSet<&str> = record.meals.iter().map(|m| m.trim()).collect();
            let attendance = meals.iter()
                .map(|meal| (meal.clone(), attended.contains(meal.as_str())))
                .collect();
            Guest { id, name, sex: record.sex, relations, preferred, attendance }
        }).collect();

        let registry = GuestRegistry { guests, meals, by_name };
        for meal in &registry.meals {
            if registry.attendees_for(meal).is_empty() {
                warnings.push(DataWarning::NoAttendees { meal: meal.clone() });
            }
        }
        for warning in &warnings {
            warn!("{}", warning);
        }
        (registry, warnings)
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    /// Meals in solve order.
    pub fn meals(&self) -> &[MealId] {
        &self.meals
    }

    pub fn get(&self, id: Id) -> Option<&Guest> {
        self.guests.get(id as usize)
    }

    pub fn find(&self, name: &str) -> Option<Id> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    pub fn name(&self, id: Id) -> &str {
        self.get(id).map(|g| g.name.as_str()).unwrap_or("?")
    }

    /// Everyone attending `meal`, in roster order.
    pub fn attendees_for(&self, meal: &str) -> Vec<Id> {
        self.guests.iter()
            .filter(|guest| guest.attends(meal.trim()))
            .map(|guest| guest.id)
            .collect()
    }

    /// Relations are symmetric even when only one side recorded them.
    pub fn is_related(&self, a: Id, b: Id) -> bool {
        let recorded = |x: Id, y: Id| self.get(x).map_or(false, |g| g.relations.contains(&y));
        recorded(a, b) || recorded(b, a)
    }

    /// One-sided: `a` asked to sit next to `b`.
    pub fn is_preferred(&self, a: Id, b: Id) -> bool {
        self.get(a).map_or(false, |g| g.preferred.contains(&b))
    }

    pub fn sex(&self, id: Id) -> Option<Sex> {
        self.get(id).map(|g| g.sex)
    }
}
