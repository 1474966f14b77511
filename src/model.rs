pub mod entity {
    use std::collections::{HashMap, HashSet};
    use std::fmt;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    pub type Id = u32;
    pub type MealId = String;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Sex {
        Male,
        Female,
    }

    #[derive(Debug, Clone, Error, PartialEq)]
    #[error("invalid sex '{0}', expected male or female")]
    pub struct ParseSexError(pub String);

    impl FromStr for Sex {
        type Err = ParseSexError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_lowercase().as_str() {
                "male" => Ok(Sex::Male),
                "female" => Ok(Sex::Female),
                other => Err(ParseSexError(other.to_string())),
            }
        }
    }

    impl fmt::Display for Sex {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Sex::Male => write!(f, "male"),
                Sex::Female => write!(f, "female"),
            }
        }
    }

    /// Lookup key for a guest name: trimmed, inner whitespace collapsed, lowercased.
    pub fn normalize_name(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// An attendee as read from the roster. Relations and preferences are
    /// resolved against the registry and stored as ids.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Guest {
        pub id: Id,
        pub name: String,
        pub sex: Sex,
        pub relations: HashSet<Id>,
        pub preferred: HashSet<Id>,
        pub attendance: HashMap<MealId, bool>,
    }

    impl Guest {
        pub fn attends(&self, meal: &str) -> bool {
            self.attendance.get(meal).copied().unwrap_or(false)
        }
    }
}


pub mod table {
    use super::entity::Id;

    /// A circular ordering of guests. Seat `i` sits beside `i - 1` and `i + 1` (mod n).
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Seating {
        pub seats: Vec<Id>,
    }

    impl Seating {
        pub fn new(seats: Vec<Id>) -> Seating {
            Seating { seats }
        }

        pub fn len(&self) -> usize {
            self.seats.len()
        }

        pub fn is_empty(&self) -> bool {
            self.seats.is_empty()
        }

        /// Adjacent seat pairs, wrap-around included. A table of two has a
        /// single pair and a table of one has none.
        pub fn adjacent_pairs(&self) -> impl Iterator<Item = (Id, Id)> + '_ {
            let n = self.seats.len();
            let count = match n {
                0 | 1 => 0,
                2 => 1,
                _ => n,
            };
            (0..count).map(move |i| (self.seats[i], self.seats[(i + 1) % n]))
        }

        /// True when `other` is a rotation of this seating.
        pub fn same_cycle(&self, other: &Seating) -> bool {
            let n = self.seats.len();
            if n != other.seats.len() {
                return false;
            }
            if n == 0 {
                return true;
            }
            other.seats.iter().enumerate()
                .filter(|(_, id)| **id == self.seats[0])
                .any(|(start, _)| {
                    (0..n).all(|i| self.seats[i] == other.seats[(start + i) % n])
                })
        }
    }
}

pub mod condition {
    use serde::{Deserialize, Serialize};

    pub type Score = i64;

    /// Bonus and penalty weights. Higher total scores are better.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Weights {
        pub bonus_preferred: Score,
        pub penalty_relation: Score,
        pub penalty_repeat: Score,
        /// Charged for every same-sex pair, including those within the limit.
        pub penalty_same_sex: Score,
        pub same_sex_limit: usize,
        /// Charged for every same-sex pair beyond `same_sex_limit`.
        pub penalty_same_sex_excess: Score,
    }

    impl Default for Weights {
        fn default() -> Self {
            Weights {
                bonus_preferred: 1000,
                penalty_relation: 100,
                penalty_repeat: 2000,
                penalty_same_sex: 50,
                same_sex_limit: 1,
                penalty_same_sex_excess: 10_000,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::entity::{normalize_name, ParseSexError, Sex};
    use super::table::Seating;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_name("  Anne   Marie "), "anne marie");
        assert_eq!(normalize_name("BOB"), normalize_name("bob"));
    }

    #[test]
    fn parses_sex_case_insensitively() {
        assert_eq!(" Female ".parse::<Sex>(), Ok(Sex::Female));
        assert_eq!("MALE".parse::<Sex>(), Ok(Sex::Male));
        assert_eq!("Other".parse::<Sex>(), Err(ParseSexError("other".into())));
    }

    #[test]
    fn adjacent_pairs_wrap_around() {
        let seating = Seating::new(vec![0, 1, 2, 3]);
        let pairs: Vec<_> = seating.adjacent_pairs().collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
    }

    #[test]
    fn degenerate_tables_have_few_pairs() {
        assert_eq!(Seating::new(vec![]).adjacent_pairs().count(), 0);
        assert_eq!(Seating::new(vec![7]).adjacent_pairs().count(), 0);
        assert_eq!(Seating::new(vec![7, 8]).adjacent_pairs().count(), 1);
    }

    #[test]
    fn rotations_are_the_same_cycle() {
        let a = Seating::new(vec![0, 1, 2, 3]);
        assert!(a.same_cycle(&Seating::new(vec![2, 3, 0, 1])));
        assert!(!a.same_cycle(&Seating::new(vec![0, 2, 1, 3])));
        assert!(!a.same_cycle(&Seating::new(vec![0, 1, 2])));
    }
}
