//! Reads the attendee roster: comma-delimited text with a header row.
//!
//! Leading columns are `name`, `sex`, `relations` and `preferred people`;
//! every column after `preferred people` is a meal, identified by its
//! trimmed header. Relation and preference cells hold comma-separated names,
//! so they are usually quoted.

use std::path::Path;

use thiserror::Error;

use crate::model::entity::{MealId, ParseSexError, Sex};
use crate::registry::{DataWarning, GuestRecord, GuestRegistry};

const NAME: &str = "name";
const SEX: &str = "sex";
const RELATIONS: &str = "relations";
const PREFERRED: &str = "preferred people";

const AFFIRMATIVE: [&str; 5] = ["yes", "y", "true", "x", "1"];

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("roster has no header row")]
    Empty,
    #[error("roster is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("roster has no meal columns after '{}'", PREFERRED)]
    NoMeals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    pub meals: Vec<MealId>,
    pub records: Vec<GuestRecord>,
    pub warnings: Vec<DataWarning>,
}

impl Roster {
    pub fn load(path: impl AsRef<Path>) -> Result<Roster, RosterError> {
        let text = std::fs::read_to_string(path)?;
        Roster::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Roster, RosterError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(RosterError::Empty)?;
        let header = split_fields(header);
        let column = |name: &'static str| {
            header.iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(RosterError::MissingColumn(name))
        };
        let name_col = column(NAME)?;
        let sex_col = column(SEX)?;
        let relations_col = column(RELATIONS)?;
        let preferred_col = column(PREFERRED)?;

        let required = [name_col, sex_col, relations_col, preferred_col];
        let mut warnings = Vec::new();
        let mut meal_cols: Vec<(usize, MealId)> = Vec::new();
        for (index, h) in header.iter().enumerate().skip(preferred_col + 1) {
            let meal = h.trim();
            if meal.is_empty() || required.contains(&index) {
                continue;
            }
            if meal_cols.iter().any(|(_, seen)| seen == meal) {
                warnings.push(DataWarning::DuplicateMeal { meal: meal.to_string() });
                continue;
            }
            meal_cols.push((index, meal.to_string()));
        }
        if meal_cols.is_empty() {
            return Err(RosterError::NoMeals);
        }

        let mut records = Vec::new();
        for (line, row) in lines {
            let fields = split_fields(row);
            let cell = |index: usize| fields.get(index).map(|f| f.trim()).unwrap_or("");

            let name = cell(name_col);
            if name.is_empty() {
                warnings.push(DataWarning::MissingField { line, field: NAME });
                continue;
            }
            let sex_text = cell(sex_col);
            if sex_text.is_empty() {
                warnings.push(DataWarning::MissingField { line, field: SEX });
                continue;
            }
            let sex = match sex_text.parse::<Sex>() {
                Ok(sex) => sex,
                Err(ParseSexError(value)) => {
                    warnings.push(DataWarning::InvalidSex { line, name: name.to_string(), value });
                    continue;
                }
            };

            let mut record = GuestRecord::new(name, sex);
            record.relations = split_names(cell(relations_col));
            record.preferred = split_names(cell(preferred_col));
            record.meals = meal_cols.iter()
                .filter(|(index, _)| is_affirmative(cell(*index)))
                .map(|(_, meal)| meal.clone())
                .collect();
            records.push(record);
        }

        Ok(Roster {
            meals: meal_cols.into_iter().map(|(_, meal)| meal).collect(),
            records,
            warnings,
        })
    }

    /// Builds the registry; row warnings come first, then reference warnings.
    pub fn into_registry(self) -> (GuestRegistry, Vec<DataWarning>) {
        let (registry, mut warnings) = GuestRegistry::build(self.records, self.meals);
        let mut all = self.warnings;
        all.append(&mut warnings);
        (registry, all)
    }
}

fn is_affirmative(token: &str) -> bool {
    AFFIRMATIVE.iter().any(|a| token.eq_ignore_ascii_case(a))
}

fn split_names(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits one line on commas. Double quotes group a field and `""` inside
/// quotes is a literal quote; an unterminated quote runs to end of line.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
