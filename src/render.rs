//! Text presentation of solved meals.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::anneal::{Arrangement, MealPlan};
use crate::model::table::Seating;
use crate::planner::MealOutcome;
use crate::registry::GuestRegistry;
use crate::score::PairFlags;

pub const GRID_WIDTH: usize = 60;
pub const GRID_HEIGHT: usize = 25;
const LABEL_CHARS: usize = 6;

pub fn summary(outcome: &MealOutcome) -> String {
    match &outcome.plan {
        MealPlan::NoPlan => format!("Meal '{}': no one is attending.", outcome.meal),
        MealPlan::Seated(arrangement) if arrangement.is_success() => format!(
            "Meal '{}': found a plan for {} guests (score {}).",
            outcome.meal, outcome.attendees, arrangement.evaluation.total,
        ),
        MealPlan::Seated(arrangement) => format!(
            "Meal '{}': no plan meets every rule for {} guests; best effort has {} repeated and {} same-sex pairs (score {}).",
            outcome.meal,
            outcome.attendees,
            arrangement.evaluation.repeat_pairs(),
            arrangement.evaluation.same_sex_pairs,
            arrangement.evaluation.total,
        ),
    }
}

/// Each seat and its clockwise neighbour, flagged, followed by a legend.
pub fn list_view(registry: &GuestRegistry, arrangement: &Arrangement) -> String {
    let n = arrangement.seating.len();
    let mut out = String::new();
    if n == 1 {
        let id = arrangement.seating.seats[0];
        let _ = writeln!(out, "    Seat 1: {} (alone)", registry.name(id));
        return out;
    }
    let mut seen = PairFlags::default();
    for (i, adj) in arrangement.evaluation.adjacencies.iter().enumerate() {
        let mut marks = String::new();
        if adj.flags.preferred {
            marks.push_str(" (P*)");
            seen.preferred = true;
        }
        if adj.flags.repeat {
            marks.push_str(" (N!)");
            seen.repeat = true;
        }
        if adj.flags.related {
            marks.push_str(" (R!)");
            seen.related = true;
        }
        if adj.flags.same_sex {
            marks.push_str(" (S!)");
            seen.same_sex = true;
        }
        let sex = |id| registry.sex(id).map(|sex| sex.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "    Seat {}: {} ({}){} -> Seat {}: {} ({})",
            i + 1, registry.name(adj.left), sex(adj.left), marks,
            (i + 1) % n + 1, registry.name(adj.right), sex(adj.right),
        );
    }

    let mut notes = Vec::new();
    if seen.preferred {
        notes.push("(P*) = Preferred".to_string());
    }
    if seen.repeat {
        notes.push("(N!) = Repeated Neighbour Pair (from a previous meal)".to_string());
    }
    if seen.related {
        notes.push("(R!) = Related".to_string());
    }
    if seen.same_sex {
        let count = arrangement.evaluation.same_sex_pairs;
        notes.push(format!("(S!) = {} Same-sex Pair{}", count, if count == 1 { "" } else { "s" }));
    }
    if !notes.is_empty() {
        let _ = writeln!(out, "    (Note: {})", notes.join("; "));
    }
    out
}

/// Guests placed around an ellipse on a character grid, seat 1 at the top.
/// A label that would overlap another is replaced by `*`.
pub fn circle_diagram(registry: &GuestRegistry, seating: &Seating, width: usize, height: usize) -> String {
    let width = width.max(3);
    let height = height.max(1);
    let n = seating.len();
    let mut grid = vec![vec![' '; width]; height];
    let (cx, cy) = ((width / 2) as f64, (height / 2) as f64);
    let (rx, ry) = ((width / 2) as f64 * 0.8, (height / 2) as f64 * 0.7);

    for (i, &id) in seating.seats.iter().enumerate() {
        let angle = 2.0 * PI * i as f64 / n as f64 - PI / 2.0;
        let row = ((cy + ry * angle.sin()).round().max(0.0) as usize).min(height - 1);
        let col = ((cx + rx * angle.cos()).round().max(0.0) as usize).min(width - 1);
        let name: String = registry.name(id).chars().take(LABEL_CHARS).collect();
        let label: Vec<char> = format!("{}:{}", i + 1, name).chars().collect();
        let start = col.saturating_sub(label.len() / 2);
        let visible = &label[..label.len().min(width - start)];
        if visible.iter().enumerate().all(|(k, _)| grid[row][start + k] == ' ') {
            for (k, &c) in visible.iter().enumerate() {
                grid[row][start + k] = c;
            }
        } else if grid[row][col] == ' ' {
            grid[row][col] = '*';
        }
    }

    let border = format!("+{}+", "-".repeat(width - 2));
    let mut out = String::new();
    let _ = writeln!(out, "  {}", border);
    for row in &grid {
        let inner: String = row[1..width - 1].iter().collect();
        let _ = writeln!(out, " |{}|", inner);
    }
    let _ = writeln!(out, "  {}", border);
    out
}

/// Summary, list view and optionally the diagram for one meal.
pub fn render_outcome(registry: &GuestRegistry, outcome: &MealOutcome, diagram: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary(outcome));
    if let Some(arrangement) = outcome.plan.arrangement() {
        let _ = writeln!(out, "\n  List View:");
        out.push_str(&list_view(registry, arrangement));
        if diagram {
            let _ = writeln!(out, "\n  Visual Layout:");
            out.push_str(&circle_diagram(registry, &arrangement.seating, GRID_WIDTH, GRID_HEIGHT));
        }
    }
    out
}
