use thiserror::Error;

use crate::model::table::Seating;

pub type Index = usize;

/// Local perturbation of a seating. Applying an action twice restores the
/// original order, so a rejected move is undone by applying it again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Swap(Index, Index),
    /// Reverses `len` consecutive seats starting at `start`, wrapping past the last seat.
    Reverse { start: Index, len: usize },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("Invalid position {0} for a table of {1}")]
    InvalidPosition(Index, usize),
    #[error("Invalid range of {0} seats for a table of {1}")]
    InvalidRange(usize, usize),
}

impl Action {
    pub fn apply(&self, seating: &mut Seating) -> Result<(), ActionError> {
        let n = seating.len();
        match *self {
            Action::Swap(i, j) => {
                for index in [i, j] {
                    if index >= n {
                        return Err(ActionError::InvalidPosition(index, n));
                    }
                }
                seating.seats.swap(i, j);
            }
            Action::Reverse { start, len } => {
                if start >= n {
                    return Err(ActionError::InvalidPosition(start, n));
                }
                if len > n {
                    return Err(ActionError::InvalidRange(len, n));
                }
                for k in 0..len / 2 {
                    seating.seats.swap((start + k) % n, (start + len - 1 - k) % n);
                }
            }
        }
        Ok(())
    }
}
