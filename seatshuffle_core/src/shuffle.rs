//! Full-shuffle mode: one uniform permutation of the roster over every seat.

use seatshuffle_env::EntropySource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ShuffleError;
use crate::roster::Student;
use crate::seat_grid::{SeatCoord, SeatGrid};

/// One student placed at one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub coord: SeatCoord,
    pub student: Student,
}

/// Seats paired with students, ordered by canonical seat index.
///
/// A complete assignment covers every available seat exactly once. Partial
/// assignments exist only while an incremental session is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Assignment {
    placements: Vec<Placement>,
}

impl Assignment {
    /// Pairs `students` positionally with the grid's available seats.
    ///
    /// Extra students or seats on either side are left out.
    pub fn pair(grid: &SeatGrid, students: Vec<Student>) -> Self {
        let placements = grid
            .available_coords()
            .into_iter()
            .zip(students)
            .map(|(coord, student)| Placement { coord, student })
            .collect();
        Self { placements }
    }

    /// Builds an assignment from arbitrary placements, sorted into canonical
    /// seat order.
    pub fn from_placements(grid: &SeatGrid, mut placements: Vec<Placement>) -> Self {
        placements.sort_by_key(|p| grid.seat_index(p.coord).unwrap_or(usize::MAX));
        Self { placements }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.iter()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn student_at(&self, coord: SeatCoord) -> Option<&Student> {
        self.placements
            .iter()
            .find(|p| p.coord == coord)
            .map(|p| &p.student)
    }

    pub fn seat_of(&self, student_id: u32) -> Option<SeatCoord> {
        self.placements
            .iter()
            .find(|p| p.student.id == student_id)
            .map(|p| p.coord)
    }

    /// True if every available seat holds exactly one student and no
    /// student appears twice.
    pub fn is_complete_for(&self, grid: &SeatGrid) -> bool {
        let seats = grid.available_coords();
        if seats.len() != self.placements.len() {
            return false;
        }
        let mut coords: Vec<SeatCoord> = self.placements.iter().map(|p| p.coord).collect();
        coords.sort();
        coords.dedup();
        let mut ids: Vec<u32> = self.placements.iter().map(|p| p.student.id).collect();
        ids.sort_unstable();
        ids.dedup();
        coords.len() == seats.len()
            && ids.len() == seats.len()
            && coords.iter().all(|c| grid.has_seat(*c))
    }
}

/// Fisher-Yates shuffle driven by the given entropy source.
///
/// For each `i` from `len - 1` down to `1`, draws `j` uniformly in `[0, i]`
/// and swaps. Every one of the `n!` orderings is equally likely provided
/// the source is uniform.
pub fn secure_shuffle<T: Clone>(
    rng: &(impl EntropySource + ?Sized),
    items: &[T],
) -> Result<Vec<T>, ShuffleError> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.uniform_below(i + 1)?;
        shuffled.swap(i, j);
    }
    Ok(shuffled)
}

/// Checks that the roster fits the grid exactly.
pub fn ensure_seat_count(roster: &[Student], grid: &SeatGrid) -> Result<usize, ShuffleError> {
    let seats = grid.available_count();
    if roster.len() != seats {
        return Err(ShuffleError::SeatCountMismatch {
            students: roster.len(),
            seats,
        });
    }
    Ok(seats)
}

/// Assigns the whole roster in a single step.
pub fn shuffle_all(
    rng: &(impl EntropySource + ?Sized),
    roster: &[Student],
    grid: &SeatGrid,
) -> Result<Assignment, ShuffleError> {
    let seats = ensure_seat_count(roster, grid)?;
    let shuffled = secure_shuffle(rng, roster)?;
    debug!("shuffled {} students over {} seats", shuffled.len(), seats);
    Ok(Assignment::pair(grid, shuffled))
}
