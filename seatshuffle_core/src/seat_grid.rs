//! The seat-layout presence grid and its canonical seat enumeration.
//!
//! Assignment index `k` always refers to the `k`-th available coordinate in
//! row-major order. Pairing, remaining-seat derivation and rendering all go
//! through [`SeatGrid::available_coords`] so the three can never disagree.

use serde::{Deserialize, Serialize};

/// A `(row, col)` position in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatCoord {
    pub row: usize,
    pub col: usize,
}

impl SeatCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for SeatCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 2D presence matrix: `true` where a seat exists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeatGrid {
    rows: Vec<Vec<bool>>,
}

impl SeatGrid {
    /// Builds a grid from already-validated rows.
    pub fn new(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from 0/1 cells. Any non-zero cell counts as a seat.
    pub fn from_cells(cells: &[&[u8]]) -> Self {
        Self {
            rows: cells
                .iter()
                .map(|row| row.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, taken from the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn has_seat(&self, coord: SeatCoord) -> bool {
        self.rows
            .get(coord.row)
            .and_then(|row| row.get(coord.col))
            .copied()
            .unwrap_or(false)
    }

    /// Returns true if the given row contains at least one seat.
    pub fn row_has_seat(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|r| r.iter().any(|&s| s))
    }

    /// The canonical row-major enumeration of available seats.
    pub fn available_coords(&self) -> Vec<SeatCoord> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|&(_, &present)| present)
                    .map(move |(col, _)| SeatCoord::new(row, col))
            })
            .collect()
    }

    pub fn available_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&s| s).count()
    }

    /// Position of `coord` in the canonical enumeration, if it is a seat.
    pub fn seat_index(&self, coord: SeatCoord) -> Option<usize> {
        if !self.has_seat(coord) {
            return None;
        }
        let before: usize = self.rows[..coord.row]
            .iter()
            .map(|r| r.iter().filter(|&&s| s).count())
            .sum();
        let within = self.rows[coord.row][..coord.col]
            .iter()
            .filter(|&&s| s)
            .count();
        Some(before + within)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SeatGrid {
        SeatGrid::from_cells(&[&[1, 0, 1], &[0, 0, 0], &[1, 1, 0]])
    }

    #[test]
    fn test_available_coords_are_row_major() {
        let coords = sample().available_coords();
        assert_eq!(
            coords,
            vec![
                SeatCoord::new(0, 0),
                SeatCoord::new(0, 2),
                SeatCoord::new(2, 0),
                SeatCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn test_seat_index_matches_enumeration() {
        let grid = sample();
        for (k, coord) in grid.available_coords().into_iter().enumerate() {
            assert_eq!(grid.seat_index(coord), Some(k));
        }
        assert_eq!(grid.seat_index(SeatCoord::new(0, 1)), None);
        assert_eq!(grid.seat_index(SeatCoord::new(9, 9)), None);
    }

    #[test]
    fn test_counts_and_shape() {
        let grid = sample();
        assert_eq!(grid.available_count(), 4);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.width(), 3);
        assert!(grid.row_has_seat(0));
        assert!(!grid.row_has_seat(1));
        assert!(!grid.row_has_seat(7));
    }

    #[test]
    fn test_empty_grid() {
        let grid = SeatGrid::default();
        assert!(grid.available_coords().is_empty());
        assert_eq!(grid.width(), 0);
    }
}
