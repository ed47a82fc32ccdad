//! Occupancy statistics over repeated shuffles.
//!
//! Counts how often each student lands in each seat and compares the
//! observed frequencies against the uniform `1/n` expectation.

use serde::{Deserialize, Serialize};

use seatshuffle_core::{Assignment, SeatGrid, Student};

/// Student-by-seat landing counts.
#[derive(Debug, Clone)]
pub struct OccupancyMatrix {
    seats: usize,
    trials: u64,
    /// counts[student_position][seat_index]
    counts: Vec<Vec<u64>>,
}

impl OccupancyMatrix {
    pub fn new(seats: usize) -> Self {
        Self {
            seats,
            trials: 0,
            counts: vec![vec![0; seats]; seats],
        }
    }

    /// Records one complete assignment. Students are identified by their
    /// position in `roster`.
    pub fn record(&mut self, grid: &SeatGrid, roster: &[Student], assignment: &Assignment) {
        for placement in assignment.iter() {
            let student = roster.iter().position(|s| s.id == placement.student.id);
            let seat = grid.seat_index(placement.coord);
            if let (Some(student), Some(seat)) = (student, seat) {
                if student < self.seats && seat < self.seats {
                    self.counts[student][seat] += 1;
                }
            }
        }
        self.trials += 1;
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn count(&self, student: usize, seat: usize) -> u64 {
        self.counts[student][seat]
    }

    /// Summarizes the matrix against the uniform expectation.
    pub fn report(&self) -> UniformityReport {
        let n = self.seats;
        let trials = self.trials.max(1) as f64;
        let expected_p = if n == 0 { 0.0 } else { 1.0 / n as f64 };
        let expected_count = trials * expected_p;

        let mut max_deviation: f64 = 0.0;
        let mut chi_square = 0.0;
        for row in &self.counts {
            for &observed in row {
                let p = observed as f64 / trials;
                max_deviation = max_deviation.max((p - expected_p).abs());
                if expected_count > 0.0 {
                    let diff = observed as f64 - expected_count;
                    chi_square += diff * diff / expected_count;
                }
            }
        }

        // Five standard deviations of a single binomial cell frequency.
        let tolerance = 5.0 * (expected_p * (1.0 - expected_p) / trials).sqrt();

        UniformityReport {
            seats: n,
            trials: self.trials,
            expected_probability: expected_p,
            max_deviation,
            tolerance,
            chi_square,
            degrees_of_freedom: n.saturating_sub(1).pow(2),
        }
    }
}

/// Outcome of a uniformity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformityReport {
    pub seats: usize,
    pub trials: u64,
    pub expected_probability: f64,
    /// Largest |observed - 1/n| over all (student, seat) cells
    pub max_deviation: f64,
    pub tolerance: f64,
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
}

impl UniformityReport {
    pub fn is_uniform(&self) -> bool {
        self.trials > 0 && self.max_deviation <= self.tolerance
    }
}
