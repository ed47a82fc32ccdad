//! Incremental mode: one student per `step()`, with a dithering animation.
//!
//! ```text
//!   Idle ──step──► Stepping ──step──► ... ──step──► Complete
//!    ▲                                                 │
//!    └──────────────────── reset ──────────────────────┘
//! ```
//!
//! The session is a plain value owned by the caller. [`step`] borrows it,
//! returns the successor in its [`StepOutcome`], and leaves the input
//! session untouched when it refuses to run.

use std::collections::BTreeMap;
use std::time::Duration;

use seatshuffle_env::ShuffleContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ShuffleConfig;
use crate::error::ShuffleError;
use crate::render::ChartRenderer;
use crate::roster::Student;
use crate::seat_grid::{SeatCoord, SeatGrid};
use crate::shuffle::{ensure_seat_count, Assignment, Placement};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No student placed yet
    Idle,
    /// Some, but not all, students placed
    Stepping,
    /// Every student placed; only reset is accepted
    Complete,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Stepping => "stepping",
            SessionPhase::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

/// State of one incremental run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShuffleSession {
    /// Roster index of the next student to place
    current_index: usize,

    /// Roster size captured on the first step
    total: usize,

    /// Committed seats
    assigned: BTreeMap<SeatCoord, Student>,
}

impl ShuffleSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all progress. Valid from any phase.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> SessionPhase {
        if self.current_index == 0 && self.assigned.is_empty() {
            SessionPhase::Idle
        } else if self.current_index >= self.total {
            SessionPhase::Complete
        } else {
            SessionPhase::Stepping
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn assigned(&self) -> &BTreeMap<SeatCoord, Student> {
        &self.assigned
    }

    pub fn placed_count(&self) -> usize {
        self.assigned.len()
    }

    /// The student the next `step()` will place, if any.
    pub fn next_student<'a>(&self, roster: &'a [Student]) -> Option<&'a Student> {
        match self.phase() {
            SessionPhase::Complete => None,
            _ => roster.get(self.current_index),
        }
    }

    /// Available seats not yet committed, in canonical order.
    pub fn remaining_seats(&self, grid: &SeatGrid) -> Vec<SeatCoord> {
        grid.available_coords()
            .into_iter()
            .filter(|coord| !self.assigned.contains_key(coord))
            .collect()
    }

    /// Committed seats so far as a (possibly partial) assignment.
    pub fn assignment(&self, grid: &SeatGrid) -> Assignment {
        let placements = self
            .assigned
            .iter()
            .map(|(&coord, student)| Placement {
                coord,
                student: student.clone(),
            })
            .collect();
        Assignment::from_placements(grid, placements)
    }
}

/// A single-seat display change produced while stepping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatEvent {
    /// Every seat blanked (first step of a run)
    GridCleared,

    /// The student about to be placed
    Announced {
        student: Student,
        index: usize,
        total: usize,
    },

    /// Student shown at a seat for one dithering frame
    Tentative {
        coord: SeatCoord,
        student: Student,
        iteration: u32,
        iterations: u32,
        delay: Duration,
    },

    /// Dithering frame removed
    Vacated { coord: SeatCoord },

    /// Student placed for good
    Committed { coord: SeatCoord, student: Student },
}

/// Result of one successful `step()`.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The successor session
    pub session: ShuffleSession,

    /// Who was placed
    pub student: Student,

    /// Where they were placed
    pub seat: SeatCoord,

    /// Every event emitted to the renderer, in order
    pub events: Vec<SeatEvent>,
}

fn emit<R: ChartRenderer + ?Sized>(renderer: &mut R, events: &mut Vec<SeatEvent>, event: SeatEvent) {
    renderer.apply(&event);
    events.push(event);
}

/// Places the next student on the roster.
///
/// Refuses with `SeatCountMismatch` when the roster does not fit the grid and
/// with `InvalidStateTransition` once the session is complete. In both cases
/// `session` and the renderer are left as they were.
///
/// The call suspends only at the dithering delays; nothing cancels it once
/// started.
pub async fn step<C, R>(
    ctx: &C,
    session: &ShuffleSession,
    roster: &[Student],
    grid: &SeatGrid,
    config: &ShuffleConfig,
    renderer: &mut R,
) -> Result<StepOutcome, ShuffleError>
where
    C: ShuffleContext + ?Sized,
    R: ChartRenderer + ?Sized,
{
    let total = ensure_seat_count(roster, grid)?;

    let phase = session.phase();
    if phase == SessionPhase::Complete {
        return Err(ShuffleError::InvalidStateTransition { phase });
    }
    // An empty roster has nothing to place: it is complete from the start.
    let Some(student) = roster.get(session.current_index).cloned() else {
        return Err(ShuffleError::InvalidStateTransition {
            phase: SessionPhase::Complete,
        });
    };

    let mut next = session.clone();
    let mut events = Vec::new();

    if next.current_index == 0 {
        next.assigned.clear();
        next.total = total;
        emit(renderer, &mut events, SeatEvent::GridCleared);
    }

    emit(
        renderer,
        &mut events,
        SeatEvent::Announced {
            student: student.clone(),
            index: next.current_index,
            total,
        },
    );

    let remaining = next.remaining_seats(grid);
    let seat = if remaining.len() == 1 {
        remaining[0]
    } else {
        for iteration in 0..config.total_iterations {
            let pick = remaining[ctx.uniform_below(remaining.len())?];
            let delay = config.delay_for(iteration);
            debug!(
                "iter {}/{}: {} at {} (wait {}ms)",
                iteration,
                config.total_iterations,
                student.name,
                pick,
                delay.as_millis()
            );
            emit(
                renderer,
                &mut events,
                SeatEvent::Tentative {
                    coord: pick,
                    student: student.clone(),
                    iteration,
                    iterations: config.total_iterations,
                    delay,
                },
            );
            ctx.sleep(delay).await;
            emit(renderer, &mut events, SeatEvent::Vacated { coord: pick });
        }
        remaining[ctx.uniform_below(remaining.len())?]
    };

    next.assigned.insert(seat, student.clone());
    next.current_index += 1;
    emit(
        renderer,
        &mut events,
        SeatEvent::Committed {
            coord: seat,
            student: student.clone(),
        },
    );

    info!(
        "placed {} at {} ({}/{})",
        student,
        seat,
        next.current_index,
        total
    );

    Ok(StepOutcome {
        session: next,
        student,
        seat,
        events,
    })
}
