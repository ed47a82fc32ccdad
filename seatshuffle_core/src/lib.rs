//! seatshuffle Core - Classroom Seat-Assignment Randomizer
//!
//! Loads a roster and a seat-layout grid, then randomly assigns students to
//! the available seats in one of two ways:
//! 1. **Full shuffle**: a single Fisher-Yates permutation over every seat
//! 2. **Incremental shuffle**: one student per step, with an eased
//!    "dithering" animation before each seat is committed
//!
//! All randomness and waiting go through `seatshuffle_env`, so the engine
//! runs unchanged against OS entropy or a seeded simulation.

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod render;
pub mod roster;
pub mod seat_grid;
pub mod session;
pub mod shuffle;

// Re-export key types for convenience
pub use config::{Config, ConfigStore, DisplayLabels, ShuffleConfig};
pub use controller::{ControlState, SeatingController};
pub use error::{ConfigError, ExportError, ShuffleError};
pub use export::{AssignmentDocument, ExportAdapter, HtmlExport, JsonExport};
pub use render::{ChartRenderer, HtmlChart, SeatContent};
pub use roster::Student;
pub use seat_grid::{SeatCoord, SeatGrid};
pub use session::{step, SeatEvent, SessionPhase, ShuffleSession, StepOutcome};
pub use shuffle::{secure_shuffle, shuffle_all, Assignment, Placement};
