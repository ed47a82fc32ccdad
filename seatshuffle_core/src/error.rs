//! Error taxonomy for loading, shuffling and exporting seating charts.

use std::path::PathBuf;

use seatshuffle_env::EnvError;
use thiserror::Error;

use crate::session::SessionPhase;

/// Failure to read or parse one of the configuration sources.
///
/// Fatal to startup: no shuffle may run without a loaded `Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings in {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{}:{line}: student id {id} already used on line {first_line}", path.display())]
    DuplicateStudentId {
        path: PathBuf,
        line: usize,
        id: u32,
        first_line: usize,
    },

    #[error("{}:{line}: row has {found} columns, expected {expected}", path.display())]
    RaggedGrid {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl ConfigError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Errors produced by the shuffle engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShuffleError {
    /// Recoverable: the roster does not fit the grid. Nothing was assigned.
    #[error(
        "The number of students does not match the number of seats available. \
         ({students} \u{2260} {seats})"
    )]
    SeatCountMismatch { students: usize, seats: usize },

    /// `step()` was called in a phase that does not accept it.
    #[error("Cannot step while the session is {phase}; reset first")]
    InvalidStateTransition { phase: SessionPhase },

    /// The random source failed mid-draw.
    #[error("Entropy source failed: {0}")]
    Entropy(#[from] EnvError),
}

/// Errors produced while exporting a chart.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: no seat has been assigned yet")]
    NotReady,

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
