//! Error types for the seatshuffle environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// A random draw was requested from an empty range
    #[error("Cannot draw a random index below 0")]
    EmptyRange,

    /// The entropy source could not produce a value
    #[error("Entropy error: {0}")]
    Entropy(String),
}

impl EnvError {
    /// Creates an entropy error.
    pub fn entropy(msg: impl Into<String>) -> Self {
        Self::Entropy(msg.into())
    }
}
