//! Core environment context traits for seatshuffle.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

use crate::error::EnvError;

/// A provider of uniform random integers.
///
/// Every random decision the shuffle engine makes goes through this trait,
/// so tests and simulations can substitute a seeded or scripted source for
/// the operating system's entropy pool.
pub trait EntropySource: Send + Sync {
    /// Returns a uniformly distributed integer in `[0, bound)`.
    ///
    /// # Errors
    /// * `EnvError::EmptyRange` - `bound` is zero
    fn uniform_below(&self, bound: usize) -> Result<usize, EnvError>;
}

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so the incremental shuffle can run
/// both interactively (tokio timers, OS entropy) and inside deterministic
/// tests (virtual clock, seeded RNG).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, `OsRng`
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
#[async_trait]
pub trait ShuffleContext: EntropySource + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used to stamp exports.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
