//! Production implementation of ShuffleContext using Tokio.

use crate::{EntropySource, EnvError, ShuffleContext};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Production context backed by Tokio and OS entropy.
///
/// Time comes from the system clock, randomness from `OsRng`, so every
/// draw is cryptographically strong rather than a statistical PRNG.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for TokioContext {
    fn uniform_below(&self, bound: usize) -> Result<usize, EnvError> {
        if bound == 0 {
            return Err(EnvError::EmptyRange);
        }
        // Touch the pool first so an unavailable source surfaces as an error
        // instead of a panic inside gen_range.
        let mut byte = [0u8; 1];
        OsRng
            .try_fill_bytes(&mut byte)
            .map_err(|e| EnvError::entropy(e.to_string()))?;
        Ok(OsRng.gen_range(0..bound))
    }
}

#[async_trait]
impl ShuffleContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
