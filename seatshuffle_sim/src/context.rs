//! Simulation context implementing ShuffleContext for deterministic runs.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seatshuffle_env::{EntropySource, EnvError, ShuffleContext};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a virtual clock and a seeded RNG.
///
/// - Sleeping advances the virtual clock instead of waiting
/// - Every draw comes from `ChaCha8Rng(seed)`, so a seed reproduces a chart
pub struct SimContext {
    /// Master seed for this run
    seed: u64,

    /// Current virtual time (nanoseconds since start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// Deterministic RNG for seat draws
    rng: Arc<Mutex<ChaCha8Rng>>,

    /// Virtual time 0 maps to this wall-clock time
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = lock(&self.virtual_time_ns);
        *time += duration.as_nanos() as u64;
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *lock(&self.virtual_time_ns)
    }
}

/// A poisoned lock only means another draw panicked; the state is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            rng: Arc::clone(&self.rng),
            epoch: self.epoch,
        }
    }
}

impl EntropySource for SimContext {
    fn uniform_below(&self, bound: usize) -> Result<usize, EnvError> {
        if bound == 0 {
            return Err(EnvError::EmptyRange);
        }
        Ok(lock(&self.rng).gen_range(0..bound))
    }
}

#[async_trait]
impl ShuffleContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        // In simulation, sleep advances virtual time
        self.advance_time(duration);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Seeded draws with wall-clock waiting.
///
/// Replays the chart a [`SimContext`] with the same seed would produce, but
/// the dithering delays actually elapse so the animation can be watched.
pub struct PacedContext {
    draws: SimContext,
    start: Instant,
}

impl PacedContext {
    pub fn new(seed: u64) -> Self {
        Self {
            draws: SimContext::new(seed),
            start: Instant::now(),
        }
    }
}

impl EntropySource for PacedContext {
    fn uniform_below(&self, bound: usize) -> Result<usize, EnvError> {
        self.draws.uniform_below(bound)
    }
}

#[async_trait]
impl ShuffleContext for PacedContext {
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
        self.draws.seed
    }
}
