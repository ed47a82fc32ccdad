//! seatshuffle Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction that lets the shuffle
//! engine run both **interactively** (tokio) and under **simulation**
//! (virtual clock, seeded RNG).
//!
//! # Core Concept
//!
//! All sources of non-determinism are intercepted:
//! - Time (`now()`, `sleep()`)
//! - Randomness (`uniform_below()`)
//!
//! By deriving all entropy from a single 64-bit seed in simulation, any
//! surprising seating chart becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use seatshuffle_env::ShuffleContext;
//!
//! async fn dither<Ctx: ShuffleContext>(ctx: &Ctx, seats: usize) {
//!     for _ in 0..10 {
//!         let pick = ctx.uniform_below(seats)?;
//!         show(pick);
//!         ctx.sleep(Duration::from_millis(50)).await;
//!     }
//! }
//! ```

mod context;
mod error;
mod tokio_impl;

pub use context::{EntropySource, ShuffleContext};
pub use error::EnvError;
pub use tokio_impl::TokioContext;
