//! seatshuffle Simulation & Verification Harness
//!
//! Runs the seating engine under controlled conditions:
//! - **Time**: dithering delays advance a virtual clock instead of waiting
//! - **Randomness**: every seat draw derives from a single 64-bit seed
//!
//! A seed therefore reproduces a chart exactly, which is what the
//! verification scenarios and the `--seed` flag of the CLI rely on.
//!
//! # Usage
//!
//! ```ignore
//! use seatshuffle_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_trials(2000);
//! let result = runner.run(ScenarioId::Uniformity).await;
//! assert!(result.passed);
//! ```

mod context;
mod runner;
pub mod scenarios;
pub mod terminal;
pub mod trials;

pub use context::{PacedContext, SimContext};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use terminal::TerminalChart;
pub use trials::{OccupancyMatrix, UniformityReport};
