//! Scenario runner - executes verification scenarios against the engine.

use crate::context::SimContext;
use crate::scenarios::ScenarioId;
use crate::trials::{OccupancyMatrix, UniformityReport};

use seatshuffle_core::{
    shuffle_all, step, Config, DisplayLabels, HtmlChart, SeatContent, SeatGrid,
    SeatingController, SessionPhase, ShuffleConfig, ShuffleError, ShuffleSession, Student,
};
use seatshuffle_env::ShuffleContext;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Full shuffles performed
    pub shuffles: u64,

    /// Incremental steps performed
    pub steps: u64,

    /// Virtual time spent animating (ms)
    pub virtual_time_ms: u64,

    /// Occupancy statistics, statistical scenarios only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniformity: Option<UniformityReport>,
}

/// Runs verification scenarios.
pub struct ScenarioRunner {
    /// Master seed
    seed: u64,

    /// Sample size for statistical scenarios
    trials: usize,
}

/// Internal scenario verdict: metrics plus the first failed check.
type Verdict = (ScenarioMetrics, Result<(), String>);

macro_rules! check {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err(format!($($msg)+));
        }
    };
}

fn roster(n: usize) -> Vec<Student> {
    (0..n)
        .map(|i| Student::new(i as u32 + 1, format!("Student {}", i + 1), format!("s{}", i + 1)))
        .collect()
}

/// 6x7 room with an aisle in column 3 and the back-right corner empty.
fn classroom_grid() -> SeatGrid {
    let rows = (0..6)
        .map(|row| {
            (0..7)
                .map(|col| col != 3 && !(row == 5 && col >= 5))
                .collect()
        })
        .collect();
    SeatGrid::new(rows)
}

fn fast_pacing(iterations: u32) -> ShuffleConfig {
    ShuffleConfig {
        initial_delay_ms: 20,
        max_delay_ms: 200,
        total_iterations: iterations,
    }
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self { seed, trials: 4000 }
    }

    /// Sets the sample size for statistical scenarios.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials.max(1);
        self
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let ctx = SimContext::shared(self.seed);
        let (mut metrics, outcome) = match scenario {
            ScenarioId::Pair => self.run_pair(&ctx),
            ScenarioId::Mismatch => self.run_mismatch(&ctx).await,
            ScenarioId::Classroom => self.run_classroom(&ctx),
            ScenarioId::Incremental => self.run_incremental(&ctx).await,
            ScenarioId::Reset => self.run_reset(&ctx).await,
            ScenarioId::Uniformity => self.run_uniformity(&ctx),
            ScenarioId::StepUniformity => self.run_step_uniformity(&ctx).await,
        };
        metrics.virtual_time_ms = ctx.now().as_millis() as u64;

        ScenarioResult {
            scenario: scenario.name().to_string(),
            seed: self.seed,
            passed: outcome.is_ok(),
            failure_reason: outcome.err(),
            metrics,
        }
    }

    /// Both orderings of a two-student pair are admissible and reachable.
    fn run_pair(&self, ctx: &SimContext) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let students = vec![Student::new(1, "A", "a"), Student::new(2, "B", "b")];
        let grid = SeatGrid::from_cells(&[&[1, 1]]);

        let outcome = (|| {
            let mut seen = HashSet::new();
            for _ in 0..64 {
                let assignment = shuffle_all(ctx, &students, &grid).map_err(|e| e.to_string())?;
                metrics.shuffles += 1;
                let order: Vec<u32> = assignment.iter().map(|p| p.student.id).collect();
                check!(
                    order == [1, 2] || order == [2, 1],
                    "inadmissible assignment {:?}",
                    order
                );
                seen.insert(order);
            }
            check!(seen.len() == 2, "only {} of 2 orderings observed in 64 draws", seen.len());
            Ok(())
        })();
        (metrics, outcome)
    }

    /// Both modes refuse a roster that does not fit.
    async fn run_mismatch(&self, ctx: &Arc<SimContext>) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let config = Config {
            roster: roster(3),
            seat_grid: SeatGrid::from_cells(&[&[1, 0, 1]]),
            shuffle: fast_pacing(5),
            labels: DisplayLabels::default(),
        };
        let expected = ShuffleError::SeatCountMismatch { students: 3, seats: 2 };
        let chart = HtmlChart::new(config.seat_grid.clone(), config.labels.clone());
        let mut controller = SeatingController::new(Arc::clone(ctx), config, chart);

        let full = controller.shuffle_all().map(|_| ());
        metrics.shuffles += 1;
        let stepped = controller.step().await.map(|_| ());
        metrics.steps += 1;

        let outcome = (|| {
            check!(full == Err(expected.clone()), "shuffle_all returned {:?}", full);
            check!(stepped == Err(expected.clone()), "step returned {:?}", stepped);
            check!(
                controller.session().phase() == SessionPhase::Idle,
                "session left {}",
                controller.session().phase()
            );
            check!(!controller.has_assignment(), "assignment exists after mismatch");
            let blank = controller
                .config()
                .seat_grid
                .available_coords()
                .into_iter()
                .all(|c| controller.renderer().seat_content(c) == Some(&SeatContent::Vacant));
            check!(blank, "grid not left unassigned");
            let message = controller.error_message().unwrap_or_default();
            check!(message.contains("(3 \u{2260} 2)"), "message lacks counts: {:?}", message);
            Ok(())
        })();
        (metrics, outcome)
    }

    /// A realistic room is filled exactly once per seat.
    fn run_classroom(&self, ctx: &SimContext) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let grid = classroom_grid();
        let students = roster(grid.available_count());

        let outcome = (|| {
            check!(students.len() == 34, "classroom grid has {} seats", students.len());
            for _ in 0..50 {
                let assignment = shuffle_all(ctx, &students, &grid).map_err(|e| e.to_string())?;
                metrics.shuffles += 1;
                check!(assignment.is_complete_for(&grid), "assignment is not a bijection");
                for (placement, coord) in assignment.iter().zip(grid.available_coords()) {
                    check!(placement.coord == coord, "seat order diverged at {}", coord);
                }
            }
            Ok(())
        })();
        (metrics, outcome)
    }

    /// Stepping n times fills the grid, then further steps are refused.
    async fn run_incremental(&self, ctx: &Arc<SimContext>) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let grid = SeatGrid::from_cells(&[&[1, 1, 0, 1], &[1, 0, 1, 1]]);
        let config = Config {
            roster: roster(grid.available_count()),
            seat_grid: grid.clone(),
            shuffle: fast_pacing(8),
            labels: DisplayLabels::default(),
        };
        let n = config.roster.len();
        let chart = HtmlChart::new(grid.clone(), config.labels.clone());
        let mut controller = SeatingController::new(Arc::clone(ctx), config, chart);

        let mut failures = Vec::new();
        for i in 0..n {
            match controller.step().await {
                Ok(outcome) => {
                    metrics.steps += 1;
                    if outcome.student != controller.config().roster[i] {
                        failures.push(format!("step {} placed {} out of roster order", i, outcome.student));
                    }
                }
                Err(e) => failures.push(format!("step {} failed: {}", i, e)),
            }
        }
        let extra = controller.step().await;

        let outcome = (|| {
            if let Some(first) = failures.first() {
                return Err(first.clone());
            }
            check!(
                controller.session().phase() == SessionPhase::Complete,
                "phase is {} after {} steps",
                controller.session().phase(),
                n
            );
            let assignment = controller.current_assignment().unwrap_or_default();
            check!(assignment.is_complete_for(&grid), "incremental result is not a bijection");
            check!(
                matches!(extra, Err(ShuffleError::InvalidStateTransition { .. })),
                "step after Complete returned {:?}",
                extra.map(|o| o.seat)
            );
            check!(!controller.controls().step_enabled, "step still enabled after Complete");
            Ok(())
        })();
        (metrics, outcome)
    }

    /// Reset is idempotent from every phase.
    async fn run_reset(&self, ctx: &Arc<SimContext>) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let grid = SeatGrid::from_cells(&[&[1, 1, 1]]);
        let config = Config {
            roster: roster(3),
            seat_grid: grid,
            shuffle: fast_pacing(2),
            labels: DisplayLabels::default(),
        };
        let chart = HtmlChart::new(config.seat_grid.clone(), config.labels.clone());
        let mut controller = SeatingController::new(Arc::clone(ctx), config, chart);

        let mut problems = Vec::new();
        for steps_before_reset in [0usize, 1, 3] {
            for _ in 0..steps_before_reset {
                if controller.step().await.is_ok() {
                    metrics.steps += 1;
                }
            }
            for _ in 0..2 {
                controller.reset();
                let session = controller.session();
                if session.phase() != SessionPhase::Idle
                    || session.current_index() != 0
                    || controller.has_assignment()
                    || *session != ShuffleSession::new()
                {
                    problems.push(format!("reset after {} steps left {:?}", steps_before_reset, session));
                }
            }
        }

        let outcome = match problems.into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        };
        (metrics, outcome)
    }

    /// Full shuffle occupancy converges to 1/n.
    fn run_uniformity(&self, ctx: &SimContext) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let grid = SeatGrid::from_cells(&[&[1, 1, 0], &[1, 1, 1]]);
        let students = roster(grid.available_count());
        let mut matrix = OccupancyMatrix::new(students.len());

        let outcome = (|| {
            for _ in 0..self.trials {
                let assignment = shuffle_all(ctx, &students, &grid).map_err(|e| e.to_string())?;
                metrics.shuffles += 1;
                matrix.record(&grid, &students, &assignment);
            }
            Ok(())
        })();

        let report = matrix.report();
        let outcome = outcome.and_then(|_| uniformity_verdict(&report));
        metrics.uniformity = Some(report);
        (metrics, outcome)
    }

    /// Incremental occupancy converges to 1/n.
    async fn run_step_uniformity(&self, ctx: &Arc<SimContext>) -> Verdict {
        let mut metrics = ScenarioMetrics::default();
        let grid = SeatGrid::from_cells(&[&[1, 1], &[1, 1]]);
        let students = roster(grid.available_count());
        let pacing = fast_pacing(0);
        let mut chart = HtmlChart::new(grid.clone(), DisplayLabels::default());
        let mut matrix = OccupancyMatrix::new(students.len());
        let mut error = None;

        'trials: for _ in 0..self.trials {
            let mut session = ShuffleSession::new();
            while session.phase() != SessionPhase::Complete {
                match step(ctx.as_ref(), &session, &students, &grid, &pacing, &mut chart).await {
                    Ok(outcome) => {
                        metrics.steps += 1;
                        session = outcome.session;
                    }
                    Err(e) => {
                        error = Some(e.to_string());
                        break 'trials;
                    }
                }
            }
            matrix.record(&grid, &students, &session.assignment(&grid));
        }

        let report = matrix.report();
        let outcome = match error {
            Some(e) => Err(e),
            None => uniformity_verdict(&report),
        };
        metrics.uniformity = Some(report);
        (metrics, outcome)
    }
}

fn uniformity_verdict(report: &UniformityReport) -> Result<(), String> {
    if report.is_uniform() {
        Ok(())
    } else {
        Err(format!(
            "max deviation {:.4} exceeds tolerance {:.4} over {} trials",
            report.max_deviation, report.tolerance, report.trials
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_scenarios_pass() {
        let runner = ScenarioRunner::new(42).with_trials(2000);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario).await;
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_metrics() {
        let a = ScenarioRunner::new(7).run(ScenarioId::Incremental).await;
        let b = ScenarioRunner::new(7).run(ScenarioId::Incremental).await;
        assert_eq!(a.metrics.virtual_time_ms, b.metrics.virtual_time_ms);
        assert_eq!(a.metrics.steps, b.metrics.steps);
        assert!(a.metrics.virtual_time_ms > 0);
    }

    #[tokio::test]
    async fn test_statistical_scenario_reports_uniformity() {
        let result = ScenarioRunner::new(3)
            .with_trials(500)
            .run(ScenarioId::Uniformity)
            .await;
        let report = result.metrics.uniformity.expect("uniformity report");
        assert_eq!(report.trials, 500);
        assert_eq!(report.seats, 5);
    }

    #[test]
    fn test_classroom_grid_shape() {
        let grid = classroom_grid();
        assert_eq!(grid.row_count(), 6);
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.available_count(), 34);
    }
}
