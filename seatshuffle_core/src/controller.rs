//! SeatingController - the UI-facing driver with button gating.
//!
//! Owns the loaded `Config`, a renderer and the current session, and keeps
//! the enable/disable state of the four controls (step, shuffle, reset,
//! export) consistent with what has happened so far.
//!
//! `step()` takes `&mut self`, so a second step cannot start while one is
//! still animating.

use std::path::Path;
use std::sync::Arc;

use seatshuffle_env::ShuffleContext;
use tracing::{info, warn};

use crate::config::{Config, GRID_FILE, ROSTER_FILE};
use crate::error::{ExportError, ShuffleError};
use crate::export::{ExportAdapter, ExportSnapshot};
use crate::render::{ChartRenderer, HtmlChart};
use crate::session::{step, SessionPhase, ShuffleSession, StepOutcome};
use crate::shuffle::{shuffle_all, Assignment};

/// Which controls the UI should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub step_enabled: bool,
    pub shuffle_enabled: bool,
    pub reset_enabled: bool,
    pub export_enabled: bool,
}

impl ControlState {
    fn initial() -> Self {
        Self {
            step_enabled: true,
            shuffle_enabled: true,
            reset_enabled: true,
            export_enabled: false,
        }
    }
}

pub struct SeatingController<C, R> {
    ctx: Arc<C>,
    config: Config,
    renderer: R,
    session: ShuffleSession,
    full_assignment: Option<Assignment>,
    error_message: Option<String>,
    controls: ControlState,
}

impl<C, R> SeatingController<C, R>
where
    C: ShuffleContext,
    R: ChartRenderer,
{
    /// Draws the unassigned grid and enables step, shuffle and reset.
    pub fn new(ctx: Arc<C>, config: Config, mut renderer: R) -> Self {
        renderer.render(&config.seat_grid, None);
        Self {
            ctx,
            config,
            renderer,
            session: ShuffleSession::new(),
            full_assignment: None,
            error_message: None,
            controls: ControlState::initial(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn session(&self) -> &ShuffleSession {
        &self.session
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    /// The inline message for the last failed action, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// True once at least one seat holds a student.
    pub fn has_assignment(&self) -> bool {
        self.full_assignment.is_some() || self.session.placed_count() > 0
    }

    /// The assignment currently on display.
    pub fn current_assignment(&self) -> Option<Assignment> {
        if let Some(full) = &self.full_assignment {
            return Some(full.clone());
        }
        if self.session.placed_count() > 0 {
            return Some(self.session.assignment(&self.config.seat_grid));
        }
        None
    }

    fn report(&mut self, err: &ShuffleError) {
        let message = match err {
            ShuffleError::SeatCountMismatch { .. } => {
                format!("Error: {err}\nPlease check {ROSTER_FILE} and {GRID_FILE}")
            }
            _ => format!("Error: {err}"),
        };
        warn!("{}", message);
        self.error_message = Some(message);
    }

    /// Assigns every student at once.
    pub fn shuffle_all(&mut self) -> Result<&Assignment, ShuffleError> {
        self.error_message = None;
        let result = shuffle_all(
            self.ctx.as_ref(),
            &self.config.roster,
            &self.config.seat_grid,
        );

        match result {
            Ok(assignment) => {
                self.session.reset();
                self.renderer
                    .render(&self.config.seat_grid, Some(&assignment));
                self.controls.export_enabled = true;
                info!("full shuffle placed {} students", assignment.len());
                Ok(self.full_assignment.insert(assignment))
            }
            Err(err) => {
                self.report(&err);
                if matches!(err, ShuffleError::SeatCountMismatch { .. }) {
                    self.full_assignment = None;
                    self.renderer.render(&self.config.seat_grid, None);
                    self.controls.export_enabled = self.has_assignment();
                }
                Err(err)
            }
        }
    }

    /// Places the next student with the dithering animation.
    pub async fn step(&mut self) -> Result<StepOutcome, ShuffleError> {
        self.error_message = None;
        let result = step(
            self.ctx.as_ref(),
            &self.session,
            &self.config.roster,
            &self.config.seat_grid,
            &self.config.shuffle,
            &mut self.renderer,
        )
        .await;

        match result {
            Ok(outcome) => {
                self.full_assignment = None;
                self.session = outcome.session.clone();
                let complete = self.session.phase() == SessionPhase::Complete;
                self.controls = ControlState {
                    step_enabled: !complete,
                    shuffle_enabled: complete,
                    reset_enabled: true,
                    export_enabled: true,
                };
                Ok(outcome)
            }
            Err(err) => {
                self.report(&err);
                // A failed step may already have blanked or dithered the
                // chart; redraw what the controller still holds.
                let shown = self.current_assignment();
                self.renderer.render(&self.config.seat_grid, shown.as_ref());
                self.controls.export_enabled = self.has_assignment();
                Err(err)
            }
        }
    }

    /// Returns to an empty chart from any state.
    pub fn reset(&mut self) {
        self.session.reset();
        self.full_assignment = None;
        self.error_message = None;
        self.renderer.render(&self.config.seat_grid, None);
        self.controls = ControlState::initial();
        info!("seating chart reset");
    }

    /// Writes the current assignment with `adapter`.
    pub fn export(&self, adapter: &dyn ExportAdapter, path: &Path) -> Result<(), ExportError> {
        if !self.controls.export_enabled {
            return Err(ExportError::NotReady);
        }
        let assignment = self.current_assignment().ok_or(ExportError::NotReady)?;
        let grid = &self.config.seat_grid;
        let mut chart = HtmlChart::new(grid.clone(), self.config.labels.clone());
        chart.render(grid, Some(&assignment));

        let snapshot = ExportSnapshot {
            grid,
            assignment: &assignment,
            labels: &self.config.labels,
            chart: &chart,
            generated_at: self.ctx.system_time(),
        };
        adapter.write_to_file(&snapshot, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayLabels, ShuffleConfig};
    use crate::export::{AssignmentDocument, JsonExport};
    use crate::render::SeatContent;
    use crate::seat_grid::{SeatCoord, SeatGrid};
    use crate::session::tests::VirtualContext;
    use crate::shuffle::tests::roster;
    use seatshuffle_env::{EntropySource, EnvError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn config(students: usize, cells: &[&[u8]]) -> Config {
        Config {
            roster: roster(students),
            seat_grid: SeatGrid::from_cells(cells),
            shuffle: ShuffleConfig {
                initial_delay_ms: 1,
                max_delay_ms: 5,
                total_iterations: 3,
            },
            labels: DisplayLabels::default(),
        }
    }

    fn controller(students: usize, cells: &[&[u8]]) -> SeatingController<VirtualContext, HtmlChart> {
        let config = config(students, cells);
        let chart = HtmlChart::new(config.seat_grid.clone(), config.labels.clone());
        SeatingController::new(Arc::new(VirtualContext::new(99)), config, chart)
    }

    #[test]
    fn test_initial_gating() {
        let ctl = controller(2, &[&[1, 1]]);
        assert_eq!(ctl.controls(), ControlState::initial());
        assert!(!ctl.has_assignment());
        assert!(ctl.current_assignment().is_none());
    }

    #[test]
    fn test_shuffle_all_enables_export() {
        let mut ctl = controller(3, &[&[1, 1, 1]]);
        let assignment = ctl.shuffle_all().unwrap().clone();

        assert!(ctl.has_assignment());
        assert!(ctl.controls().export_enabled);
        for placement in assignment.iter() {
            assert_eq!(
                ctl.renderer().seat_content(placement.coord),
                Some(&SeatContent::Assigned(placement.student.clone()))
            );
        }
    }

    #[test]
    fn test_mismatch_sets_message_and_keeps_grid_blank() {
        let mut ctl = controller(3, &[&[1, 0, 1]]);
        let err = ctl.shuffle_all().unwrap_err();

        assert_eq!(err, ShuffleError::SeatCountMismatch { students: 3, seats: 2 });
        let message = ctl.error_message().unwrap();
        assert!(message.contains("(3 \u{2260} 2)"));
        assert!(message.contains(ROSTER_FILE));
        assert_eq!(
            ctl.renderer().seat_content(SeatCoord::new(0, 0)),
            Some(&SeatContent::Vacant)
        );
        assert!(!ctl.controls().export_enabled);
        assert!(ctl.controls().step_enabled);
    }

    #[tokio::test]
    async fn test_step_gating_through_full_run() {
        let mut ctl = controller(3, &[&[1, 1], &[0, 1]]);

        ctl.step().await.unwrap();
        let controls = ctl.controls();
        assert!(controls.step_enabled);
        assert!(!controls.shuffle_enabled);
        assert!(controls.export_enabled);

        ctl.step().await.unwrap();
        ctl.step().await.unwrap();
        let controls = ctl.controls();
        assert!(!controls.step_enabled);
        assert!(controls.shuffle_enabled);
        assert_eq!(ctl.session().phase(), SessionPhase::Complete);

        let err = ctl.step().await.unwrap_err();
        assert!(matches!(err, ShuffleError::InvalidStateTransition { .. }));
        assert!(ctl.error_message().is_some());
        assert_eq!(ctl.session().placed_count(), 3);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let mut ctl = controller(2, &[&[1, 1]]);
        ctl.step().await.unwrap();
        ctl.reset();

        assert_eq!(ctl.session().phase(), SessionPhase::Idle);
        assert_eq!(ctl.controls(), ControlState::initial());
        assert!(!ctl.has_assignment());
        for coord in ctl.config().seat_grid.available_coords() {
            assert_eq!(ctl.renderer().seat_content(coord), Some(&SeatContent::Vacant));
        }
    }

    #[tokio::test]
    async fn test_step_after_full_shuffle_starts_fresh() {
        let mut ctl = controller(2, &[&[1, 1]]);
        ctl.shuffle_all().unwrap();
        let outcome = ctl.step().await.unwrap();

        assert_eq!(ctl.session().placed_count(), 1);
        let assigned = ctl
            .config()
            .seat_grid
            .available_coords()
            .into_iter()
            .filter(|c| matches!(ctl.renderer().seat_content(*c), Some(SeatContent::Assigned(_))))
            .count();
        assert_eq!(assigned, 1);
        assert_eq!(ctl.current_assignment().unwrap().seat_of(outcome.student.id), Some(outcome.seat));
    }

    #[test]
    fn test_export_requires_assignment() {
        let dir = tempdir().unwrap();
        let ctl = controller(1, &[&[1]]);
        let err = ctl.export(&JsonExport, &dir.path().join("a.json")).unwrap_err();
        assert!(matches!(err, ExportError::NotReady));
    }

    #[tokio::test]
    async fn test_partial_export_after_step() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        let mut ctl = controller(2, &[&[1, 1]]);
        ctl.step().await.unwrap();
        ctl.export(&JsonExport, &path).unwrap();

        let doc: AssignmentDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc.seats.len(), 1);
        assert!(!doc.complete);
    }

    /// Seeded draws until `limit` have been made, then an entropy failure.
    struct FlakyContext {
        inner: VirtualContext,
        draws: AtomicUsize,
        limit: usize,
    }

    impl EntropySource for FlakyContext {
        fn uniform_below(&self, bound: usize) -> Result<usize, EnvError> {
            let made = self.draws.fetch_add(1, Ordering::SeqCst);
            if made >= self.limit {
                return Err(EnvError::entropy("pool gone"));
            }
            self.inner.uniform_below(bound)
        }
    }

    #[async_trait::async_trait]
    impl ShuffleContext for FlakyContext {
        fn now(&self) -> Duration {
            self.inner.now()
        }

        fn system_time(&self) -> SystemTime {
            self.inner.system_time()
        }

        async fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration).await;
        }

        fn seed(&self) -> u64 {
            self.inner.seed()
        }
    }

    #[tokio::test]
    async fn test_failed_step_restores_previous_chart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("after-failure.json");
        let config = config(2, &[&[1, 1]]);
        let chart = HtmlChart::new(config.seat_grid.clone(), config.labels.clone());
        let ctx = FlakyContext {
            inner: VirtualContext::new(5),
            draws: Default::default(),
            limit: 1,
        };
        let mut ctl = SeatingController::new(Arc::new(ctx), config, chart);

        // Two students need exactly one Fisher-Yates draw.
        let full = ctl.shuffle_all().unwrap().clone();
        let err = ctl.step().await.unwrap_err();
        assert!(matches!(err, ShuffleError::Entropy(_)));

        assert_eq!(ctl.session().phase(), SessionPhase::Idle);
        assert!(ctl.has_assignment());
        assert!(ctl.controls().export_enabled);
        assert_eq!(ctl.current_assignment(), Some(full.clone()));
        for placement in full.iter() {
            assert_eq!(
                ctl.renderer().seat_content(placement.coord),
                Some(&SeatContent::Assigned(placement.student.clone()))
            );
        }

        ctl.export(&JsonExport, &path).unwrap();
        let doc: AssignmentDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(doc.complete);
        assert_eq!(doc.seats.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_step_leaves_chart_blank() {
        let config = config(3, &[&[1, 1, 1]]);
        let chart = HtmlChart::new(config.seat_grid.clone(), config.labels.clone());
        let ctx = FlakyContext {
            inner: VirtualContext::new(5),
            draws: Default::default(),
            limit: 2,
        };
        let mut ctl = SeatingController::new(Arc::new(ctx), config, chart);

        assert!(ctl.step().await.is_err());
        assert!(!ctl.has_assignment());
        assert!(!ctl.controls().export_enabled);
        for coord in ctl.config().seat_grid.available_coords() {
            assert_eq!(ctl.renderer().seat_content(coord), Some(&SeatContent::Vacant));
        }
    }
}
