//! ExportAdapter - writes a finished (or partially finished) chart to disk.
//!
//! Two formats:
//! - `JsonExport`: the assignment as a structured document
//! - `HtmlExport`: the rendered chart as a standalone page

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DisplayLabels;
use crate::error::ExportError;
use crate::render::HtmlChart;
use crate::roster::Student;
use crate::seat_grid::SeatGrid;
use crate::shuffle::Assignment;

/// One occupied seat in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRecord {
    /// Canonical row-major seat index
    pub seat_index: usize,
    pub row: usize,
    pub col: usize,
    pub student: Student,
}

/// Structured export of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDocument {
    /// e.g. `2年3組`
    pub class_label: String,

    /// Milliseconds since the Unix epoch
    pub generated_at_ms: u64,

    /// True when every available seat is filled
    pub complete: bool,

    /// Seats in canonical order
    pub seats: Vec<SeatRecord>,
}

impl AssignmentDocument {
    pub fn new(
        grid: &SeatGrid,
        assignment: &Assignment,
        labels: &DisplayLabels,
        generated_at: SystemTime,
    ) -> Self {
        let seats = assignment
            .iter()
            .filter_map(|p| {
                grid.seat_index(p.coord).map(|seat_index| SeatRecord {
                    seat_index,
                    row: p.coord.row,
                    col: p.coord.col,
                    student: p.student.clone(),
                })
            })
            .collect();

        Self {
            class_label: labels.class_label(),
            generated_at_ms: generated_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            complete: assignment.is_complete_for(grid),
            seats,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything an exporter may need, captured at one point in time.
pub struct ExportSnapshot<'a> {
    pub grid: &'a SeatGrid,
    pub assignment: &'a Assignment,
    pub labels: &'a DisplayLabels,
    pub chart: &'a HtmlChart,
    pub generated_at: SystemTime,
}

/// A destination format for the seating chart.
pub trait ExportAdapter {
    /// Short name used in logs and file names.
    fn format_name(&self) -> &'static str;

    /// Renders the snapshot to bytes.
    fn encode(&self, snapshot: &ExportSnapshot<'_>) -> Result<Vec<u8>, ExportError>;

    /// Encodes and writes to `path`.
    fn write_to_file(&self, snapshot: &ExportSnapshot<'_>, path: &Path) -> Result<(), ExportError> {
        let bytes = self.encode(snapshot)?;
        let io_err = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        info!(
            "exported {} seats as {} to {}",
            snapshot.assignment.len(),
            self.format_name(),
            path.display()
        );
        Ok(())
    }
}

/// `seating-chart.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExport;

impl ExportAdapter for JsonExport {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, snapshot: &ExportSnapshot<'_>) -> Result<Vec<u8>, ExportError> {
        let doc = AssignmentDocument::new(
            snapshot.grid,
            snapshot.assignment,
            snapshot.labels,
            snapshot.generated_at,
        );
        Ok(doc.to_json()?.into_bytes())
    }
}

/// `seating-chart.html`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExport;

impl ExportAdapter for HtmlExport {
    fn format_name(&self) -> &'static str {
        "html"
    }

    fn encode(&self, snapshot: &ExportSnapshot<'_>) -> Result<Vec<u8>, ExportError> {
        Ok(snapshot.chart.to_document().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ChartRenderer;
    use crate::shuffle::{shuffle_all, tests::{roster, SeededSource}};
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_json_export_lists_seats_in_order() {
        let grid = SeatGrid::from_cells(&[&[1, 0, 1], &[1, 1, 0]]);
        let labels = DisplayLabels::default();
        let assignment = shuffle_all(&SeededSource::new(4), &roster(4), &grid).unwrap();
        let mut chart = HtmlChart::new(grid.clone(), labels.clone());
        chart.render(&grid, Some(&assignment));

        let snapshot = ExportSnapshot {
            grid: &grid,
            assignment: &assignment,
            labels: &labels,
            chart: &chart,
            generated_at: UNIX_EPOCH + Duration::from_millis(1_700_000_000_123),
        };
        let bytes = JsonExport.encode(&snapshot).unwrap();
        let doc: AssignmentDocument = serde_json::from_slice(&bytes).unwrap();

        assert!(doc.complete);
        assert_eq!(doc.generated_at_ms, 1_700_000_000_123);
        assert_eq!(doc.class_label, "1年1組");
        let indices: Vec<usize> = doc.seats.iter().map(|s| s.seat_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!((doc.seats[1].row, doc.seats[1].col), (0, 2));
    }

    #[test]
    fn test_exports_write_files() {
        let dir = tempdir().unwrap();
        let grid = SeatGrid::from_cells(&[&[1, 1]]);
        let labels = DisplayLabels::default();
        let assignment = shuffle_all(&SeededSource::new(8), &roster(2), &grid).unwrap();
        let mut chart = HtmlChart::new(grid.clone(), labels.clone());
        chart.render(&grid, Some(&assignment));
        let snapshot = ExportSnapshot {
            grid: &grid,
            assignment: &assignment,
            labels: &labels,
            chart: &chart,
            generated_at: SystemTime::now(),
        };

        let json_path = dir.path().join("seating-chart.json");
        let html_path = dir.path().join("seating-chart.html");
        JsonExport.write_to_file(&snapshot, &json_path).unwrap();
        HtmlExport.write_to_file(&snapshot, &html_path).unwrap();

        let html = std::fs::read_to_string(html_path).unwrap();
        assert!(html.contains("data-seat-assigned=\"true\""));
        assert!(std::fs::read_to_string(json_path).unwrap().contains("\"seats\""));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let grid = SeatGrid::from_cells(&[&[1]]);
        let labels = DisplayLabels::default();
        let assignment = shuffle_all(&SeededSource::new(1), &roster(1), &grid).unwrap();
        let chart = HtmlChart::new(grid.clone(), labels.clone());
        let snapshot = ExportSnapshot {
            grid: &grid,
            assignment: &assignment,
            labels: &labels,
            chart: &chart,
            generated_at: SystemTime::now(),
        };

        let err = JsonExport
            .write_to_file(&snapshot, &dir.path().join("nope").join("out.json"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
