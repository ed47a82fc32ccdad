//! ChartRenderer - turns a grid and (partial) assignment into something visible.
//!
//! Renderers are addressed per seat so the incremental engine can change a
//! single cell without redrawing the chart. [`HtmlChart`] produces the same
//! Bootstrap grid markup the browser page uses.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use crate::config::DisplayLabels;
use crate::roster::Student;
use crate::seat_grid::{SeatCoord, SeatGrid};
use crate::session::SeatEvent;
use crate::shuffle::Assignment;

/// What a single seat currently displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatContent {
    Vacant,
    /// Shown during dithering, not yet committed
    Tentative(Student),
    Assigned(Student),
}

impl SeatContent {
    pub fn student(&self) -> Option<&Student> {
        match self {
            SeatContent::Vacant => None,
            SeatContent::Tentative(s) | SeatContent::Assigned(s) => Some(s),
        }
    }
}

/// A visual surface for the seating chart.
pub trait ChartRenderer {
    /// Full redraw. `None` draws every seat vacant.
    fn render(&mut self, grid: &SeatGrid, assignment: Option<&Assignment>);

    /// Blanks every seat of the last rendered grid.
    fn clear_seats(&mut self);

    /// Changes a single seat.
    fn update_seat(&mut self, coord: SeatCoord, content: SeatContent);

    /// Marks the most recently committed seat.
    fn highlight(&mut self, _coord: Option<SeatCoord>) {}

    /// The student about to be placed.
    fn announce(&mut self, _student: &Student, _index: usize, _total: usize) {}

    /// Progress of the dithering animation.
    fn progress(&mut self, _iteration: u32, _iterations: u32, _delay: Duration) {}

    /// Routes an engine event to the per-seat methods.
    fn apply(&mut self, event: &SeatEvent) {
        match event {
            SeatEvent::GridCleared => {
                self.highlight(None);
                self.clear_seats();
            }
            SeatEvent::Announced {
                student,
                index,
                total,
            } => self.announce(student, *index, *total),
            SeatEvent::Tentative {
                coord,
                student,
                iteration,
                iterations,
                delay,
            } => {
                self.progress(*iteration, *iterations, *delay);
                self.update_seat(*coord, SeatContent::Tentative(student.clone()));
            }
            SeatEvent::Vacated { coord } => self.update_seat(*coord, SeatContent::Vacant),
            SeatEvent::Committed { coord, student } => {
                self.update_seat(*coord, SeatContent::Assigned(student.clone()));
                self.highlight(Some(*coord));
            }
        }
    }
}

/// Escapes text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// In-memory HTML rendering of the chart.
#[derive(Debug, Clone)]
pub struct HtmlChart {
    grid: SeatGrid,
    labels: DisplayLabels,
    cells: BTreeMap<SeatCoord, SeatContent>,
    highlighted: Option<SeatCoord>,
    status: Option<String>,
}

impl HtmlChart {
    /// Creates a chart with every seat vacant.
    pub fn new(grid: SeatGrid, labels: DisplayLabels) -> Self {
        let mut chart = Self {
            grid: SeatGrid::default(),
            labels,
            cells: BTreeMap::new(),
            highlighted: None,
            status: None,
        };
        chart.render(&grid, None);
        chart
    }

    pub fn seat_content(&self, coord: SeatCoord) -> Option<&SeatContent> {
        self.cells.get(&coord)
    }

    pub fn highlighted(&self) -> Option<SeatCoord> {
        self.highlighted
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Bootstrap column span of one seat.
    fn cell_width(&self) -> usize {
        (12 / self.grid.width().max(1)).max(1)
    }

    /// Markup of a single seat element, addressable by its data attributes.
    pub fn seat_html(&self, coord: SeatCoord) -> Option<String> {
        let content = self.cells.get(&coord)?;
        let assigned = matches!(content, SeatContent::Assigned(_));
        let mut classes = String::from("d-flex flex-column seat-cell-border");
        if matches!(content, SeatContent::Tentative(_)) {
            classes.push_str(" seat-cell-tentative");
        }
        if self.highlighted == Some(coord) {
            classes.push_str(" seat-cell-border-blink");
        }
        let (id, name, ruby) = match content.student() {
            Some(s) => (
                s.id.to_string(),
                escape_html(&s.name),
                escape_html(&s.ruby),
            ),
            None => ("&nbsp;".into(), "&nbsp;".into(), "&nbsp;".into()),
        };
        Some(format!(
            "<div class=\"{classes}\" data-seat-row=\"{}\" data-seat-col=\"{}\" data-seat-assigned=\"{assigned}\">\
             <span>{id}</span><span class=\"fs-5 fw-bold\">{name}</span><span class=\"text-secondary\">{ruby}</span></div>",
            coord.row, coord.col
        ))
    }

    /// The chart fragment: one `.row` per grid row that has a seat, then the
    /// class label centred underneath.
    pub fn to_html(&self) -> String {
        let width = self.cell_width();
        let mut html = String::new();

        for (row, cells) in self.grid.rows().iter().enumerate() {
            if !self.grid.row_has_seat(row) {
                continue;
            }
            html.push_str("<div class=\"row py-1\">");
            for (col, &present) in cells.iter().enumerate() {
                let coord = SeatCoord::new(row, col);
                match self.seat_html(coord).filter(|_| present) {
                    Some(seat) => {
                        let _ = write!(html, "<div class=\"col-{width} px-1\">{seat}</div>");
                    }
                    None => {
                        let _ = write!(html, "<div class=\"col-{width} px-1\"></div>");
                    }
                }
            }
            html.push_str("</div>");
        }

        let third = width * self.grid.width().max(1) / 3;
        let _ = write!(
            html,
            "<div class=\"row py-1\"><div class=\"col-{third} px-1\"></div>\
             <div class=\"col-{third} px-1\"><div class=\"d-flex flex-column seat-cell-border\">\
             <span class=\"fs-5 fw-bold\">{}</span></div></div>\
             <div class=\"col-{third} px-1\"></div></div>",
            escape_html(&self.labels.class_label())
        );
        html
    }

    /// A standalone page wrapping [`HtmlChart::to_html`].
    pub fn to_document(&self) -> String {
        let title = escape_html(&self.labels.class_label());
        format!(
            "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n\
             <link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css\">\n\
             <style>\n\
             .seat-cell-border {{ border: 1px solid var(--bs-border-color); border-radius: .375rem; text-align: center; padding: .25rem; }}\n\
             .seat-cell-tentative {{ opacity: .6; }}\n\
             .seat-cell-border-blink {{ border-color: var(--bs-primary); border-width: 3px; }}\n\
             </style>\n</head>\n<body>\n<div class=\"container py-3\" id=\"seatingChartHandmade\">\n{}\n</div>\n</body>\n</html>\n",
            self.to_html()
        )
    }
}

impl ChartRenderer for HtmlChart {
    fn render(&mut self, grid: &SeatGrid, assignment: Option<&Assignment>) {
        self.grid = grid.clone();
        self.highlighted = None;
        self.cells = grid
            .available_coords()
            .into_iter()
            .map(|coord| {
                let content = assignment
                    .and_then(|a| a.student_at(coord))
                    .map(|s| SeatContent::Assigned(s.clone()))
                    .unwrap_or(SeatContent::Vacant);
                (coord, content)
            })
            .collect();
    }

    fn clear_seats(&mut self) {
        for content in self.cells.values_mut() {
            *content = SeatContent::Vacant;
        }
    }

    fn update_seat(&mut self, coord: SeatCoord, content: SeatContent) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            *cell = content;
        }
    }

    fn highlight(&mut self, coord: Option<SeatCoord>) {
        self.highlighted = coord;
    }

    fn announce(&mut self, student: &Student, _index: usize, _total: usize) {
        self.status = Some(student.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::Placement;

    fn labels() -> DisplayLabels {
        let mut labels = DisplayLabels::default();
        labels.class_number.grade = 2;
        labels.class_number.class = 3;
        labels
    }

    #[test]
    fn test_blank_chart_markup() {
        let grid = SeatGrid::from_cells(&[&[1, 0], &[0, 0], &[1, 1]]);
        let chart = HtmlChart::new(grid, labels());
        let html = chart.to_html();

        // Row 1 has no seat and is skipped; plus the label row.
        assert_eq!(html.matches("<div class=\"row py-1\">").count(), 3);
        assert_eq!(html.matches("data-seat-assigned=\"false\"").count(), 3);
        assert!(html.contains("data-seat-row=\"2\" data-seat-col=\"1\""));
        assert!(html.contains("col-6 px-1"));
        assert!(html.contains("2年3組"));
    }

    #[test]
    fn test_assignment_markup_is_escaped() {
        let grid = SeatGrid::from_cells(&[&[1]]);
        let student = Student::new(4, "<Bob & Co>", "ぼぶ");
        let assignment = Assignment::from_placements(
            &grid,
            vec![Placement {
                coord: SeatCoord::new(0, 0),
                student,
            }],
        );
        let mut chart = HtmlChart::new(grid.clone(), labels());
        chart.render(&grid, Some(&assignment));

        let html = chart.to_html();
        assert!(html.contains("&lt;Bob &amp; Co&gt;"));
        assert!(html.contains("data-seat-assigned=\"true\""));
        assert!(html.contains("<span>4</span>"));
    }

    #[test]
    fn test_events_update_single_seats() {
        let grid = SeatGrid::from_cells(&[&[1, 1]]);
        let mut chart = HtmlChart::new(grid, labels());
        let a = Student::new(1, "A", "a");
        let left = SeatCoord::new(0, 0);
        let right = SeatCoord::new(0, 1);

        chart.apply(&SeatEvent::Tentative {
            coord: left,
            student: a.clone(),
            iteration: 0,
            iterations: 3,
            delay: Duration::from_millis(5),
        });
        assert_eq!(chart.seat_content(left), Some(&SeatContent::Tentative(a.clone())));
        assert!(chart.seat_html(left).unwrap().contains("seat-cell-tentative"));

        chart.apply(&SeatEvent::Vacated { coord: left });
        chart.apply(&SeatEvent::Committed {
            coord: right,
            student: a.clone(),
        });
        assert_eq!(chart.seat_content(left), Some(&SeatContent::Vacant));
        assert_eq!(chart.seat_content(right), Some(&SeatContent::Assigned(a)));
        assert_eq!(chart.highlighted(), Some(right));
        assert!(chart.seat_html(right).unwrap().contains("seat-cell-border-blink"));

        chart.apply(&SeatEvent::GridCleared);
        assert_eq!(chart.seat_content(right), Some(&SeatContent::Vacant));
        assert_eq!(chart.highlighted(), None);
    }

    #[test]
    fn test_updates_outside_grid_are_ignored() {
        let grid = SeatGrid::from_cells(&[&[1, 0]]);
        let mut chart = HtmlChart::new(grid, labels());
        chart.update_seat(SeatCoord::new(0, 1), SeatContent::Vacant);
        assert_eq!(chart.seat_content(SeatCoord::new(0, 1)), None);
        assert!(chart.seat_html(SeatCoord::new(5, 5)).is_none());
    }

    #[test]
    fn test_document_wraps_fragment() {
        let chart = HtmlChart::new(SeatGrid::from_cells(&[&[1]]), labels());
        let doc = chart.to_document();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(&chart.to_html()));
        assert!(doc.contains("<title>2年3組</title>"));
    }
}
