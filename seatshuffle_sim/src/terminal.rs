//! Terminal seating chart for the interactive `step` mode.
//!
//! Every seat update redraws the whole chart with crossterm. Seats are fixed
//! width boxes; tentative placements are yellow and the freshly committed
//! seat is shown in reverse video.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use seatshuffle_core::{Assignment, ChartRenderer, SeatContent, SeatCoord, SeatGrid, Student};
use tracing::warn;

/// Characters between the seat brackets.
const CELL_WIDTH: usize = 12;

/// Crossterm-backed [`ChartRenderer`].
pub struct TerminalChart<W: Write> {
    out: W,
    grid: SeatGrid,
    class_label: String,
    cells: BTreeMap<SeatCoord, SeatContent>,
    highlighted: Option<SeatCoord>,
    announced: Option<String>,
    progress: Option<String>,
    footer: String,
}

impl<W: Write> TerminalChart<W> {
    pub fn new(out: W, class_label: impl Into<String>) -> Self {
        Self {
            out,
            grid: SeatGrid::default(),
            class_label: class_label.into(),
            cells: BTreeMap::new(),
            highlighted: None,
            announced: None,
            progress: None,
            footer: String::new(),
        }
    }

    /// Key hints printed under the status line.
    pub fn set_footer(&mut self, footer: impl Into<String>) {
        self.footer = footer.into();
        self.redraw();
    }

    /// Replaces the status line with a one-off message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.announced = Some(message.into());
        self.progress = None;
        self.redraw();
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// The chart as plain text lines, without colors.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (row, cells) in self.grid.rows().iter().enumerate() {
            if !self.grid.row_has_seat(row) {
                continue;
            }
            let line: String = cells
                .iter()
                .enumerate()
                .map(|(col, &present)| {
                    let coord = SeatCoord::new(row, col);
                    match self.cells.get(&coord).filter(|_| present) {
                        Some(content) => seat_text(content),
                        None => " ".repeat(CELL_WIDTH + 2),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(line.trim_end().to_string());
        }
        let width = (CELL_WIDTH + 3) * self.grid.width();
        lines.push(format!("{:^width$}", format!("[ {} ]", self.class_label)));
        lines.push(self.status_line());
        lines
    }

    fn status_line(&self) -> String {
        match (&self.announced, &self.progress) {
            (Some(who), Some(progress)) => format!("{who}    {progress}"),
            (Some(who), None) => who.clone(),
            (None, Some(progress)) => progress.clone(),
            (None, None) => String::new(),
        }
    }

    /// Writes one full frame.
    pub fn draw(&mut self) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        let mut y: u16 = 0;

        for (row, cells) in self.grid.rows().iter().enumerate() {
            if !self.grid.row_has_seat(row) {
                continue;
            }
            queue!(self.out, MoveTo(0, y))?;
            for (col, &present) in cells.iter().enumerate() {
                let coord = SeatCoord::new(row, col);
                let content = self.cells.get(&coord).filter(|_| present);
                match content {
                    Some(content) if matches!(content, SeatContent::Tentative(_)) => queue!(
                        self.out,
                        SetForegroundColor(Color::Yellow),
                        Print(seat_text(content)),
                        ResetColor
                    )?,
                    Some(content) if self.highlighted == Some(coord) => queue!(
                        self.out,
                        SetAttribute(Attribute::Reverse),
                        Print(seat_text(content)),
                        SetAttribute(Attribute::Reset)
                    )?,
                    Some(content) => queue!(self.out, Print(seat_text(content)))?,
                    None => queue!(self.out, Print(" ".repeat(CELL_WIDTH + 2)))?,
                }
                queue!(self.out, Print(" "))?;
            }
            y += 1;
        }

        let width = (CELL_WIDTH + 3) * self.grid.width();
        let label = format!("{:^width$}", format!("[ {} ]", self.class_label));
        let status = self.status_line();
        queue!(
            self.out,
            MoveTo(0, y + 1),
            SetAttribute(Attribute::Bold),
            Print(label),
            SetAttribute(Attribute::Reset),
            MoveTo(0, y + 3),
            Print(status),
            MoveTo(0, y + 5),
            SetForegroundColor(Color::DarkGrey),
            Print(&self.footer),
            ResetColor
        )?;
        self.out.flush()
    }

    fn redraw(&mut self) {
        if let Err(e) = self.draw() {
            warn!("terminal redraw failed: {}", e);
        }
    }
}

fn seat_text(content: &SeatContent) -> String {
    let inner = match content.student() {
        Some(student) => fit(&format!("{} {}", student.id, student.name)),
        None => " ".repeat(CELL_WIDTH),
    };
    format!("[{inner}]")
}

/// Pads or truncates to exactly `CELL_WIDTH` characters.
fn fit(text: &str) -> String {
    let mut out: String = text.chars().take(CELL_WIDTH).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(CELL_WIDTH - len));
    out
}

impl<W: Write> ChartRenderer for TerminalChart<W> {
    fn render(&mut self, grid: &SeatGrid, assignment: Option<&Assignment>) {
        self.grid = grid.clone();
        self.highlighted = None;
        self.progress = None;
        self.announced = None;
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
        self.redraw();
    }

    fn clear_seats(&mut self) {
        for content in self.cells.values_mut() {
            *content = SeatContent::Vacant;
        }
        self.redraw();
    }

    fn update_seat(&mut self, coord: SeatCoord, content: SeatContent) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            *cell = content;
            self.redraw();
        }
    }

    fn highlight(&mut self, coord: Option<SeatCoord>) {
        self.highlighted = coord;
        self.redraw();
    }

    fn announce(&mut self, student: &Student, index: usize, total: usize) {
        self.announced = Some(format!("{student}  ({}/{total})", index + 1));
        self.progress = None;
        self.redraw();
    }

    fn progress(&mut self, iteration: u32, iterations: u32, delay: Duration) {
        self.progress = Some(format!(
            "Iter {}/{}, Wait {}ms",
            iteration + 1,
            iterations,
            delay.as_millis()
        ));
    }
}
