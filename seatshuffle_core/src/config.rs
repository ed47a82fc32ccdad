//! ConfigStore - loads roster, seat grid and settings from a config directory.
//!
//! Three sources are read, all required:
//!
//! | file                         | format                               |
//! |------------------------------|--------------------------------------|
//! | `config.toml`                | labels and shuffle pacing (TOML)     |
//! | `member_list.csv`            | `id,name,ruby` per line, no header   |
//! | `seat_position_matrix.csv`   | rows of comma-separated `0`/`1`      |
//!
//! Rows are parsed positionally and blank lines are skipped. Malformed rows
//! fail the whole load with the file and 1-based line number.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::roster::Student;
use crate::seat_grid::SeatGrid;

pub const SETTINGS_FILE: &str = "config.toml";
pub const ROSTER_FILE: &str = "member_list.csv";
pub const GRID_FILE: &str = "seat_position_matrix.csv";

/// Pacing of the dithering animation in incremental mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuffleConfig {
    /// Wait after the first tentative pick
    pub initial_delay_ms: u64,

    /// Wait after the last tentative pick
    pub max_delay_ms: u64,

    /// Number of tentative picks shown before a seat is committed
    pub total_iterations: u32,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 40,
            max_delay_ms: 600,
            total_iterations: 25,
        }
    }
}

impl ShuffleConfig {
    /// Cubic ease-in from `initial_delay_ms` to `max_delay_ms`.
    ///
    /// `delay(i) = initial + (max - initial) * (i / (total - 1))^3`, rounded to
    /// whole milliseconds. A single-iteration animation waits `initial`.
    pub fn delay_for(&self, iteration: u32) -> Duration {
        let initial = self.initial_delay_ms as f64;
        let max = self.max_delay_ms as f64;
        let t = if self.total_iterations <= 1 {
            0.0
        } else {
            f64::from(iteration) / f64::from(self.total_iterations - 1)
        };
        let eased = t * t * t;
        let ms = initial + (max - initial) * eased;
        Duration::from_millis(ms.round().max(0.0) as u64)
    }
}

/// Grade and class numbers shown on the teacher-desk label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNumber {
    pub grade: u32,
    pub class: u32,
}

impl Default for ClassNumber {
    fn default() -> Self {
        Self { grade: 1, class: 1 }
    }
}

/// Localized suffixes appended to the grade and class numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassSuffixes {
    pub grade: String,
    pub class: String,
}

impl Default for ClassSuffixes {
    fn default() -> Self {
        Self {
            grade: "年".to_string(),
            class: "組".to_string(),
        }
    }
}

/// Everything the chart prints besides student names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayLabels {
    pub class_number: ClassNumber,
    pub class_i18n: ClassSuffixes,
}

impl DisplayLabels {
    /// e.g. `2年3組`
    pub fn class_label(&self) -> String {
        format!(
            "{}{}{}{}",
            self.class_number.grade,
            self.class_i18n.grade,
            self.class_number.class,
            self.class_i18n.class
        )
    }
}

/// The scalar settings document (`config.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub labels: DisplayLabels,
    pub shuffle: ShuffleConfig,
}

impl Settings {
    /// Parses settings from TOML. `path` is only used for error reporting.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully loaded configuration. Read-only for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub roster: Vec<Student>,
    pub seat_grid: SeatGrid,
    pub shuffle: ShuffleConfig,
    pub labels: DisplayLabels,
}

/// Locates and loads the three configuration sources.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    settings_path: PathBuf,
    roster_path: PathBuf,
    grid_path: PathBuf,
}

impl ConfigStore {
    /// Uses the default file names inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            settings_path: dir.join(SETTINGS_FILE),
            roster_path: dir.join(ROSTER_FILE),
            grid_path: dir.join(GRID_FILE),
        }
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    pub fn with_roster_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.roster_path = path.into();
        self
    }

    pub fn with_grid_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.grid_path = path.into();
        self
    }

    /// Reads and parses all three sources.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let settings_text = read_source(&self.settings_path)?;
        let settings = Settings::from_toml_str(&settings_text, &self.settings_path)?;
        debug!("settings={:?}", settings);

        let roster = parse_roster(&read_source(&self.roster_path)?, &self.roster_path)?;
        let seat_grid = parse_grid(&read_source(&self.grid_path)?, &self.grid_path)?;

        info!(
            "loaded config: students={}, seats={}, class={}",
            roster.len(),
            seat_grid.available_count(),
            settings.labels.class_label()
        );

        Ok(Config {
            roster,
            seat_grid,
            shuffle: settings.shuffle,
            labels: settings.labels,
        })
    }
}

fn read_source(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-blank lines with their 1-based line numbers, split on commas.
fn csv_rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line.split(',').map(str::trim).collect()))
}

/// Parses `id,name,ruby` rows. Extra columns are ignored.
pub fn parse_roster(text: &str, path: &Path) -> Result<Vec<Student>, ConfigError> {
    let mut seen: HashMap<u32, usize> = HashMap::new();
    let mut roster = Vec::new();

    for (line, fields) in csv_rows(text) {
        if fields.len() < 3 {
            return Err(ConfigError::malformed(
                path,
                line,
                format!("expected id,name,ruby but found {} column(s)", fields.len()),
            ));
        }
        let id: u32 = fields[0].parse().map_err(|_| {
            ConfigError::malformed(path, line, format!("student id {:?} is not an integer", fields[0]))
        })?;
        if let Some(&first_line) = seen.get(&id) {
            return Err(ConfigError::DuplicateStudentId {
                path: path.to_path_buf(),
                line,
                id,
                first_line,
            });
        }
        seen.insert(id, line);
        roster.push(Student::new(id, fields[1], fields[2]));
    }

    Ok(roster)
}

/// Parses rows of `0`/`1` cells. Every row must have the same length.
pub fn parse_grid(text: &str, path: &Path) -> Result<SeatGrid, ConfigError> {
    let mut rows: Vec<Vec<bool>> = Vec::new();
    let mut expected: Option<usize> = None;

    for (line, fields) in csv_rows(text) {
        let cells = fields
            .iter()
            .map(|cell| match *cell {
                "0" => Ok(false),
                "1" => Ok(true),
                other => Err(ConfigError::malformed(
                    path,
                    line,
                    format!("seat cell {:?} must be 0 or 1", other),
                )),
            })
            .collect::<Result<Vec<bool>, ConfigError>>()?;

        match expected {
            Some(width) if width != cells.len() => {
                return Err(ConfigError::RaggedGrid {
                    path: path.to_path_buf(),
                    line,
                    expected: width,
                    found: cells.len(),
                });
            }
            None => expected = Some(cells.len()),
            _ => {}
        }
        rows.push(cells);
    }

    Ok(SeatGrid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat_grid::SeatCoord;
    use std::fs;
    use tempfile::tempdir;

    const SETTINGS: &str = r#"
[class_number]
grade = 2
class = 3

[class_i18n]
grade = "年"
class = "組"

[shuffle]
initial_delay_ms = 10
max_delay_ms = 100
total_iterations = 4
"#;

    fn write_config(dir: &Path, roster: &str, grid: &str) {
        fs::write(dir.join(SETTINGS_FILE), SETTINGS).unwrap();
        fs::write(dir.join(ROSTER_FILE), roster).unwrap();
        fs::write(dir.join(GRID_FILE), grid).unwrap();
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            "1,Aoki,あおき\n2,Baba,ばば\n\n3,Chiba,ちば\n",
            "1,0,1\n0,1,0\n",
        );

        let config = ConfigStore::new(dir.path()).load().unwrap();

        assert_eq!(config.roster.len(), 3);
        assert_eq!(config.roster[1], Student::new(2, "Baba", "ばば"));
        assert_eq!(config.seat_grid.available_count(), 3);
        assert_eq!(
            config.seat_grid.available_coords()[1],
            SeatCoord::new(0, 2)
        );
        assert_eq!(config.labels.class_label(), "2年3組");
        assert_eq!(config.shuffle.total_iterations, 4);
    }

    #[test]
    fn test_load_from_renamed_files() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        fs::write(dir.path().join("class-2-3.toml"), SETTINGS).unwrap();
        fs::write(dir.path().join("roster.csv"), "1,Aoki,あおき\n2,Baba,ばば\n").unwrap();
        fs::write(elsewhere.path().join("layout.csv"), "1,1\n").unwrap();

        let config = ConfigStore::new(dir.path())
            .with_settings_path(dir.path().join("class-2-3.toml"))
            .with_roster_path(dir.path().join("roster.csv"))
            .with_grid_path(elsewhere.path().join("layout.csv"))
            .load()
            .unwrap();

        assert_eq!(config.roster.len(), 2);
        assert_eq!(config.seat_grid.available_count(), 2);
        assert_eq!(config.labels.class_label(), "2年3組");

        let err = ConfigStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), SETTINGS).unwrap();

        let err = ConfigStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_settings_defaults_fill_gaps() {
        let settings = Settings::from_toml_str("[shuffle]\ntotal_iterations = 3\n", Path::new("x")).unwrap();
        assert_eq!(settings.shuffle.total_iterations, 3);
        assert_eq!(settings.shuffle.initial_delay_ms, ShuffleConfig::default().initial_delay_ms);
        assert_eq!(settings.labels, DisplayLabels::default());
    }

    #[test]
    fn test_bad_settings_rejected() {
        let err = Settings::from_toml_str("[shuffle]\ntotal_iterations = \"many\"\n", Path::new("x"));
        assert!(matches!(err, Err(ConfigError::Settings { .. })));
    }

    #[test]
    fn test_roster_tolerates_crlf_and_extra_columns() {
        let roster = parse_roster("1,A,a,extra\r\n2,B,b\r\n", Path::new("r.csv")).unwrap();
        assert_eq!(roster, vec![Student::new(1, "A", "a"), Student::new(2, "B", "b")]);
    }

    #[test]
    fn test_roster_rejects_non_numeric_id() {
        let err = parse_roster("1,A,a\nx,B,b\n", Path::new("r.csv")).unwrap_err();
        match err {
            ConfigError::MalformedRow { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_roster_rejects_short_row() {
        let err = parse_roster("1,A\n", Path::new("r.csv")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn test_roster_rejects_duplicate_id() {
        let err = parse_roster("7,A,a\n\n7,B,b\n", Path::new("r.csv")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateStudentId { id: 7, line: 3, first_line: 1, .. }
        ));
    }

    #[test]
    fn test_grid_rejects_bad_cell() {
        let err = parse_grid("1,1\n1,2\n", Path::new("g.csv")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_grid_rejects_ragged_rows() {
        let err = parse_grid("1,1,1\n1,1\n", Path::new("g.csv")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RaggedGrid { expected: 3, found: 2, line: 2, .. }
        ));
    }

    #[test]
    fn test_empty_sources_are_legal() {
        assert!(parse_roster("\n\n", Path::new("r.csv")).unwrap().is_empty());
        assert_eq!(parse_grid("", Path::new("g.csv")).unwrap().available_count(), 0);
    }

    #[test]
    fn test_delay_curve_endpoints() {
        let cfg = ShuffleConfig {
            initial_delay_ms: 100,
            max_delay_ms: 1100,
            total_iterations: 11,
        };
        assert_eq!(cfg.delay_for(0), Duration::from_millis(100));
        assert_eq!(cfg.delay_for(10), Duration::from_millis(1100));
        // (5/10)^3 = 0.125 -> 100 + 1000 * 0.125
        assert_eq!(cfg.delay_for(5), Duration::from_millis(225));
    }

    #[test]
    fn test_delay_curve_is_monotonic() {
        let cfg = ShuffleConfig::default();
        let delays: Vec<_> = (0..cfg.total_iterations).map(|i| cfg.delay_for(i)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_single_iteration_uses_initial_delay() {
        let cfg = ShuffleConfig {
            initial_delay_ms: 30,
            max_delay_ms: 900,
            total_iterations: 1,
        };
        assert_eq!(cfg.delay_for(0), Duration::from_millis(30));
    }
}
