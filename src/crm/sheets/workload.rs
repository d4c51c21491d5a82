//! Per-day workload markers for the site planning grid.
//!
//! The wire alphabet is `""`, `"warn"`, `"bad"`, `"ok"` and `"ok:<hours>"`.
//! Internally a cell is always a [`WorkloadCell`]; strings only exist at the
//! decode/encode boundary.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::crm::sheets::coerce::{format_number, parse_decimal};
use crate::crm::sheets::export::ExportValue;
use crate::crm::sheets::header::normalize_header;
use crate::crm::sheets::model::RawCell;

/// Number of day slots in a site calendar (day 0 to day 363).
pub const WORKLOAD_DAYS: usize = 364;

const WARN_HOURS: f64 = 4.0;
const BAD_HOURS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WorkloadCell {
    #[default]
    Empty,
    Warn,
    Bad,
    Ok(Option<f64>),
}

impl WorkloadCell {
    /// Canonical state for a plain hour count: 4 is `warn`, 8 is `bad`.
    pub fn from_hours(hours: f64) -> Self {
        let hours = round_hours(hours);
        if hours == WARN_HOURS {
            WorkloadCell::Warn
        } else if hours == BAD_HOURS {
            WorkloadCell::Bad
        } else {
            WorkloadCell::Ok(Some(hours))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, WorkloadCell::Empty)
    }

    /// Wire token for the cell.
    pub fn token(&self) -> String {
        match self {
            WorkloadCell::Empty => String::new(),
            WorkloadCell::Warn => "warn".to_string(),
            WorkloadCell::Bad => "bad".to_string(),
            WorkloadCell::Ok(None) => "ok".to_string(),
            WorkloadCell::Ok(Some(hours)) => format!("ok:{}", format_number(*hours)),
        }
    }
}

impl fmt::Display for WorkloadCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl Serialize for WorkloadCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for WorkloadCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode_text(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkloadError {
    #[error("invalid workload value '{0}' (expected ok, warn, bad, a number of hours or ok:<hours>)")]
    Invalid(String),

    #[error("workload hours must be positive, got '{0}'")]
    NonPositive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ok,
    Warn,
    Bad,
}

fn alias_state(normalized: &str) -> Option<State> {
    match normalized {
        "ok" | "vert" | "green" => Some(State::Ok),
        "warn" | "orange" | "attention" => Some(State::Warn),
        "bad" | "rouge" | "red" => Some(State::Bad),
        _ => None,
    }
}

fn round_hours(hours: f64) -> f64 {
    (hours * 10_000.0).round() / 10_000.0
}

/// Decodes one spreadsheet cell into a workload state.
pub fn decode(raw: &RawCell) -> Result<WorkloadCell, WorkloadError> {
    match raw {
        RawCell::Blank => Ok(WorkloadCell::Empty),
        RawCell::Number(hours) => decode_hours(*hours, &format_number(*hours)),
        RawCell::Bool(value) => Err(WorkloadError::Invalid(value.to_string())),
        RawCell::Text(text) => decode_text(text),
    }
}

fn decode_hours(hours: f64, original: &str) -> Result<WorkloadCell, WorkloadError> {
    if hours.is_nan() || hours < 0.0 {
        return Err(WorkloadError::NonPositive(original.to_string()));
    }
    let rounded = round_hours(hours);
    if !rounded.is_finite() {
        return Err(WorkloadError::Invalid(original.to_string()));
    }
    if rounded == 0.0 {
        return Ok(WorkloadCell::Empty);
    }
    Ok(WorkloadCell::from_hours(rounded))
}

fn decode_text(text: &str) -> Result<WorkloadCell, WorkloadError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(WorkloadCell::Empty);
    }

    if let Some(hours) = parse_decimal(trimmed) {
        return decode_hours(hours, trimmed);
    }

    let lower = trimmed.to_lowercase();
    if let Some(hours) = lower.strip_suffix('h').and_then(parse_decimal) {
        return decode_hours(hours, trimmed);
    }

    if let Some((alias, payload)) = lower.split_once(':') {
        let state = alias_state(&normalize_header(alias))
            .ok_or_else(|| WorkloadError::Invalid(trimmed.to_string()))?;
        let payload = payload.trim();
        let hours = parse_decimal(payload.strip_suffix('h').unwrap_or(payload))
            .map(round_hours)
            .filter(|hours| hours.is_finite())
            .ok_or_else(|| WorkloadError::Invalid(trimmed.to_string()))?;
        if hours <= 0.0 {
            return Err(WorkloadError::NonPositive(trimmed.to_string()));
        }
        // Only the ok family carries an hour payload.
        return Ok(match state {
            State::Ok => WorkloadCell::Ok(Some(hours)),
            State::Warn => WorkloadCell::Warn,
            State::Bad => WorkloadCell::Bad,
        });
    }

    match alias_state(&normalize_header(trimmed)) {
        Some(State::Ok) => Ok(WorkloadCell::Ok(None)),
        Some(State::Warn) => Ok(WorkloadCell::Warn),
        Some(State::Bad) => Ok(WorkloadCell::Bad),
        None => Err(WorkloadError::Invalid(trimmed.to_string())),
    }
}

/// Value written to the export sheet: `bad` as 8, `warn` as 4, the rest as text.
pub fn encode_for_export(cell: &WorkloadCell) -> ExportValue {
    match cell {
        WorkloadCell::Bad => ExportValue::Number(BAD_HOURS),
        WorkloadCell::Warn => ExportValue::Number(WARN_HOURS),
        WorkloadCell::Empty => ExportValue::Blank,
        other => ExportValue::Text(other.token()),
    }
}

/// One site's row of the planning grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePlan {
    /// 1-based source row; zero for plans that did not come from a sheet.
    #[serde(default)]
    pub row: usize,
    pub name: String,
    #[serde(default)]
    pub cells: Vec<WorkloadCell>,
}

impl SitePlan {
    /// A plan with every day empty.
    pub fn new(row: usize, name: impl Into<String>) -> Self {
        Self {
            row,
            name: name.into(),
            cells: vec![WorkloadCell::Empty; WORKLOAD_DAYS],
        }
    }

    /// State of `day`, empty when the day is outside the calendar.
    pub fn cell(&self, day: usize) -> WorkloadCell {
        self.cells.get(day).copied().unwrap_or_default()
    }

    /// Sets `day`; days outside the calendar are ignored.
    pub fn set(&mut self, day: usize, cell: WorkloadCell) {
        if day >= WORKLOAD_DAYS {
            return;
        }
        if self.cells.len() < WORKLOAD_DAYS {
            self.cells.resize(WORKLOAD_DAYS, WorkloadCell::Empty);
        }
        self.cells[day] = cell;
    }

    /// Days holding a non-empty state.
    pub fn filled_days(&self) -> usize {
        self.cells
            .iter()
            .take(WORKLOAD_DAYS)
            .filter(|cell| !cell.is_empty())
            .count()
    }
}
