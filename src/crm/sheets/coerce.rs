use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::crm::sheets::header::normalize_header;
use crate::crm::sheets::model::{RawCell, Scalar};
use crate::crm::sheets::schema::FieldKind;
use crate::crm::sheets::settings::ImportSettings;

const TRUE_ALIASES: &[&str] = &["oui", "yes", "true", "1"];
const FALSE_ALIASES: &[&str] = &["non", "no", "false", "0"];

/// A cell value that does not fit its field. The message always carries the
/// field name and the raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("invalid value '{value}' for {field} (expected one of: {expected})")]
    InvalidChoice {
        field: String,
        value: String,
        expected: String,
    },

    #[error("invalid value '{value}' for {field} (expected oui/non, yes/no, true/false or 1/0)")]
    InvalidFlag { field: String, value: String },

    #[error("invalid {field} '{value}' (expected a whole number of at least 1)")]
    InvalidQuantity { field: String, value: String },

    #[error("invalid week code '{value}' for {field} (expected a week between {min} and {max}, e.g. S12)")]
    InvalidWeek {
        field: String,
        value: String,
        min: u32,
        max: u32,
    },

    #[error("invalid number '{value}' for {field}")]
    InvalidNumber { field: String, value: String },
}

/// Renders a number the way a person would type it: `3.0` as `3`, `2.50` as `2.5`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Parses a decimal that may use a comma separator or digit grouping spaces.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses an integer, accepting a float spelling with no fractional part (`"3.0"`).
pub fn parse_whole_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    parse_decimal(trimmed)
        .filter(|value| value.fract() == 0.0 && value.abs() < 9.0e15)
        .map(|value| value as i64)
}

/// Text form of any cell, untrimmed; numbers go through [`format_number`].
pub fn cell_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Blank => String::new(),
        RawCell::Text(value) => value.clone(),
        RawCell::Number(value) => format_number(*value),
        RawCell::Bool(value) => value.to_string(),
    }
}

fn week_code_re() -> &'static Regex {
    static WEEK_CODE_RE: OnceLock<Regex> = OnceLock::new();
    WEEK_CODE_RE.get_or_init(|| {
        Regex::new(r"^(?:\d{4}\s*[-/ ]?\s*)?[SW]?\s*(\d{1,2})$").expect("valid week code regex")
    })
}

/// Turns raw cells into canonical scalars according to a [`FieldKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueCoercer {
    min_week: u32,
    max_week: u32,
}

impl ValueCoercer {
    pub fn new(settings: &ImportSettings) -> Self {
        Self {
            min_week: settings.min_week,
            max_week: settings.max_week,
        }
    }

    /// Coerces one cell. Blank cells yield `Ok(None)`; `kind` of `None` means
    /// plain text.
    pub fn coerce(
        &self,
        field: &str,
        kind: Option<&FieldKind>,
        raw: &RawCell,
    ) -> Result<Option<Scalar>, CoerceError> {
        if raw.is_blank() {
            return Ok(None);
        }

        let text = cell_text(raw).trim().to_string();
        let scalar = match kind {
            None | Some(FieldKind::Text) => Scalar::Text(text),
            Some(FieldKind::Choice(choices)) => {
                let normalized = normalize_header(&text);
                match choices.canonical(&normalized) {
                    Some(value) => Scalar::Text(value.to_string()),
                    None => {
                        return Err(CoerceError::InvalidChoice {
                            field: field.to_string(),
                            value: text,
                            expected: choices.legal().join(", "),
                        });
                    }
                }
            }
            Some(FieldKind::WeekCode) => Scalar::Text(self.week_code(field, &text)?),
            Some(FieldKind::Flag) => Scalar::Flag(coerce_flag(field, raw, &text)?),
            Some(FieldKind::Quantity) => Scalar::Integer(coerce_quantity(field, raw, &text)?),
            Some(FieldKind::Decimal) => {
                let value = match raw {
                    RawCell::Number(value) => Some(*value),
                    _ => parse_decimal(&text),
                };
                match value {
                    Some(value) => Scalar::Decimal(value),
                    None => {
                        return Err(CoerceError::InvalidNumber {
                            field: field.to_string(),
                            value: text,
                        });
                    }
                }
            }
        };

        Ok(Some(scalar))
    }

    fn week_code(&self, field: &str, text: &str) -> Result<String, CoerceError> {
        let upper = text.trim().to_uppercase();
        let week = week_code_re()
            .captures(&upper)
            .and_then(|captures| captures[1].parse::<u32>().ok());
        match week {
            Some(week) if (self.min_week..=self.max_week).contains(&week) => Ok(upper),
            _ => Err(CoerceError::InvalidWeek {
                field: field.to_string(),
                value: text.to_string(),
                min: self.min_week,
                max: self.max_week,
            }),
        }
    }
}

fn coerce_flag(field: &str, raw: &RawCell, text: &str) -> Result<bool, CoerceError> {
    if let RawCell::Bool(value) = raw {
        return Ok(*value);
    }
    let normalized = normalize_header(text);
    if TRUE_ALIASES.contains(&normalized.as_str()) {
        Ok(true)
    } else if FALSE_ALIASES.contains(&normalized.as_str()) {
        Ok(false)
    } else {
        Err(CoerceError::InvalidFlag {
            field: field.to_string(),
            value: text.to_string(),
        })
    }
}

fn coerce_quantity(field: &str, raw: &RawCell, text: &str) -> Result<i64, CoerceError> {
    let value = match raw {
        RawCell::Number(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
            Some(*value as i64)
        }
        RawCell::Number(_) | RawCell::Bool(_) => None,
        _ => parse_whole_number(text),
    };
    match value {
        Some(value) if value >= 1 => Ok(value),
        _ => Err(CoerceError::InvalidQuantity {
            field: field.to_string(),
            value: text.to_string(),
        }),
    }
}
