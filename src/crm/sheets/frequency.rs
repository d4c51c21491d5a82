//! Recurrence tokens for subcontracted services.
//!
//! A frequency is stored either as a catalog key (`"trimestrielle"`) or as a
//! self-describing custom token (`"interval:months:3"`). Both forms carry
//! enough information to rebuild the interval, the unit and the display label.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crm::sheets::coerce::parse_whole_number;
use crate::crm::sheets::header::normalize_header;
use crate::crm::sheets::settings::ImportSettings;

/// Selection value asking for a custom interval.
pub const CUSTOM_SELECTION: &str = "custom";

const CUSTOM_SELECTION_ALIASES: &[&str] = &[CUSTOM_SELECTION, "personnalise", "personnalisee", "autre"];
const CUSTOM_TOKEN_PREFIX: &str = "interval";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    Months,
    Years,
}

impl FrequencyUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyUnit::Months => "months",
            FrequencyUnit::Years => "years",
        }
    }

    /// Accepts the wire names and their common French/English spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_header(raw).as_str() {
            "months" | "month" | "mois" => Some(FrequencyUnit::Months),
            "years" | "year" | "an" | "ans" | "annee" | "annees" => Some(FrequencyUnit::Years),
            _ => None,
        }
    }

    /// Display word for `count` units: "an"/"ans", "mois" either way.
    pub fn label(self, count: u32) -> &'static str {
        match (self, count) {
            (FrequencyUnit::Months, _) => "mois",
            (FrequencyUnit::Years, 1) => "an",
            (FrequencyUnit::Years, _) => "ans",
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predefined frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyPreset {
    pub key: &'static str,
    pub label: &'static str,
    pub interval: u32,
    pub unit: FrequencyUnit,
}

const CATALOG: &[FrequencyPreset] = &[
    FrequencyPreset {
        key: "mensuelle",
        label: "Mensuelle",
        interval: 1,
        unit: FrequencyUnit::Months,
    },
    FrequencyPreset {
        key: "bimestrielle",
        label: "Bimestrielle",
        interval: 2,
        unit: FrequencyUnit::Months,
    },
    FrequencyPreset {
        key: "trimestrielle",
        label: "Trimestrielle",
        interval: 3,
        unit: FrequencyUnit::Months,
    },
    FrequencyPreset {
        key: "semestrielle",
        label: "Semestrielle",
        interval: 6,
        unit: FrequencyUnit::Months,
    },
    FrequencyPreset {
        key: "annuelle",
        label: "Annuelle",
        interval: 1,
        unit: FrequencyUnit::Years,
    },
    FrequencyPreset {
        key: "biennale",
        label: "Biennale",
        interval: 2,
        unit: FrequencyUnit::Years,
    },
    FrequencyPreset {
        key: "quinquennale",
        label: "Quinquennale",
        interval: 5,
        unit: FrequencyUnit::Years,
    },
];

/// Output of [`FrequencyCodec::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFrequency {
    pub token: String,
    pub interval: u32,
    pub unit: FrequencyUnit,
}

impl From<&FrequencyPreset> for ResolvedFrequency {
    fn from(preset: &FrequencyPreset) -> Self {
        Self {
            token: preset.key.to_string(),
            interval: preset.interval,
            unit: preset.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrequencyError {
    #[error("unknown frequency '{0}'")]
    UnknownSelection(String),

    #[error("custom frequency requires an interval")]
    MissingInterval,

    #[error("custom frequency requires a unit (months or years)")]
    MissingUnit,

    #[error("unknown unit '{0}' (expected months or years)")]
    UnknownUnit(String),

    #[error("interval '{0}' is not an integer")]
    NotAnInteger(String),

    #[error("interval {value} is out of range (1-{max})")]
    OutOfRange { value: i64, max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyCodec {
    max_interval: u32,
}

impl FrequencyCodec {
    pub fn new(settings: &ImportSettings) -> Self {
        Self {
            max_interval: settings.max_custom_interval,
        }
    }

    pub fn catalog() -> &'static [FrequencyPreset] {
        CATALOG
    }

    /// Looks a catalog entry up by key.
    pub fn preset(key: &str) -> Option<&'static FrequencyPreset> {
        let normalized = normalize_header(key);
        CATALOG.iter().find(|preset| preset.key == normalized)
    }

    /// Builds the custom token for an interval/unit pair.
    pub fn encode_custom(interval: u32, unit: FrequencyUnit) -> String {
        format!("{CUSTOM_TOKEN_PREFIX}:{}:{interval}", unit.as_str())
    }

    /// Turns a form selection (catalog key or [`CUSTOM_SELECTION`]) into a token.
    pub fn resolve(
        &self,
        selection: &str,
        custom_interval: Option<&str>,
        custom_unit: Option<&str>,
    ) -> Result<ResolvedFrequency, FrequencyError> {
        if let Some(preset) = Self::preset(selection) {
            return Ok(preset.into());
        }

        let normalized = normalize_header(selection);
        if !CUSTOM_SELECTION_ALIASES.contains(&normalized.as_str()) {
            return Err(FrequencyError::UnknownSelection(selection.trim().to_string()));
        }

        let unit = match custom_unit.map(str::trim).filter(|unit| !unit.is_empty()) {
            None => return Err(FrequencyError::MissingUnit),
            Some(raw) => {
                FrequencyUnit::parse(raw).ok_or_else(|| FrequencyError::UnknownUnit(raw.to_string()))?
            }
        };

        let raw_interval = custom_interval
            .map(str::trim)
            .filter(|interval| !interval.is_empty())
            .ok_or(FrequencyError::MissingInterval)?;
        let value = parse_whole_number(raw_interval)
            .ok_or_else(|| FrequencyError::NotAnInteger(raw_interval.to_string()))?;
        if value < 1 || value > i64::from(self.max_interval) {
            return Err(FrequencyError::OutOfRange {
                value,
                max: self.max_interval,
            });
        }
        let interval = value as u32;

        Ok(ResolvedFrequency {
            token: Self::encode_custom(interval, unit),
            interval,
            unit,
        })
    }

    /// Decodes a custom token. Anything not shaped like one gives `(None, None)`,
    /// including intervals with a sign, a leading zero or above the ceiling.
    pub fn parse(&self, token: &str) -> (Option<u32>, Option<FrequencyUnit>) {
        let mut parts = token.trim().split(':');
        let (Some(prefix), Some(unit), Some(interval), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return (None, None);
        };
        if prefix != CUSTOM_TOKEN_PREFIX {
            return (None, None);
        }
        let unit = match unit {
            "months" => FrequencyUnit::Months,
            "years" => FrequencyUnit::Years,
            _ => return (None, None),
        };
        let canonical = !interval.is_empty()
            && !interval.starts_with('0')
            && interval.bytes().all(|byte| byte.is_ascii_digit());
        if !canonical {
            return (None, None);
        }
        match interval.parse::<u32>() {
            Ok(interval) if interval <= self.max_interval => (Some(interval), Some(unit)),
            _ => (None, None),
        }
    }

    /// Human label for a stored token.
    ///
    /// Catalog keys ignore the hints. Custom tokens use their embedded values;
    /// the hints only matter for a bare token that is not self-describing.
    pub fn label_of(
        &self,
        token: &str,
        interval: Option<u32>,
        unit: Option<FrequencyUnit>,
    ) -> String {
        if let Some(preset) = Self::preset(token) {
            return preset.label.to_string();
        }

        let (interval, unit) = match self.parse(token) {
            (Some(parsed_interval), Some(parsed_unit)) => (Some(parsed_interval), Some(parsed_unit)),
            _ => (interval, unit),
        };

        match (interval, unit) {
            (Some(interval), Some(unit)) if interval > 0 => custom_label(interval, unit),
            _ => token.trim().to_string(),
        }
    }

    /// Reads the frequency columns of a spreadsheet row.
    ///
    /// The selection cell may hold a catalog key, a catalog label, a custom
    /// token or the custom sentinel. With no selection but an interval or a
    /// unit present, the row asks for a custom frequency.
    pub fn interpret(
        &self,
        selection: Option<&str>,
        custom_interval: Option<&str>,
        custom_unit: Option<&str>,
    ) -> Result<Option<ResolvedFrequency>, FrequencyError> {
        let selection = selection.map(str::trim).filter(|value| !value.is_empty());
        let Some(selection) = selection else {
            if custom_interval.is_none() && custom_unit.is_none() {
                return Ok(None);
            }
            return self
                .resolve(CUSTOM_SELECTION, custom_interval, custom_unit)
                .map(Some);
        };

        if let (Some(interval), Some(unit)) = self.parse(selection) {
            let interval = interval.to_string();
            return self
                .resolve(CUSTOM_SELECTION, Some(&interval), Some(unit.as_str()))
                .map(Some);
        }

        let normalized = normalize_header(selection);
        if let Some(preset) = CATALOG
            .iter()
            .find(|preset| normalize_header(preset.label) == normalized)
        {
            return Ok(Some(preset.into()));
        }

        self.resolve(selection, custom_interval, custom_unit)
            .map(Some)
    }
}

fn custom_label(interval: u32, unit: FrequencyUnit) -> String {
    if interval == 1 {
        // "Tous les ans", not "Tous les 1 an".
        format!("Tous les {}", unit.label(2))
    } else {
        format!("Tous les {interval} {}", unit.label(interval))
    }
}
