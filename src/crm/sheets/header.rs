//! Header resolution: raw header cells to canonical fields.
//!
//! Header text is normalized (case, accents, separators) before it is looked up
//! in the sheet's alias table. Columns shaped like `contact_<n>_<subfield>` are
//! routed to the schema's repeated group instead.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization as _;
use unicode_normalization::char::is_combining_mark;

use crate::crm::sheets::coerce::cell_text;
use crate::crm::sheets::error::{Result, SheetError};
use crate::crm::sheets::model::{ContactField, Field, RawCell};
use crate::crm::sheets::schema::SheetSchema;

/// What a single header cell resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderResolution {
    Direct(Field),
    Grouped {
        group: &'static str,
        index: u32,
        subfield: ContactField,
    },
    Unresolved,
}

/// Lower-cases, strips diacritics, and joins words with underscores.
///
/// `"Nom d'Entreprise"` becomes `"nom_d_entreprise"`.
pub fn normalize_header(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .to_lowercase()
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect();

    stripped
        .split(|ch: char| ch.is_whitespace() || matches!(ch, '-' | '.' | '\'' | '\u{2019}'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn grouped_header_re() -> &'static Regex {
    static GROUPED_HEADER_RE: OnceLock<Regex> = OnceLock::new();
    GROUPED_HEADER_RE.get_or_init(|| {
        Regex::new(r"^([a-z]+)_(\d+)_([a-z0-9_]+)$").expect("valid grouped header regex")
    })
}

/// Resolves one raw header against the schema's alias tables.
pub fn resolve_header(schema: &SheetSchema, raw: &str) -> HeaderResolution {
    let normalized = normalize_header(raw);
    if normalized.is_empty() {
        return HeaderResolution::Unresolved;
    }

    if let Some(field) = schema.field_for(&normalized) {
        return HeaderResolution::Direct(field);
    }

    let Some(group) = schema.group() else {
        return HeaderResolution::Unresolved;
    };
    let Some(captures) = grouped_header_re().captures(&normalized) else {
        return HeaderResolution::Unresolved;
    };
    if &captures[1] != group.name {
        return HeaderResolution::Unresolved;
    }
    let index = match captures[2].parse::<u32>() {
        Ok(index) if index > 0 => index,
        _ => return HeaderResolution::Unresolved,
    };
    match group.subfield_for(&captures[3]) {
        Some(subfield) => HeaderResolution::Grouped {
            group: group.name,
            index,
            subfield,
        },
        None => HeaderResolution::Unresolved,
    }
}

/// Header row of a sheet, resolved column by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeaders {
    columns: Vec<HeaderResolution>,
}

impl ResolvedHeaders {
    /// Resolves a header row and enforces the sheet-level checks.
    ///
    /// Fails when nothing resolves or when a required field has no column.
    pub fn resolve(schema: &SheetSchema, header_row: &[RawCell]) -> Result<Self> {
        let columns: Vec<HeaderResolution> = header_row
            .iter()
            .map(|cell| resolve_header(schema, &cell_text(cell)))
            .collect();

        if columns
            .iter()
            .all(|column| *column == HeaderResolution::Unresolved)
        {
            return Err(SheetError::NoValidHeaders);
        }

        let present: BTreeSet<Field> = columns
            .iter()
            .filter_map(|column| match column {
                HeaderResolution::Direct(field) => Some(*field),
                _ => None,
            })
            .collect();

        let mut missing: Vec<String> = schema
            .required()
            .iter()
            .filter(|field| !present.contains(field))
            .map(|field| field.as_str().to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(SheetError::MissingColumns(missing));
        }

        Ok(Self { columns })
    }

    /// Resolution of the column at `index`; columns past the header are unresolved.
    pub fn column(&self, index: usize) -> HeaderResolution {
        self.columns
            .get(index)
            .copied()
            .unwrap_or(HeaderResolution::Unresolved)
    }

    /// Index of the first column mapped to `field`.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| *column == HeaderResolution::Direct(field))
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}
