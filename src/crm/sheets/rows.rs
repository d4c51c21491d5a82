//! Row validation: turns the data rows of one sheet into canonical records.
//!
//! Header problems abort the whole sheet (see [`validate_sheet`]); everything
//! after that is reported per row and never stops the remaining rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::crm::sheets::coerce::{ValueCoercer, cell_text};
use crate::crm::sheets::error::{Result, RowError, SheetError};
use crate::crm::sheets::frequency::FrequencyCodec;
use crate::crm::sheets::header::{HeaderResolution, ResolvedHeaders, normalize_header};
use crate::crm::sheets::model::{
    CanonicalRecord, ContactField, ContactRecord, Field, ImportedRow, RawCell, Scalar, Sheet,
    SheetKind,
};
use crate::crm::sheets::schema::{PrestationCatalog, Schemas, SheetSchema};
use crate::crm::sheets::settings::ImportSettings;
use crate::crm::sheets::workload::{self, SitePlan, WORKLOAD_DAYS};

/// Outcome of validating a single data row.
pub type RowResult = std::result::Result<ImportedRow, RowError>;

const SEWN_FILTER_TYPE: &str = "cousus_sur_fil";

/// Validates every data row of `sheet`.
///
/// Blank rows are skipped. The only `Err` is a header failure; row problems
/// come back as `Err` entries in the returned list.
pub fn validate_sheet(
    sheet: &Sheet,
    kind: SheetKind,
    schemas: &Schemas,
    settings: &ImportSettings,
) -> Result<Vec<RowResult>> {
    let header = sheet.header().ok_or(SheetError::EmptyWorkbook)?;
    let schema = schemas.schema(kind);
    let headers = ResolvedHeaders::resolve(schema, header)?;
    debug!(%kind, columns = headers.width(), "headers resolved");

    if kind == SheetKind::Workload {
        return Ok(validate_workload_rows(sheet, &headers));
    }

    let validator = RecordValidator {
        schema,
        headers: &headers,
        coercer: ValueCoercer::new(settings),
        frequencies: FrequencyCodec::new(settings),
        prestations: schemas.prestations(),
    };

    Ok(sheet
        .data_rows()
        .filter_map(|(row, cells)| validator.validate(row, cells))
        .map(|result| result.map(ImportedRow::Record))
        .collect())
}

struct RecordValidator<'a> {
    schema: &'a SheetSchema,
    headers: &'a ResolvedHeaders,
    coercer: ValueCoercer,
    frequencies: FrequencyCodec,
    prestations: &'a PrestationCatalog,
}

#[derive(Debug, Default)]
struct ContactDraft {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl<'a> RecordValidator<'a> {
    /// `None` when every mapped cell of the row is blank.
    fn validate(
        &self,
        row: usize,
        cells: &[RawCell],
    ) -> Option<std::result::Result<CanonicalRecord, RowError>> {
        let populated = cells.iter().enumerate().any(|(index, cell)| {
            self.headers.column(index) != HeaderResolution::Unresolved && !cell.is_blank()
        });
        if !populated {
            return None;
        }
        Some(
            self.build(row, cells)
                .map_err(|messages| RowError::new(row, messages.join("; "))),
        )
    }

    fn build(
        &self,
        row: usize,
        cells: &[RawCell],
    ) -> std::result::Result<CanonicalRecord, Vec<String>> {
        let mut record = CanonicalRecord::new(row);
        let mut contacts: BTreeMap<u32, ContactDraft> = BTreeMap::new();
        let mut errors = Vec::new();

        for (index, cell) in cells.iter().enumerate() {
            match self.headers.column(index) {
                HeaderResolution::Unresolved => {}
                HeaderResolution::Direct(field) => {
                    let kind = self.schema.field_kind(field);
                    match self.coercer.coerce(field.as_str(), kind, cell) {
                        Ok(Some(value)) => record.insert(field, value),
                        Ok(None) => {}
                        Err(error) => errors.push(error.to_string()),
                    }
                }
                HeaderResolution::Grouped {
                    group,
                    index: slot,
                    subfield,
                } => {
                    let label = format!("{group} {slot}");
                    match self.coercer.coerce(&label, None, cell) {
                        Ok(Some(value)) => {
                            let draft = contacts.entry(slot).or_default();
                            let text = Some(value.to_string());
                            match subfield {
                                ContactField::Name => draft.name = text,
                                ContactField::Email => draft.email = text,
                                ContactField::Phone => draft.phone = text,
                            }
                        }
                        Ok(None) => {}
                        Err(error) => errors.push(error.to_string()),
                    }
                }
            }
        }

        let missing: Vec<&str> = self
            .schema
            .required()
            .iter()
            .filter(|field| !record.contains(**field))
            .map(|field| field.as_str())
            .collect();
        if !missing.is_empty() {
            errors.push(format!("missing value for {}", missing.join(", ")));
        }

        for (slot, draft) in contacts {
            match draft.name {
                Some(name) => record.contacts.push(ContactRecord {
                    name,
                    email: draft.email,
                    phone: draft.phone,
                }),
                None => errors.push(format!("contact {slot} has an email or phone but no name")),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        match self.schema.kind {
            SheetKind::Services => self.finish_service(&mut record)?,
            SheetKind::Parts => finish_part(&mut record),
            SheetKind::Clients | SheetKind::Workload => {}
        }

        Ok(record)
    }

    fn finish_service(&self, record: &mut CanonicalRecord) -> std::result::Result<(), Vec<String>> {
        let selection = record.remove(Field::Frequency).map(|value| value.to_string());
        let interval = record
            .remove(Field::FrequencyInterval)
            .map(|value| value.to_string());
        let unit = record.remove(Field::FrequencyUnit).map(|value| value.to_string());

        let resolved = self
            .frequencies
            .interpret(selection.as_deref(), interval.as_deref(), unit.as_deref())
            .map_err(|error| vec![format!("invalid frequency: {error}")])?;
        if let Some(frequency) = resolved {
            record.insert(Field::Frequency, Scalar::Text(frequency.token));
            record.insert(
                Field::FrequencyInterval,
                Scalar::Integer(i64::from(frequency.interval)),
            );
            record.insert(
                Field::FrequencyUnit,
                Scalar::Text(frequency.unit.as_str().to_string()),
            );
        }

        let definition = record
            .text(Field::Prestation)
            .and_then(|prestation| self.prestations.find(prestation))
            .cloned();
        if let Some(definition) = definition {
            record.insert(Field::Prestation, Scalar::Text(definition.label.to_string()));
            if !record.contains(Field::Category) {
                record.insert(Field::Category, Scalar::Text(definition.category.to_string()));
            }
            if !record.contains(Field::BudgetCode) {
                record.insert(
                    Field::BudgetCode,
                    Scalar::Text(definition.budget_code.to_string()),
                );
            }
        }

        Ok(())
    }
}

fn finish_part(record: &mut CanonicalRecord) {
    if !record.contains(Field::Quantity) {
        record.insert(Field::Quantity, Scalar::Integer(1));
    }

    let sewn = record
        .text(Field::FilterType)
        .is_some_and(|filter_type| normalize_header(filter_type) == SEWN_FILTER_TYPE);
    if let Some(dimensions) = record.text(Field::Dimensions) {
        let normalized = normalize_dimensions(dimensions, sewn);
        record.insert(Field::Dimensions, Scalar::Text(normalized));
    }
}

fn dimension_number_re() -> &'static Regex {
    static DIMENSION_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    DIMENSION_NUMBER_RE
        .get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid dimension number regex"))
}

/// `"592x592 x 360"` becomes `"592 x 592 x 360"`; sewn filters only keep two sides.
pub fn normalize_dimensions(raw: &str, sewn: bool) -> String {
    let numbers: Vec<&str> = dimension_number_re()
        .find_iter(raw)
        .map(|found| found.as_str())
        .collect();
    let wanted = if sewn { 2 } else { 3 };
    if numbers.len() >= wanted {
        numbers[..wanted].join(" x ")
    } else {
        raw.trim().to_string()
    }
}

fn validate_workload_rows(sheet: &Sheet, headers: &ResolvedHeaders) -> Vec<RowResult> {
    // Required-column check guarantees a site column.
    let site_column = headers.position(Field::Site).unwrap_or(0);
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut results = Vec::new();

    for (row, cells) in sheet.data_rows() {
        if cells.iter().all(RawCell::is_blank) {
            continue;
        }

        let name = cells
            .get(site_column)
            .map(cell_text)
            .unwrap_or_default()
            .trim()
            .to_string();
        if name.is_empty() {
            results.push(Err(RowError::new(row, "missing value for site")));
            continue;
        }
        if let Some(first_row) = seen.get(&name) {
            results.push(Err(RowError::new(
                row,
                format!("duplicate site '{name}' (already on row {first_row})"),
            )));
            continue;
        }

        let mut plan = SitePlan::new(row, name.clone());
        let mut errors = Vec::new();
        for (column, cell) in cells.iter().enumerate().skip(site_column + 1) {
            let day = column - site_column - 1;
            if day >= WORKLOAD_DAYS {
                break;
            }
            match workload::decode(cell) {
                Ok(state) => plan.set(day, state),
                Err(error) => errors.push(format!(
                    "column {} (day {}): {error}",
                    column_name(column),
                    day + 1
                )),
            }
        }

        if errors.is_empty() {
            seen.insert(name, row);
            results.push(Ok(ImportedRow::Site(plan)));
        } else {
            results.push(Err(RowError::new(row, errors.join("; "))));
        }
    }

    results
}

/// Spreadsheet letter for a 0-based column index (`0` is `A`, `26` is `AA`).
pub fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        name.push(b'A' + rem as u8);
        remaining = (remaining - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}
