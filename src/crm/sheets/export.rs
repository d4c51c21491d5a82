//! Builds the in-memory tables written by [`excel_write`](crate::crm::sheets::io::excel_write).
//!
//! Every export carries one data sheet and a legend sheet documenting the
//! workload tokens and the frequency catalog.

use crate::crm::sheets::frequency::{FrequencyCodec, FrequencyUnit};
use crate::crm::sheets::model::{CanonicalRecord, Field, Scalar};
use crate::crm::sheets::workload::{SitePlan, WORKLOAD_DAYS, encode_for_export};

/// Sheet name of the planning grid.
pub const WORKLOAD_SHEET: &str = "Charge";
/// Sheet name of the services list.
pub const SERVICES_SHEET: &str = "Prestations";
/// Sheet name of the legend.
pub const LEGEND_SHEET: &str = "Légende";

/// A cell value in an exported sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Blank,
    Text(String),
    Number(f64),
}

impl From<&str> for ExportValue {
    fn from(value: &str) -> Self {
        ExportValue::Text(value.to_string())
    }
}

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ExportValue>>,
    /// Leading columns kept visible while scrolling horizontally.
    pub frozen_columns: u16,
    pub autofilter: bool,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// Planning grid: one row per site, one column per day.
pub fn build_workload_workbook(plans: &[SitePlan]) -> WorkbookData {
    let mut columns = Vec::with_capacity(WORKLOAD_DAYS + 1);
    columns.push("Site".to_string());
    columns.extend((1..=WORKLOAD_DAYS).map(|day| format!("J{day}")));

    let rows = plans
        .iter()
        .map(|plan| {
            let mut cells = Vec::with_capacity(WORKLOAD_DAYS + 1);
            cells.push(ExportValue::Text(plan.name.clone()));
            cells.extend((0..WORKLOAD_DAYS).map(|day| encode_for_export(&plan.cell(day))));
            cells
        })
        .collect();

    let grid = SheetTable {
        sheet_name: WORKLOAD_SHEET.to_string(),
        columns,
        rows,
        frozen_columns: 1,
        autofilter: false,
    };

    WorkbookData {
        tables: vec![grid, legend_table()],
    }
}

const SERVICE_COLUMNS: &[(&str, Option<Field>)] = &[
    ("Entreprise", Some(Field::CompanyName)),
    ("Client", Some(Field::Client)),
    ("Prestation", Some(Field::Prestation)),
    ("Catégorie", Some(Field::Category)),
    ("Code budgétaire", Some(Field::BudgetCode)),
    ("Fréquence", Some(Field::Frequency)),
    ("Libellé fréquence", None),
    ("Montant", Some(Field::Amount)),
    ("Statut", Some(Field::Status)),
];

/// Services list with the frequency token and its readable label side by side.
pub fn build_services_workbook(
    records: &[CanonicalRecord],
    frequencies: &FrequencyCodec,
) -> WorkbookData {
    let columns = SERVICE_COLUMNS
        .iter()
        .map(|(header, _)| header.to_string())
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            SERVICE_COLUMNS
                .iter()
                .map(|(_, field)| match field {
                    Some(field) => scalar_to_export(record.get(*field)),
                    None => frequency_label(record, frequencies),
                })
                .collect()
        })
        .collect();

    let services = SheetTable {
        sheet_name: SERVICES_SHEET.to_string(),
        columns,
        rows,
        frozen_columns: 0,
        autofilter: true,
    };

    WorkbookData {
        tables: vec![services, legend_table()],
    }
}

fn frequency_label(record: &CanonicalRecord, frequencies: &FrequencyCodec) -> ExportValue {
    let Some(token) = record.text(Field::Frequency) else {
        return ExportValue::Blank;
    };
    let interval = record
        .get(Field::FrequencyInterval)
        .and_then(Scalar::as_integer)
        .and_then(|value| u32::try_from(value).ok());
    let unit = record
        .text(Field::FrequencyUnit)
        .and_then(FrequencyUnit::parse);
    ExportValue::Text(frequencies.label_of(token, interval, unit))
}

fn scalar_to_export(value: Option<&Scalar>) -> ExportValue {
    match value {
        None => ExportValue::Blank,
        Some(Scalar::Text(value)) => ExportValue::Text(value.clone()),
        Some(Scalar::Integer(value)) => ExportValue::Number(*value as f64),
        Some(Scalar::Decimal(value)) => ExportValue::Number(*value),
        Some(Scalar::Flag(value)) => ExportValue::from(if *value { "oui" } else { "non" }),
    }
}

/// Legend: the four workload token shapes, then every frequency catalog entry.
pub fn legend_table() -> SheetTable {
    let mut rows = vec![
        vec![
            ExportValue::Number(8.0),
            ExportValue::from("bad : journée surchargée (8 h)"),
        ],
        vec![
            ExportValue::Number(4.0),
            ExportValue::from("warn : journée chargée (4 h)"),
        ],
        vec![
            ExportValue::from("ok"),
            ExportValue::from("ok : journée planifiée, heures non précisées"),
        ],
        vec![
            ExportValue::from("ok:6"),
            ExportValue::from("ok:<heures> : journée planifiée avec son nombre d'heures"),
        ],
    ];

    rows.extend(
        FrequencyCodec::catalog()
            .iter()
            .map(|preset| vec![ExportValue::from(preset.key), ExportValue::from(preset.label)]),
    );

    SheetTable {
        sheet_name: LEGEND_SHEET.to_string(),
        columns: vec!["Valeur".to_string(), "Signification".to_string()],
        rows,
        frozen_columns: 0,
        autofilter: false,
    }
}
