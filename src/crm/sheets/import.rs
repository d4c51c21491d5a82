//! Batch aggregation: validated rows in, one [`ImportOutcome`] out.
//!
//! Persistence and rendering stay outside this crate. They are reached through
//! [`RecordSink`] (create one entity) and [`ReportSink`] (show the outcome).

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::crm::sheets::error::{Result, RowError};
use crate::crm::sheets::header::normalize_header;
use crate::crm::sheets::io::excel_read;
use crate::crm::sheets::model::{Field, ImportOutcome, ImportedRow, Sheet, SheetKind};
use crate::crm::sheets::rows::validate_sheet;
use crate::crm::sheets::schema::Schemas;
use crate::crm::sheets::settings::ImportSettings;

/// Opaque failure reported by a record sink.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// The record-creation call.
///
/// Returns a handle for the created entity. Any partial state left behind by a
/// failed call is the sink's to roll back.
pub trait RecordSink {
    fn create(&mut self, row: &ImportedRow) -> std::result::Result<String, SinkError>;
}

/// Receives the finished outcome of an import, exactly once.
pub trait ReportSink {
    fn deliver(&mut self, outcome: ImportOutcome);
}

/// A client known to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEntry {
    pub id: String,
    pub company_name: String,
    pub name: String,
}

/// Lookup used to link services rows to existing clients.
pub trait ClientDirectory {
    /// Every client whose name matches, narrowed by company when one is given.
    fn find(&self, company: Option<&str>, client: &str) -> Vec<ClientEntry>;
}

/// In-memory [`ClientDirectory`] comparing names after header normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIndex {
    entries: Vec<ClientEntry>,
}

impl ClientIndex {
    pub fn new(entries: Vec<ClientEntry>) -> Self {
        Self { entries }
    }
}

impl ClientDirectory for ClientIndex {
    fn find(&self, company: Option<&str>, client: &str) -> Vec<ClientEntry> {
        let client = normalize_header(client);
        let company = company.map(normalize_header);
        self.entries
            .iter()
            .filter(|entry| normalize_header(&entry.name) == client)
            .filter(|entry| match &company {
                Some(company) => normalize_header(&entry.company_name) == *company,
                None => true,
            })
            .cloned()
            .collect()
    }
}

/// Runs imports with schemas built once at construction.
#[derive(Debug, Clone)]
pub struct Importer {
    schemas: Schemas,
    settings: ImportSettings,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(ImportSettings::default())
    }
}

impl Importer {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            schemas: Schemas::new(),
            settings,
        }
    }

    /// Imports an already-decoded sheet.
    ///
    /// `Err` only for header failures; every row problem ends up in the
    /// outcome's error list.
    #[instrument(level = "info", skip_all, fields(%kind))]
    pub fn import_sheet(
        &self,
        sheet: &Sheet,
        kind: SheetKind,
        clients: &dyn ClientDirectory,
        sink: &mut dyn RecordSink,
    ) -> Result<ImportOutcome> {
        let rows = validate_sheet(sheet, kind, &self.schemas, &self.settings)?;
        let mut outcome = ImportOutcome {
            total: rows.len(),
            ..ImportOutcome::default()
        };

        for result in rows {
            let created = result
                .and_then(|row| link_client(row, kind, clients))
                .and_then(|row| {
                    sink.create(&row)
                        .map(|handle| (row.row(), handle))
                        .map_err(|error| RowError::new(row.row(), error.to_string()))
                });
            match created {
                Ok((row, handle)) => {
                    debug!(row, %handle, "row created");
                    outcome.created += 1;
                }
                Err(error) => {
                    warn!(row = error.row, message = %error.message, "row rejected");
                    outcome.errors.push(error.to_string());
                }
            }
        }

        info!(
            created = outcome.created,
            total = outcome.total,
            errors = outcome.errors.len(),
            "import finished"
        );
        Ok(outcome)
    }

    /// Imports a workbook payload. Batch-fatal failures come back as an
    /// outcome with a single error and nothing created.
    pub fn import_bytes(
        &self,
        bytes: &[u8],
        kind: SheetKind,
        clients: &dyn ClientDirectory,
        sink: &mut dyn RecordSink,
    ) -> ImportOutcome {
        let result = excel_read::read_first_sheet(bytes)
            .and_then(|sheet| self.import_sheet(&sheet, kind, clients, sink));
        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%kind, %error, "import rejected before reading rows");
                ImportOutcome::fatal(error.to_string())
            }
        }
    }

    /// [`Importer::import_bytes`], then hands the outcome to `report`.
    pub fn import_and_report(
        &self,
        bytes: &[u8],
        kind: SheetKind,
        clients: &dyn ClientDirectory,
        sink: &mut dyn RecordSink,
        report: &mut dyn ReportSink,
    ) {
        let outcome = self.import_bytes(bytes, kind, clients, sink);
        report.deliver(outcome);
    }
}

fn link_client(
    row: ImportedRow,
    kind: SheetKind,
    clients: &dyn ClientDirectory,
) -> std::result::Result<ImportedRow, RowError> {
    let mut record = match row {
        ImportedRow::Record(record) if kind == SheetKind::Services => record,
        other => return Ok(other),
    };

    let client = record.text(Field::Client).unwrap_or_default().to_string();
    let company = record.text(Field::CompanyName).map(str::to_string);
    let matches = clients.find(company.as_deref(), &client);

    match matches.as_slice() {
        [entry] => {
            record.client_id = Some(entry.id.clone());
            Ok(ImportedRow::Record(record))
        }
        [] => {
            let scope = company
                .map(|company| format!(" for company '{company}'"))
                .unwrap_or_default();
            Err(RowError::new(
                record.row,
                format!("client '{client}' not found{scope}"),
            ))
        }
        several => Err(RowError::new(
            record.row,
            format!(
                "client '{client}' is ambiguous ({} matches); add a company column to disambiguate",
                several.len()
            ),
        )),
    }
}
