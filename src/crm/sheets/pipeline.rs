use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::crm::sheets::error::{Result, SheetError};
use crate::crm::sheets::export::{build_services_workbook, build_workload_workbook};
use crate::crm::sheets::frequency::FrequencyCodec;
use crate::crm::sheets::import::{
    ClientDirectory, ClientEntry, ClientIndex, Importer, RecordSink, SinkError,
};
use crate::crm::sheets::io::excel_write;
use crate::crm::sheets::model::{CanonicalRecord, ImportOutcome, ImportedRow, SheetKind};
use crate::crm::sheets::settings::ImportSettings;
use crate::crm::sheets::workload::SitePlan;

/// A row accepted by [`CollectingSink`], with the handle it was given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedRow {
    pub handle: String,
    pub row: ImportedRow,
}

/// Record sink that keeps every accepted row in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    created: Vec<CreatedRow>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> &[CreatedRow] {
        &self.created
    }
}

impl RecordSink for CollectingSink {
    fn create(&mut self, row: &ImportedRow) -> std::result::Result<String, SinkError> {
        let handle = Uuid::new_v4().to_string();
        self.created.push(CreatedRow {
            handle: handle.clone(),
            row: row.clone(),
        });
        Ok(handle)
    }
}

/// Imports an xlsx file from disk.
///
/// A missing path is the only `Err`; every other failure, fatal or not, is
/// reported inside the outcome.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), %kind)
)]
pub fn import_file(
    input: &Path,
    kind: SheetKind,
    importer: &Importer,
    clients: &dyn ClientDirectory,
    sink: &mut dyn RecordSink,
) -> Result<ImportOutcome> {
    if !input.exists() {
        return Err(SheetError::MissingInput(input.to_path_buf()));
    }
    let bytes = fs::read(input)?;
    debug!(byte_count = bytes.len(), "read workbook payload");
    Ok(importer.import_bytes(&bytes, kind, clients, sink))
}

/// Loads a JSON array of [`ClientEntry`] into a lookup index.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_clients(path: &Path) -> Result<ClientIndex> {
    let source = fs::read_to_string(path)?;
    let entries: Vec<ClientEntry> = serde_json::from_str(&source)?;
    info!(client_count = entries.len(), "loaded client directory");
    Ok(ClientIndex::new(entries))
}

/// Writes the rows accepted during an import as pretty JSON.
pub fn write_created(path: &Path, created: &[CreatedRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(created)?;
    fs::write(path, json)?;
    Ok(())
}

/// Materialises a JSON array of [`SitePlan`] as the planning workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn export_workload(input: &Path, output: &Path) -> Result<()> {
    let source = fs::read_to_string(input)?;
    let plans: Vec<SitePlan> = serde_json::from_str(&source)?;
    info!(site_count = plans.len(), "parsed site plans");
    let workbook = build_workload_workbook(&plans);
    debug!(sheet_count = workbook.tables.len(), "workbook constructed");
    excel_write::write_workbook(output, &workbook)
}

/// Materialises a JSON array of services records as the services workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn export_services(input: &Path, output: &Path, settings: &ImportSettings) -> Result<()> {
    let source = fs::read_to_string(input)?;
    let records: Vec<CanonicalRecord> = serde_json::from_str(&source)?;
    info!(record_count = records.len(), "parsed services records");
    let workbook = build_services_workbook(&records, &FrequencyCodec::new(settings));
    debug!(sheet_count = workbook.tables.len(), "workbook constructed");
    excel_write::write_workbook(output, &workbook)
}
