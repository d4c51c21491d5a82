//! Spreadsheet import and export for the local CRM.
//!
//! Sheets are read with [`crm::sheets::io::excel_read`], their headers mapped
//! onto canonical fields by [`crm::sheets::header`], and each data row checked
//! by [`crm::sheets::rows`]. [`crm::sheets::import`] aggregates a batch into a
//! single outcome and hands accepted rows to the caller's record sink. The
//! planning grid and the services list are written back out through
//! [`crm::sheets::export`].

pub mod crm;

pub use crm::sheets::{
    Result, RowError, SheetError, coerce, error, export, frequency, header, import, io, model,
    pipeline, rows, schema, settings, workload,
};
