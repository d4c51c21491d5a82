pub mod coerce;
pub mod error;
pub mod export;
pub mod frequency;
pub mod header;
pub mod import;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod rows;
pub mod schema;
pub mod settings;
pub mod workload;

pub use error::{Result, RowError, SheetError};
