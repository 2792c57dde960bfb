//! `rvclean_clean` v1:
//! Multi-file export cleaner: ingest, combine, clean, select and export.
//!
//! Modules:
//! - `conf`      : constants and default option factory
//! - `spec`      : enums, options, messages and errors
//! - `table`     : row-oriented table model
//! - `report`    : ingest/clean report models
//! - `util`      : pure text/date/file-name helpers
//! - `ingest`    : per-file readers, schema check, combine
//! - `pipeline`  : fixed cleaning steps
//! - `selection` : column check state and display names
//! - `export`    : XLSX serialization
//! - `session`   : interactive session state machine

pub mod conf;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod selection;
pub mod session;
pub mod spec;
pub mod table;
pub mod util;

pub use conf::derive_default_clean_options;
pub use export::export_table_to_xlsx;
pub use ingest::{SpecIngestOutcome, combine_tables, ingest_uploads, read_upload};
pub use pipeline::clean_table;
pub use report::{ReportClean, ReportIngest, ReportIngestBuilder};
pub use rvclean_io_xlsx::EnumCellValue;
pub use selection::ColumnSelection;
pub use session::{EnumSessionAction, Session, SpecRenderView};
pub use spec::{
    CleanError, EnumCleanStep, EnumFileKind, EnumMessageLevel, SpecCleanOptions,
    SpecColumnControl, SpecColumnState, SpecExportArtifact, SpecFileRowCount, SpecIngestError,
    SpecMessage, SpecRawFileResult, SpecSentimentLabel, SpecUpload,
};
pub use table::Table;
