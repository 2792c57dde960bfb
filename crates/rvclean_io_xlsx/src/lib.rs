//! `rvclean_io_xlsx` v1:
//! Rust-side XLSX I/O kernel for the export cleaner.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : cell model, specs and options
//! - `util`   : pure helper functions
//! - `reader` : worksheet decoding (calamine)
//! - `writer` : in-memory workbook writer (rust_xlsxwriter)
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_MIME_XLSX, EnumFmtKey, N_LEN_EXCEL_CELL_TEXT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use reader::read_sheet_from_bytes;
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecColumnFormatPlan, SpecSheetGrid, SpecSheetSlice,
    SpecXlsxReadOptions, SpecXlsxReport,
};
pub use util::{plan_sheet_slices, sanitize_sheet_name};
pub use writer::XlsxWriter;
