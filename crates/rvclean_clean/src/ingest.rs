//! Upload ingest: per-file parsing, schema check and concatenation.

use std::collections::BTreeSet;
use std::io::Cursor;

use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, SerReader};
use rvclean_io_xlsx::{EnumCellValue, SpecXlsxReadOptions, read_sheet_from_bytes};
use tracing::{debug, error, info, warn};

use crate::report::{ReportIngest, ReportIngestBuilder};
use crate::spec::{CleanError, EnumFileKind, SpecRawFileResult, SpecUpload};
use crate::table::Table;
use crate::util::derive_file_kind;

const C_UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
/// Suffix polars appends to repeated CSV header names.
const C_CSV_DUPLICATE_MARK: &str = "_duplicated_";
/// Largest integer magnitude an `f64` holds exactly (2^53).
const N_F64_INT_EXACT_MAX: u64 = 1 << 53;

/// Report plus accepted tables (upload order, reference column order).
#[derive(Debug, Clone)]
pub struct SpecIngestOutcome {
    pub report: ReportIngest,
    pub tables_accepted: Vec<Table>,
}

////////////////////////////////////////////////////////////////////////////////
// #region Readers

/// Parse one upload with the reader its extension selects.
///
/// Returns `None` for unsupported extensions.
pub fn read_upload(upload: &SpecUpload) -> Option<SpecRawFileResult> {
    let kind = derive_file_kind(&upload.file_name)?;
    let outcome = match kind {
        EnumFileKind::Csv => read_csv_bytes(&upload.bytes),
        EnumFileKind::Workbook => read_workbook_bytes(&upload.bytes),
    };
    Some(SpecRawFileResult {
        file_name: upload.file_name.clone(),
        outcome,
    })
}

/// Parse CSV bytes (header row, schema inferred over every row).
pub fn read_csv_bytes(v_bytes: &[u8]) -> Result<Table, String> {
    let v_bytes = v_bytes.strip_prefix(C_UTF8_BOM).unwrap_or(v_bytes);
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(v_bytes.to_vec()))
        .finish()
        .map_err(|err| err.to_string())?;
    let (columns, rows) = derive_table_from_dataframe(&df)?.into_parts();
    Table::new(restore_repeated_header(columns), rows).map_err(|err| err.to_string())
}

/// Parse the first worksheet of `.xlsx`/`.xls` bytes.
pub fn read_workbook_bytes(v_bytes: &[u8]) -> Result<Table, String> {
    let grid = read_sheet_from_bytes(v_bytes, &SpecXlsxReadOptions::default())?;
    debug!(sheet = %grid.sheet_name, rows = grid.rows.len(), "read worksheet");
    let columns = derive_unique_header(grid.columns);
    Table::new(columns, grid.rows).map_err(|err| err.to_string())
}

fn derive_table_from_dataframe(df: &DataFrame) -> Result<Table, String> {
    let columns: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut row = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            let value = col
                .get(n_idx_row)
                .map_err(|err| format!("Failed to access cell value: {err}"))?;
            row.push(derive_cell_value_from_any_value(value));
        }
        rows.push(row);
    }
    Table::new(columns, rows).map_err(|err| err.to_string())
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        // Ids past 2^53 would be rounded as numbers.
        AnyValue::UInt64(val) if val > N_F64_INT_EXACT_MAX => {
            EnumCellValue::String(val.to_string())
        }
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) if val.unsigned_abs() > N_F64_INT_EXACT_MAX => {
            EnumCellValue::String(val.to_string())
        }
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

/// Map polars' `<name>_duplicated_<n>` CSV headers back to `<name>`, then
/// suffix repeats the same way worksheet headers are.
fn restore_repeated_header(columns: Vec<String>) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let l_names: Vec<String> = columns
        .into_iter()
        .map(|c_name| {
            let c_head_repeated = match c_name.rsplit_once(C_CSV_DUPLICATE_MARK) {
                Some((c_head, c_tail))
                    if !c_tail.is_empty()
                        && c_tail.bytes().all(|b| b.is_ascii_digit())
                        && set_seen.contains(c_head) =>
                {
                    Some(c_head.to_string())
                }
                _ => None,
            };
            let c_base = c_head_repeated.unwrap_or(c_name);
            set_seen.insert(c_base.clone());
            c_base
        })
        .collect();
    derive_unique_header(l_names)
}

/// Worksheets may repeat header text; suffix repeats with `.1`, `.2`, ...
fn derive_unique_header(columns: Vec<String>) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    columns
        .into_iter()
        .map(|c_name| {
            let mut c_candidate = c_name.clone();
            let mut n_suffix = 1;
            while set_seen.contains(&c_candidate) {
                c_candidate = format!("{c_name}.{n_suffix}");
                n_suffix += 1;
            }
            set_seen.insert(c_candidate.clone());
            c_candidate
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Ingest

/// Read every upload, keep files matching the first parsed file's column set.
///
/// Unsupported and unreadable files are reported and skipped; they never
/// become the reference schema.
pub fn ingest_uploads(uploads: &[SpecUpload]) -> SpecIngestOutcome {
    let mut builder = ReportIngestBuilder::default();
    let mut set_cols_ref: Option<BTreeSet<String>> = None;
    let mut l_cols_ref: Vec<String> = Vec::new();
    let mut tables_accepted = Vec::new();

    for upload in uploads {
        let c_name = upload.file_name.as_str();
        builder.add_uploaded(c_name);

        let Some(raw) = read_upload(upload) else {
            warn!(file = c_name, "unsupported file type");
            builder.add_unsupported(c_name);
            continue;
        };
        let table = match raw.outcome {
            Ok(table) => table,
            Err(err) => {
                error!(file = c_name, error = %err, "failed to read upload");
                builder.add_error(c_name, err);
                continue;
            }
        };

        let set_cols = table.column_set();
        let set_ref = set_cols_ref.get_or_insert_with(|| {
            l_cols_ref = table.columns().to_vec();
            set_cols.clone()
        });
        if set_cols != *set_ref {
            warn!(file = c_name, "column set differs from reference file");
            builder.add_parsed(c_name, table.height(), false);
            continue;
        }

        builder.add_parsed(c_name, table.height(), true);
        match table.reorder_to(&l_cols_ref) {
            Ok(table) => tables_accepted.push(table),
            Err(err) => builder.add_error(c_name, err.to_string()),
        }
    }

    let report = builder.build();
    info!("{report}");
    SpecIngestOutcome {
        report,
        tables_accepted,
    }
}

/// Concatenate accepted tables in order.
pub fn combine_tables(tables: Vec<Table>) -> Result<Table, CleanError> {
    let mut iter_tables = tables.into_iter();
    let Some(mut table_combined) = iter_tables.next() else {
        return Err(CleanError::NoFilesAccepted);
    };
    for table in iter_tables {
        table_combined.extend_rows(table)?;
    }
    info!(rows = table_combined.height(), "combined uploads");
    Ok(table_combined)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(name: &str, body: &str) -> SpecUpload {
        SpecUpload::new(name, body.as_bytes().to_vec())
    }

    #[test]
    fn test_read_csv_bytes_strips_bom_and_keeps_nulls() {
        let table = read_csv_bytes(b"\xEF\xBB\xBFurl,sentiment\nhttp://a,5\n,0\n").expect("csv");
        assert_eq!(table.columns(), &["url".to_string(), "sentiment".to_string()][..]);
        assert_eq!(table.cell(0, "sentiment"), Some(&EnumCellValue::Number(5.0)));
        assert_eq!(table.cell(1, "url"), Some(&EnumCellValue::None));
    }

    #[test]
    fn test_ingest_rejects_mismatched_schema_by_set() {
        let outcome = ingest_uploads(&[
            csv("a.csv", "url,sentiment\nx,5\ny,0\n"),
            csv("b.csv", "sentiment,url\n-5,z\n"),
            csv("c.csv", "url\nw\n"),
        ]);
        assert_eq!(outcome.tables_accepted.len(), 2);
        assert_eq!(outcome.report.files_mismatched, vec!["c.csv".to_string()]);
        assert_eq!(outcome.report.n_rows_accepted(), 3);

        let table = combine_tables(outcome.tables_accepted).expect("combine");
        assert_eq!(table.height(), 3);
        assert_eq!(table.cell(2, "url"), Some(&EnumCellValue::String("z".to_string())));
        assert_eq!(table.cell(2, "sentiment"), Some(&EnumCellValue::Number(-5.0)));
    }

    #[test]
    fn test_ingest_skips_unsupported_and_unreadable_files() {
        let outcome = ingest_uploads(&[
            csv("notes.txt", "hello"),
            SpecUpload::new("broken.xlsx", b"not a zip".to_vec()),
            csv("a.csv", "url\nx\n"),
        ]);
        assert_eq!(outcome.report.files_unsupported, vec!["notes.txt".to_string()]);
        assert_eq!(outcome.report.errors.len(), 1);
        assert_eq!(outcome.report.errors[0].file_name, "broken.xlsx");
        assert_eq!(outcome.tables_accepted.len(), 1);
    }

    #[test]
    fn test_combine_tables_requires_one_table() {
        assert_eq!(combine_tables(vec![]), Err(CleanError::NoFilesAccepted));
    }

    #[test]
    fn test_derive_unique_header_suffixes_repeats() {
        let l_cols = derive_unique_header(vec!["a".into(), "a".into(), "b".into()]);
        assert_eq!(l_cols, vec!["a".to_string(), "a.1".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_read_csv_bytes_keeps_large_ids_exact() {
        let table = read_csv_bytes(b"id,n\n1790000000000000001,1\n42,2\n").expect("csv");
        assert_eq!(
            table.cell(0, "id"),
            Some(&EnumCellValue::String("1790000000000000001".to_string()))
        );
        assert_eq!(table.cell(1, "id"), Some(&EnumCellValue::Number(42.0)));

        let artifact = crate::export::export_table_to_xlsx(&table, "cleaned", "out.xlsx")
            .expect("export");
        let grid = read_sheet_from_bytes(&artifact.bytes, &SpecXlsxReadOptions::default())
            .expect("read back");
        assert_eq!(grid.rows[0][0].to_text(), "1790000000000000001");
    }

    #[test]
    fn test_repeated_csv_headers_match_workbook_naming() {
        let table = read_csv_bytes(b"a,a,b\n1,2,3\n").expect("csv");
        assert_eq!(
            table.columns(),
            &["a".to_string(), "a.1".to_string(), "b".to_string()][..]
        );
        assert_eq!(
            restore_repeated_header(vec![
                "a".into(),
                "a_duplicated_0".into(),
                "a_duplicated_1".into(),
                "x_duplicated_0".into(),
            ]),
            derive_unique_header(vec!["a".into(), "a".into(), "a".into(), "x_duplicated_0".into()])
        );
    }
}
