//! Projection to downloadable XLSX bytes.

use rvclean_io_xlsx::{C_MIME_XLSX, XlsxWriter};
use tracing::{info, warn};

use crate::spec::{CleanError, SpecExportArtifact};
use crate::table::Table;

/// Serialize `table` as one worksheet (header row, no index column).
///
/// Text over Excel's cell limit is cut; the cut shows up in `warnings`.
pub fn export_table_to_xlsx(
    table: &Table,
    sheet_name: &str,
    file_name: &str,
) -> Result<SpecExportArtifact, CleanError> {
    let mut writer = XlsxWriter::new();
    writer
        .write_sheet(table.columns(), table.rows(), sheet_name)
        .map_err(CleanError::Export)?;
    let bytes = writer.save_to_buffer().map_err(CleanError::Export)?;

    let warnings: Vec<String> = writer
        .report()
        .into_iter()
        .flat_map(|report| report.warnings)
        .collect();
    for c_warning in &warnings {
        warn!("{c_warning}");
    }
    info!(
        rows = table.height(),
        columns = table.width(),
        bytes = bytes.len(),
        "exported workbook"
    );

    Ok(SpecExportArtifact {
        file_name: file_name.to_string(),
        mime: C_MIME_XLSX.to_string(),
        bytes,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use rvclean_io_xlsx::{EnumCellValue, SpecXlsxReadOptions, read_sheet_from_bytes};

    use super::*;

    #[test]
    fn test_export_writes_header_and_rows_to_named_sheet() {
        let table = Table::new(
            vec!["url".to_string(), "date".to_string()],
            vec![
                vec![EnumCellValue::String("http://a".to_string()), EnumCellValue::None],
                vec![
                    EnumCellValue::String("http://b".to_string()),
                    EnumCellValue::String("x".to_string()),
                ],
            ],
        )
        .expect("table");
        let artifact =
            export_table_to_xlsx(&table, "cleaned", "filtered_cleaned_files.xlsx").expect("xlsx");
        assert_eq!(artifact.file_name, "filtered_cleaned_files.xlsx");
        assert_eq!(artifact.mime, C_MIME_XLSX);
        assert!(artifact.warnings.is_empty());

        let grid = read_sheet_from_bytes(&artifact.bytes, &SpecXlsxReadOptions::default())
            .expect("read back");
        assert_eq!(grid.sheet_name, "cleaned");
        assert_eq!(grid.columns, vec!["url".to_string(), "date".to_string()]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1][1], EnumCellValue::String("x".to_string()));
    }

    #[test]
    fn test_export_cuts_overlong_text_instead_of_failing() {
        let table = Table::new(
            vec!["title".to_string()],
            vec![vec![EnumCellValue::String("t".repeat(40_000))]],
        )
        .expect("table");
        let artifact =
            export_table_to_xlsx(&table, "cleaned", "filtered_cleaned_files.xlsx").expect("xlsx");
        assert_eq!(artifact.warnings.len(), 1);

        let grid = read_sheet_from_bytes(&artifact.bytes, &SpecXlsxReadOptions::default())
            .expect("read back");
        let c_title = grid.rows[0][0].as_str().expect("text");
        assert_eq!(c_title.chars().count(), rvclean_io_xlsx::N_LEN_EXCEL_CELL_TEXT_MAX);
    }
}
