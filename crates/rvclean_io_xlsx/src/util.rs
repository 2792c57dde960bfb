//! Stateless helper utilities used by the XLSX reader/writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    N_LEN_EXCEL_CELL_TEXT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecSheetSlice, SpecXlsxReport};

////////////////////////////////////////////////////////////////////////////////
// #region CellText

/// Cut a text cell to Excel's per-cell limit; `None` when `value` already fits.
pub fn truncate_cell_text(value: &EnumCellValue) -> Option<EnumCellValue> {
    let EnumCellValue::String(c_text) = value else {
        return None;
    };
    let (n_idx_byte, _) = c_text.char_indices().nth(N_LEN_EXCEL_CELL_TEXT_MAX)?;
    Some(EnumCellValue::String(c_text[..n_idx_byte].to_string()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Validate that every row is exactly `width` cells wide.
pub fn validate_row_widths(rows: &[Vec<EnumCellValue>], width: usize) -> Result<(), String> {
    match rows.iter().position(|row| row.len() != width) {
        None => Ok(()),
        Some(n_idx) => Err(format!(
            "Row {n_idx} has {} cells; expected {width}.",
            rows[n_idx].len()
        )),
    }
}

/// Indices of columns whose non-missing cells are all numeric.
///
/// Columns with no numeric cell at all are not reported.
pub fn derive_numeric_column_indices(rows: &[Vec<EnumCellValue>], width: usize) -> Vec<usize> {
    (0..width)
        .filter(|n_idx_col| {
            let mut if_seen_number = false;
            for row in rows {
                match &row[*n_idx_col] {
                    EnumCellValue::None => {}
                    EnumCellValue::Number(_) => if_seen_number = true,
                    _ => return false,
                }
            }
            if_seen_number
        })
        .collect()
}

/// Subset of `cols_idx_numeric` holding only whole finite numbers.
pub fn derive_integer_column_indices(
    rows: &[Vec<EnumCellValue>],
    cols_idx_numeric: &[usize],
) -> Vec<usize> {
    cols_idx_numeric
        .iter()
        .copied()
        .filter(|n_idx_col| {
            rows.iter().all(|row| match &row[*n_idx_col] {
                EnumCellValue::Number(n) => !n.is_finite() || n.fract() == 0.0,
                _ => true,
            })
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Split logical grid range into Excel-compliant sheet slices.
pub fn plan_sheet_slices(
    height_df: usize,
    width_df: usize,
    height_header: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<Vec<SpecSheetSlice>, String> {
    if height_header == 0 {
        return Err("height_header must be >= 1.".to_string());
    }

    let n_rows_data_max = N_NROWS_EXCEL_MAX
        .checked_sub(height_header)
        .filter(|n_rows| *n_rows > 0)
        .ok_or_else(|| {
            format!("Header too tall: height_header={height_header} exceeds Excel limit.")
        })?;

    let mut l_col_slices = Vec::new();
    let mut n_col_start = 0;
    while n_col_start < width_df {
        let n_col_end = usize::min(width_df, n_col_start + N_NCOLS_EXCEL_MAX);
        l_col_slices.push((n_col_start, n_col_end));
        n_col_start = n_col_end;
    }
    if l_col_slices.is_empty() {
        l_col_slices.push((0, 0));
    }

    let mut l_row_slices = Vec::new();
    let mut n_row_start = 0;
    while n_row_start < height_df {
        let n_row_end = usize::min(height_df, n_row_start + n_rows_data_max);
        l_row_slices.push((n_row_start, n_row_end));
        n_row_start = n_row_end;
    }
    if l_row_slices.is_empty() {
        l_row_slices.push((0, 0));
    }

    let n_parts_total = l_col_slices.len() * l_row_slices.len();

    let mut l_sheet_parts = Vec::new();
    let mut n_idx_part = 1;
    for (col_start, col_end) in &l_col_slices {
        for (row_start, row_end) in &l_row_slices {
            let c_part_sheet_name = if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx_part)
            };

            l_sheet_parts.push(SpecSheetSlice {
                sheet_name: c_part_sheet_name,
                row_start_inclusive: *row_start,
                row_end_exclusive: *row_end,
                col_start_inclusive: *col_start,
                col_end_exclusive: *col_end,
            });
            n_idx_part += 1;
        }
    }

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel limit overflow: split into {} sheets (columns-first, then rows).",
            l_sheet_parts.len()
        ));
    }

    Ok(l_sheet_parts)
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name_replaces_illegal_and_caps_length() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_plan_sheet_slices_single_part_keeps_name() {
        let mut report = SpecXlsxReport::default();
        let l_parts = plan_sheet_slices(10, 3, 1, "cleaned", &mut report).expect("plan");
        assert_eq!(l_parts.len(), 1);
        assert_eq!(l_parts[0].sheet_name, "cleaned");
        assert_eq!(l_parts[0].row_end_exclusive, 10);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_plan_sheet_slices_splits_rows_over_limit() {
        let mut report = SpecXlsxReport::default();
        let l_parts =
            plan_sheet_slices(N_NROWS_EXCEL_MAX + 5, 2, 1, "cleaned", &mut report).expect("plan");
        assert_eq!(l_parts.len(), 2);
        assert_eq!(l_parts[0].sheet_name, "cleaned_1");
        assert_eq!(l_parts[0].row_end_exclusive, N_NROWS_EXCEL_MAX - 1);
        assert_eq!(l_parts[1].row_start_inclusive, N_NROWS_EXCEL_MAX - 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_numeric_and_integer_inference_ignores_blanks() {
        let rows = vec![
            vec![
                EnumCellValue::Number(1.0),
                EnumCellValue::Number(1.5),
                EnumCellValue::String("x".to_string()),
            ],
            vec![
                EnumCellValue::None,
                EnumCellValue::Number(2.0),
                EnumCellValue::Number(3.0),
            ],
        ];
        let l_numeric = derive_numeric_column_indices(&rows, 3);
        assert_eq!(l_numeric, vec![0, 1]);
        assert_eq!(derive_integer_column_indices(&rows, &l_numeric), vec![0]);
    }

    #[test]
    fn test_validate_unique_columns_reports_positions() {
        let cols = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let err = validate_unique_columns(&cols).expect_err("dup");
        assert!(err.contains("\"a\" x2 at indices [0, 2]"));
    }

    #[test]
    fn test_truncate_cell_text_caps_by_chars() {
        let c_long = "é".repeat(N_LEN_EXCEL_CELL_TEXT_MAX + 10);
        let Some(EnumCellValue::String(c_cut)) =
            truncate_cell_text(&EnumCellValue::String(c_long))
        else {
            panic!("expected truncated text");
        };
        assert_eq!(c_cut.chars().count(), N_LEN_EXCEL_CELL_TEXT_MAX);

        let c_fit = "x".repeat(N_LEN_EXCEL_CELL_TEXT_MAX);
        assert_eq!(truncate_cell_text(&EnumCellValue::String(c_fit)), None);
        assert_eq!(truncate_cell_text(&EnumCellValue::Number(1.0)), None);
    }
}
