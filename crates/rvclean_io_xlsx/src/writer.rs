//! XLSX writer kernel that converts row grids into in-memory workbook output.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{
    EnumFmtKey, N_LEN_EXCEL_CELL_TEXT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_WIDTH_CELL_MAX,
    N_WIDTH_CELL_MIN, N_WIDTH_CELL_PADDING, derive_default_xlsx_format,
};
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecColumnFormatPlan, SpecSheetSlice, SpecXlsxReport,
};
use crate::util::{
    derive_integer_column_indices, derive_numeric_column_indices, plan_sheet_slices,
    sanitize_sheet_name, truncate_cell_text, validate_row_widths, validate_unique_columns,
};

pub struct SpecColumnFormatPlanOptions<'a> {
    /// Number of columns in current sheet slice.
    pub width_data: usize,
    /// Slice-local numeric column indices.
    pub cols_idx_numeric: &'a [usize],
    /// Slice-local integer column indices.
    pub cols_idx_integer: &'a [usize],
    /// Base text format.
    pub fmt_text: &'a SpecCellFormat,
    /// Base integer format.
    pub fmt_integer: &'a SpecCellFormat,
    /// Base decimal format.
    pub fmt_decimal: &'a SpecCellFormat,
    /// Base date format.
    pub fmt_date: &'a SpecCellFormat,
    /// Base datetime format.
    pub fmt_datetime: &'a SpecCellFormat,
}

/// Stateful workbook writer.
///
/// Sheets are buffered in memory; call [`Self::save_to_buffer`] to obtain the
/// serialized workbook bytes.
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_integer: SpecCellFormat,
    fmt_decimal: SpecCellFormat,
    fmt_date: SpecCellFormat,
    fmt_datetime: SpecCellFormat,
    fmt_header: SpecCellFormat,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWriter {
    /// Create writer with the presets from [`crate::conf::derive_default_xlsx_formats`].
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_text: derive_default_xlsx_format(EnumFmtKey::Text),
            fmt_integer: derive_default_xlsx_format(EnumFmtKey::Integer),
            fmt_decimal: derive_default_xlsx_format(EnumFmtKey::Decimal),
            fmt_date: derive_default_xlsx_format(EnumFmtKey::Date),
            fmt_datetime: derive_default_xlsx_format(EnumFmtKey::DateTime),
            fmt_header: derive_default_xlsx_format(EnumFmtKey::Header),
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
        }
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Serialize the workbook into `.xlsx` bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, String> {
        self.workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)
    }

    /// Write one sheet from a header row and aligned body rows.
    ///
    /// The header row is frozen and column widths follow the header text.
    /// The sheet is split into `<name>_1`, `<name>_2`, ... when the grid
    /// exceeds Excel row/column limits. Text longer than Excel's cell limit
    /// is cut and reported as a warning.
    pub fn write_sheet(
        &mut self,
        columns: &[String],
        rows: &[Vec<EnumCellValue>],
        sheet_name: &str,
    ) -> Result<(), String> {
        validate_unique_columns(columns)?;
        validate_row_widths(rows, columns.len())?;

        let n_width_df = columns.len();
        let n_height_df = rows.len();
        let n_rows_header = 1usize;

        let l_cols_idx_numeric = derive_numeric_column_indices(rows, n_width_df);
        let l_cols_idx_integer = derive_integer_column_indices(rows, &l_cols_idx_numeric);

        let mut report = SpecXlsxReport::default();
        let l_sheet_parts = plan_sheet_slices(
            n_height_df,
            n_width_df,
            n_rows_header,
            &sanitize_sheet_name(sheet_name, "_"),
            &mut report,
        )?;

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);

            let l_cols_idx_numeric_slice = derive_slice_indices(
                &l_cols_idx_numeric,
                sheet_slice.col_start_inclusive,
                sheet_slice.col_end_exclusive,
            );
            let l_cols_idx_integer_slice = derive_slice_indices(
                &l_cols_idx_integer,
                sheet_slice.col_start_inclusive,
                sheet_slice.col_end_exclusive,
            );
            let n_width_slice = sheet_slice.col_end_exclusive - sheet_slice.col_start_inclusive;

            let plan_col_formats = plan_column_formats(SpecColumnFormatPlanOptions {
                width_data: n_width_slice,
                cols_idx_numeric: &l_cols_idx_numeric_slice,
                cols_idx_integer: &l_cols_idx_integer_slice,
                fmt_text: &self.fmt_text,
                fmt_integer: &self.fmt_integer,
                fmt_decimal: &self.fmt_decimal,
                fmt_date: &self.fmt_date,
                fmt_datetime: &self.fmt_datetime,
            });
            let l_fmt_data_by_col: Vec<Format> = plan_col_formats
                .fmts_by_col
                .iter()
                .map(derive_rust_xlsx_format)
                .collect();
            let l_fmt_date_by_col: Vec<Format> = plan_col_formats
                .fmts_date_by_col
                .iter()
                .map(derive_rust_xlsx_format)
                .collect();
            let l_fmt_datetime_by_col: Vec<Format> = plan_col_formats
                .fmts_datetime_by_col
                .iter()
                .map(derive_rust_xlsx_format)
                .collect();
            let fmt_header = derive_rust_xlsx_format(&self.fmt_header);

            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;

            let mut n_cells_truncated = 0usize;
            let l_header_slice =
                &columns[sheet_slice.col_start_inclusive..sheet_slice.col_end_exclusive];
            for (n_idx_col, c_name) in l_header_slice.iter().enumerate() {
                let value = EnumCellValue::String(c_name.clone());
                let value = match truncate_cell_text(&value) {
                    Some(value_cut) => {
                        n_cells_truncated += 1;
                        value_cut
                    }
                    None => value,
                };
                write_cell_with_format(worksheet, 0, n_idx_col, &value, &fmt_header)?;

                let n_width_final = (estimate_unicode_string_width(c_name) + N_WIDTH_CELL_PADDING)
                    .clamp(N_WIDTH_CELL_MIN, N_WIDTH_CELL_MAX);
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
            }

            if n_height_df > 0 {
                worksheet
                    .set_freeze_panes(cast_row_num(n_rows_header)?, 0)
                    .map_err(derive_xlsx_error_text)?;
            }

            for (n_row_local, row) in rows[sheet_slice.row_start_inclusive
                ..sheet_slice.row_end_exclusive]
                .iter()
                .enumerate()
            {
                for n_idx_col in 0..n_width_slice {
                    let value = &row[sheet_slice.col_start_inclusive + n_idx_col];
                    let value_cut = truncate_cell_text(value);
                    if value_cut.is_some() {
                        n_cells_truncated += 1;
                    }
                    let value = value_cut.as_ref().unwrap_or(value);

                    let fmt_cell = match value {
                        EnumCellValue::Date(_) => &l_fmt_date_by_col[n_idx_col],
                        EnumCellValue::DateTime(_) => &l_fmt_datetime_by_col[n_idx_col],
                        _ => &l_fmt_data_by_col[n_idx_col],
                    };
                    write_cell_with_format(
                        worksheet,
                        n_rows_header + n_row_local,
                        n_idx_col,
                        value,
                        fmt_cell,
                    )?;
                }
            }

            if n_cells_truncated > 0 {
                report.warn(format!(
                    "Sheet {sheet_name_unique:?}: {n_cells_truncated} cell(s) cut to Excel's {N_LEN_EXCEL_CELL_TEXT_MAX}-character limit."
                ));
            }

            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                ..sheet_slice
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Build per-column format plans for current sheet slice.
pub fn plan_column_formats(options: SpecColumnFormatPlanOptions<'_>) -> SpecColumnFormatPlan {
    let SpecColumnFormatPlanOptions {
        width_data,
        cols_idx_numeric,
        cols_idx_integer,
        fmt_text,
        fmt_integer,
        fmt_decimal,
        fmt_date,
        fmt_datetime,
    } = options;

    let set_cols_idx_numeric: BTreeSet<usize> = cols_idx_numeric.iter().copied().collect();
    let set_cols_idx_integer: BTreeSet<usize> = cols_idx_integer.iter().copied().collect();

    let mut fmts_by_col = Vec::with_capacity(width_data);
    let mut fmts_date_by_col = Vec::with_capacity(width_data);
    let mut fmts_datetime_by_col = Vec::with_capacity(width_data);

    for col_idx in 0..width_data {
        let fmt_base = if set_cols_idx_integer.contains(&col_idx) {
            fmt_integer
        } else if set_cols_idx_numeric.contains(&col_idx) {
            fmt_decimal
        } else {
            fmt_text
        };

        fmts_by_col.push(fmt_base.clone());
        fmts_date_by_col.push(fmt_date.clone());
        fmts_datetime_by_col.push(fmt_datetime.clone());
    }

    SpecColumnFormatPlan {
        fmts_by_col,
        fmts_date_by_col,
        fmts_datetime_by_col,
    }
}

fn derive_slice_indices(
    indices: &[usize],
    col_start_inclusive: usize,
    col_end_exclusive: usize,
) -> Vec<usize> {
    indices
        .iter()
        .filter_map(|idx| {
            if *idx >= col_start_inclusive && *idx < col_end_exclusive {
                Some(*idx - col_start_inclusive)
            } else {
                None
            }
        })
        .collect()
}

/// Write one cell; NaN/Inf numbers are written blank.
fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) if !val.is_finite() => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Date(val) => {
            worksheet
                .write_datetime_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::DateTime(val) => {
            worksheet
                .write_datetime_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
