//! Workbook reader that decodes one worksheet into a header + row grid.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDateTime;

use crate::spec::{EnumCellValue, SpecSheetGrid, SpecXlsxReadOptions};

/// Read one worksheet from in-memory `.xlsx`/`.xls`/`.xlsb`/`.ods` bytes.
///
/// The first worksheet row is the header. Empty header cells are named
/// `Unnamed: <idx>`; body rows are padded/truncated to header width.
pub fn read_sheet_from_bytes(
    v_bytes: &[u8],
    options: &SpecXlsxReadOptions,
) -> Result<SpecSheetGrid, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(v_bytes.to_vec()))
        .map_err(|err| format!("Failed to open workbook: {err}"))?;

    let l_sheet_names = workbook.sheet_names();
    let Some(sheet_name) = l_sheet_names.get(options.sheet_index).cloned() else {
        return Err(format!(
            "Worksheet index {} out of range (workbook has {} sheets).",
            options.sheet_index,
            l_sheet_names.len()
        ));
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| format!("Failed to read worksheet {sheet_name:?}: {err}"))?;

    let mut iter_rows = range.rows();
    let Some(row_header) = iter_rows.next() else {
        return Ok(SpecSheetGrid {
            sheet_name,
            columns: vec![],
            rows: vec![],
        });
    };

    let columns: Vec<String> = row_header
        .iter()
        .enumerate()
        .map(|(n_idx, cell)| derive_header_text_from_data(cell, n_idx))
        .collect();
    let n_width = columns.len();

    let mut rows = Vec::with_capacity(range.height().saturating_sub(1));
    for row in iter_rows {
        let mut l_cells: Vec<EnumCellValue> = row
            .iter()
            .take(n_width)
            .map(derive_cell_value_from_data)
            .collect();
        l_cells.resize(n_width, EnumCellValue::None);

        if options.if_skip_blank_rows && l_cells.iter().all(EnumCellValue::is_none) {
            continue;
        }
        rows.push(l_cells);
    }

    Ok(SpecSheetGrid {
        sheet_name,
        columns,
        rows,
    })
}

fn derive_header_text_from_data(cell: &Data, n_idx: usize) -> String {
    let c_text = match derive_cell_value_from_data(cell) {
        EnumCellValue::None => String::new(),
        value => value.to_text(),
    };
    if c_text.is_empty() {
        format!("Unnamed: {n_idx}")
    } else {
        c_text
    }
}

/// Map a calamine cell into the shared cell model.
pub fn derive_cell_value_from_data(cell: &Data) -> EnumCellValue {
    match cell {
        Data::Empty => EnumCellValue::None,
        Data::Error(_) => EnumCellValue::None,
        Data::String(val) if val.is_empty() => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => match val.as_datetime() {
            Some(dt) => EnumCellValue::DateTime(dt),
            None => EnumCellValue::Number(val.as_f64()),
        },
        Data::DateTimeIso(val) => parse_iso_datetime(val)
            .map(EnumCellValue::DateTime)
            .unwrap_or_else(|| EnumCellValue::String(val.clone())),
        Data::DurationIso(val) => EnumCellValue::String(val.clone()),
    }
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
