//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel cell text maximum length, in characters.
pub const N_LEN_EXCEL_CELL_TEXT_MAX: usize = 32_767;
/// Autofit column width bounds and padding, in character units.
pub const N_WIDTH_CELL_MIN: usize = 8;
pub const N_WIDTH_CELL_MAX: usize = 60;
pub const N_WIDTH_CELL_PADDING: usize = 2;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// MIME type of an Office Open XML workbook.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Generic text cell format.
    Text,
    /// Integer number format.
    Integer,
    /// Decimal number format.
    Decimal,
    /// Calendar date format.
    Date,
    /// Timestamp format.
    DateTime,
    /// Header cell format.
    Header,
}

impl EnumFmtKey {
    /// Preset map key.
    pub fn key(self) -> &'static str {
        match self {
            EnumFmtKey::Text => "text",
            EnumFmtKey::Integer => "integer",
            EnumFmtKey::Decimal => "decimal",
            EnumFmtKey::Date => "date",
            EnumFmtKey::DateTime => "datetime",
            EnumFmtKey::Header => "header",
        }
    }
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Text.key().to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Header.key().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(1),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Integer.key().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Decimal.key().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0.####".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Date.key().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("yyyy-mm-dd".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::DateTime.key().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("yyyy-mm-dd hh:mm:ss".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Look up one preset, falling back to an empty format.
pub fn derive_default_xlsx_format(key: EnumFmtKey) -> SpecCellFormat {
    derive_default_xlsx_formats()
        .remove(key.key())
        .unwrap_or_default()
}
