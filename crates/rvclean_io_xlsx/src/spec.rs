//! Shared XLSX specification models.

use chrono::{NaiveDate, NaiveDateTime};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification used for header/body cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }
}

/// Normalized cell value shared by reader, cleaning pipeline and writer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Calendar date without time of day.
    Date(NaiveDate),
    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// Borrow text payload, `None` for every non-text variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnumCellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric payload, `None` for every non-numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EnumCellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, EnumCellValue::None)
    }

    /// Render value as display text (`None` renders as empty string).
    ///
    /// Whole numbers render without a fractional part (`5`, not `5.0`).
    pub fn to_text(&self) -> String {
        match self {
            EnumCellValue::None => String::new(),
            EnumCellValue::String(s) => s.clone(),
            EnumCellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            EnumCellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            EnumCellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnFormatSpecification

/// Planned final formats by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnFormatPlan {
    /// Final format applied at write time.
    pub fmts_by_col: Vec<SpecCellFormat>,
    /// Date cells format applied per column.
    pub fmts_date_by_col: Vec<SpecCellFormat>,
    /// Datetime cells format applied per column.
    pub fmts_datetime_by_col: Vec<SpecCellFormat>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadSpecification

/// Options for reading one worksheet into a header + row grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxReadOptions {
    /// Zero-based worksheet position to read.
    pub sheet_index: usize,
    /// Drop body rows whose cells are all empty.
    pub if_skip_blank_rows: bool,
}

impl Default for SpecXlsxReadOptions {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            if_skip_blank_rows: true,
        }
    }
}

/// One worksheet decoded into column names and aligned body rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Worksheet name in source workbook.
    pub sheet_name: String,
    /// Header row text (first worksheet row).
    pub columns: Vec<String>,
    /// Body rows, each `columns.len()` wide.
    pub rows: Vec<Vec<EnumCellValue>>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSpecification

/// Concrete sheet part emitted to workbook (after Excel-limit slicing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
    /// Inclusive source column start.
    pub col_start_inclusive: usize,
    /// Exclusive source column end.
    pub col_end_exclusive: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
