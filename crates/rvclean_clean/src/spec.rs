//! Cleaning session models, options and top-level error types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::table::Table;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Reader selected for an uploaded file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileKind {
    /// Comma-separated text with a header row.
    Csv,
    /// `.xlsx`/`.xls` workbook; only the first worksheet is read.
    Workbook,
}

/// Severity of one user-visible session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumMessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl EnumMessageLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EnumMessageLevel::Info => "info",
            EnumMessageLevel::Success => "success",
            EnumMessageLevel::Warning => "warning",
            EnumMessageLevel::Error => "error",
        }
    }
}

/// One fixed cleaning step, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCleanStep {
    /// `published` timestamps reduced to calendar dates.
    NormalizePublished,
    /// Rows without the marking keyword in `tags_marking` dropped.
    FilterMarking,
    /// Rows with the hide keyword in `tags_customer` dropped.
    FilterHidden,
    /// `title` prepended to `content`, then truncated.
    MergeContent,
    /// `url` text truncated.
    TruncateUrl,
    /// Numeric sentiment codes relabelled.
    RelabelSentiment,
    /// Source-type codes relabelled.
    RelabelSourceType,
    /// `head/value` tags expanded into columns.
    ExpandTags,
    /// Column names trimmed, lowercased and snake-cased.
    NormalizeHeaders,
}

impl EnumCleanStep {
    pub fn name(self) -> &'static str {
        match self {
            EnumCleanStep::NormalizePublished => "normalize_published",
            EnumCleanStep::FilterMarking => "filter_marking",
            EnumCleanStep::FilterHidden => "filter_hidden",
            EnumCleanStep::MergeContent => "merge_content",
            EnumCleanStep::TruncateUrl => "truncate_url",
            EnumCleanStep::RelabelSentiment => "relabel_sentiment",
            EnumCleanStep::RelabelSourceType => "relabel_source_type",
            EnumCleanStep::ExpandTags => "expand_tags",
            EnumCleanStep::NormalizeHeaders => "normalize_headers",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecUpload {
    /// Client-side file name; its extension selects the reader.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl SpecUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Parse outcome for one supported upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRawFileResult {
    pub file_name: String,
    /// Parsed table, or the reader's error text.
    pub outcome: Result<Table, String>,
}

impl SpecRawFileResult {
    /// Row count of a parsed file, `None` on parse failure.
    pub fn n_rows(&self) -> Option<usize> {
        self.outcome.as_ref().ok().map(Table::height)
    }
}

/// Sentiment code and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSentimentLabel {
    pub code: i64,
    pub label: String,
}

/// Every tunable constant of the cleaning session.
///
/// Missing keys in a TOML file fall back to the canonical defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCleanOptions {
    /// Max characters kept in `content` and `url`.
    pub len_text_max: usize,
    /// Substring a `tags_marking` cell must contain for its row to survive.
    pub marking_keyword: String,
    /// Substring in `tags_customer` that drops a row.
    pub hide_keyword: String,
    /// Columns checked by default (normalized before matching).
    pub columns_default_checked: Vec<String>,
    /// Rows exposed in the render preview.
    pub n_rows_preview_max: usize,
    /// Worksheet name of the export.
    pub sheet_name: String,
    /// Download file name of the export.
    pub export_file_name: String,
    // TOML tables must follow plain values.
    /// Numeric sentiment code mapping.
    pub sentiment_labels: Vec<SpecSentimentLabel>,
    /// Exact-match source-type mapping.
    pub source_type_labels: BTreeMap<String, String>,
    /// Default display names keyed by cleaned column name.
    pub column_names_default: BTreeMap<String, String>,
}

impl Default for SpecCleanOptions {
    fn default() -> Self {
        crate::conf::derive_default_clean_options()
    }
}

/// One user-visible message produced by a session action or render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMessage {
    pub level: EnumMessageLevel,
    pub text: String,
}

impl SpecMessage {
    pub fn new(level: EnumMessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(EnumMessageLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(EnumMessageLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(EnumMessageLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(EnumMessageLevel::Error, text)
    }
}

/// Per-file parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecIngestError {
    pub file_name: String,
    /// Reader error text.
    pub exception: String,
}

/// Row count of one parsed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileRowCount {
    pub file_name: String,
    pub n_rows: usize,
    /// Whether the file matched the reference schema and was combined.
    pub if_accepted: bool,
}

/// Check state and output name of one cleaned column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnState {
    pub if_checked: bool,
    pub display_name: String,
}

/// One row of the column-selection controls, in cleaned column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnControl {
    pub column: String,
    pub if_checked: bool,
    pub display_name: String,
}

/// Downloadable export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportArtifact {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// Writer warnings (sheet splits and similar).
    pub warnings: Vec<String>,
}

/// Failures surfaced by the ingest/clean/select/export stages.
///
/// Sessions turn these into messages; none of them ends a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CleanError {
    #[error("Upload at least one file before submitting.")]
    NoFilesUploaded,
    #[error("No files were appended. Please ensure uploaded files have matching columns.")]
    NoFilesAccepted,
    #[error("No combined table available. Submit matching files first.")]
    NoCombinedTable,
    #[error("No cleaned table available. Apply cleaning first.")]
    NoCleanedTable,
    #[error("No columns selected! Please select at least one column!")]
    NoColumnsSelected,
    #[error("Duplicate output column names: {0}. Rename columns so every name is unique.")]
    DuplicateDisplayNames(String),
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("Row {row} has {found} cells; expected {expected}.")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Column {column:?} has {found} values; expected {expected}.")]
    ColumnLength {
        column: String,
        found: usize,
        expected: usize,
    },
    #[error("Failed to export workbook: {0}")]
    Export(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_error_messages_are_user_facing() {
        assert_eq!(
            CleanError::NoFilesAccepted.to_string(),
            "No files were appended. Please ensure uploaded files have matching columns."
        );
        assert_eq!(
            CleanError::NoColumnsSelected.to_string(),
            "No columns selected! Please select at least one column!"
        );
    }

    #[test]
    fn test_raw_file_result_row_count_only_for_parsed_files() {
        let ok = SpecRawFileResult {
            file_name: "a.csv".to_string(),
            outcome: Table::new(vec!["x".to_string()], vec![]).map_err(|err| err.to_string()),
        }
        .n_rows();
        let failed = SpecRawFileResult {
            file_name: "b.csv".to_string(),
            outcome: Err("bad".to_string()),
        }
        .n_rows();
        assert_eq!(ok, Some(0));
        assert_eq!(failed, None);
    }
}
