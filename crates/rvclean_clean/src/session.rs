//! Interactive cleaning session: one explicit state value per user.
//!
//! Each interaction is one [`Session::handle`] call followed by
//! [`Session::render`]. Handlers only recompute what their action affects;
//! the export workbook is rebuilt on every render.

use tracing::{info, warn};

use crate::export::export_table_to_xlsx;
use crate::ingest::{combine_tables, ingest_uploads};
use crate::pipeline::clean_table;
use crate::report::{ReportClean, ReportIngest};
use crate::selection::ColumnSelection;
use crate::spec::{
    CleanError, SpecCleanOptions, SpecColumnControl, SpecExportArtifact, SpecFileRowCount,
    SpecMessage, SpecUpload,
};
use crate::table::Table;

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumSessionAction {
    /// Ingest and combine a new batch; resets every later stage.
    Submit(Vec<SpecUpload>),
    /// Run the cleaning pipeline over the combined table.
    Clean,
    /// Include or exclude one cleaned column from the export.
    SetColumnChecked { column: String, if_checked: bool },
    /// Change the output name of one cleaned column.
    SetColumnName { column: String, display_name: String },
}

/// Everything a front end needs to draw the current state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecRenderView {
    /// Messages of the last action, then render-time messages.
    pub messages: Vec<SpecMessage>,
    pub files_uploaded: Vec<String>,
    pub files_parsed: Vec<SpecFileRowCount>,
    pub n_rows_combined: Option<usize>,
    pub n_rows_cleaned: Option<usize>,
    /// Column controls in cleaned column order.
    pub columns: Vec<SpecColumnControl>,
    /// First rows of the renamed projection.
    pub preview: Option<Table>,
    pub export: Option<SpecExportArtifact>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    options: SpecCleanOptions,
    if_files_appended: bool,
    if_cleaning_applied: bool,
    table_combined: Option<Table>,
    table_cleaned: Option<Table>,
    selection: ColumnSelection,
    report_ingest: Option<ReportIngest>,
    report_clean: Option<ReportClean>,
    l_messages: Vec<SpecMessage>,
}

impl Session {
    pub fn new(options: SpecCleanOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &SpecCleanOptions {
        &self.options
    }

    pub fn if_files_appended(&self) -> bool {
        self.if_files_appended
    }

    pub fn if_cleaning_applied(&self) -> bool {
        self.if_cleaning_applied
    }

    pub fn table_combined(&self) -> Option<&Table> {
        self.table_combined.as_ref()
    }

    pub fn table_cleaned(&self) -> Option<&Table> {
        self.table_cleaned.as_ref()
    }

    pub fn selection(&self) -> &ColumnSelection {
        &self.selection
    }

    pub fn report_ingest(&self) -> Option<&ReportIngest> {
        self.report_ingest.as_ref()
    }

    pub fn report_clean(&self) -> Option<&ReportClean> {
        self.report_clean.as_ref()
    }

    /// Messages produced by the last action.
    pub fn messages(&self) -> &[SpecMessage] {
        &self.l_messages
    }

    /// Apply one action; returns its messages.
    pub fn handle(&mut self, action: EnumSessionAction) -> &[SpecMessage] {
        self.l_messages.clear();
        match action {
            EnumSessionAction::Submit(uploads) => self.submit(&uploads),
            EnumSessionAction::Clean => self.clean(),
            EnumSessionAction::SetColumnChecked { column, if_checked } => {
                let result = self
                    .require_cleaned()
                    .and_then(|_| self.selection.set_checked(&column, if_checked));
                self.push_result(result);
            }
            EnumSessionAction::SetColumnName {
                column,
                display_name,
            } => {
                let result = self
                    .require_cleaned()
                    .and_then(|_| self.selection.set_display_name(&column, &display_name));
                self.push_result(result);
            }
        }
        &self.l_messages
    }

    fn submit(&mut self, uploads: &[SpecUpload]) {
        self.if_files_appended = false;
        self.if_cleaning_applied = false;
        self.table_combined = None;
        self.table_cleaned = None;
        self.selection.clear();
        self.report_ingest = None;
        self.report_clean = None;

        if uploads.is_empty() {
            self.push_error(&CleanError::NoFilesUploaded);
            return;
        }

        self.l_messages.push(SpecMessage::info("Uploaded files:"));
        for upload in uploads {
            self.l_messages
                .push(SpecMessage::info(format!("- {}", upload.file_name)));
        }

        let outcome = ingest_uploads(uploads);
        let report = outcome.report;
        for c_warning in &report.warnings {
            self.l_messages.push(SpecMessage::warning(c_warning.clone()));
        }
        for err in &report.errors {
            self.l_messages.push(SpecMessage::error(format!(
                "Error reading {}: {}",
                err.file_name, err.exception
            )));
        }

        self.l_messages
            .push(SpecMessage::info("Uploaded File Information"));
        for file in &report.files_parsed {
            self.l_messages.push(SpecMessage::info(format!(
                "{}: {} rows",
                file.file_name, file.n_rows
            )));
        }
        if !report.files_mismatched.is_empty() {
            self.l_messages.push(SpecMessage::warning(format!(
                "The following files have mismatched columns and were not included in the final table: {}",
                report.files_mismatched.join(", ")
            )));
        }

        match combine_tables(outcome.tables_accepted) {
            Ok(table) => {
                self.l_messages.push(SpecMessage::success(
                    "All matching files have been successfully appended!",
                ));
                self.l_messages.push(SpecMessage::info(format!(
                    "Total Rows in Combined File: {}",
                    table.height()
                )));
                self.table_combined = Some(table);
                self.if_files_appended = true;
            }
            Err(err) => self.push_error(&err),
        }
        self.report_ingest = Some(report);
    }

    fn clean(&mut self) {
        let Some(table_combined) = self.table_combined.as_ref() else {
            self.push_error(&CleanError::NoCombinedTable);
            return;
        };
        if self.if_cleaning_applied {
            self.l_messages
                .push(SpecMessage::info("Cleaning already applied."));
            return;
        }

        match clean_table(table_combined.clone(), &self.options) {
            Ok((table, report)) => {
                self.selection.sync_columns(table.columns(), &self.options);
                for c_warning in &report.warnings {
                    self.l_messages.push(SpecMessage::warning(c_warning.clone()));
                }
                self.l_messages.push(SpecMessage::success(format!(
                    "Cleaning applied: {} of {} rows kept.",
                    report.n_rows_output, report.n_rows_input
                )));
                self.table_cleaned = Some(table);
                self.report_clean = Some(report);
                self.if_cleaning_applied = true;
            }
            Err(err) => self.push_error(&err),
        }
    }

    fn require_cleaned(&self) -> Result<(), CleanError> {
        match self.table_cleaned {
            Some(_) => Ok(()),
            None => Err(CleanError::NoCleanedTable),
        }
    }

    fn push_result(&mut self, result: Result<(), CleanError>) {
        if let Err(err) = result {
            self.push_error(&err);
        }
    }

    fn push_error(&mut self, err: &CleanError) {
        warn!(error = %err, "session action rejected");
        self.l_messages.push(SpecMessage::error(err.to_string()));
    }

    /// Build the current view, serializing the export from scratch.
    pub fn render(&self) -> SpecRenderView {
        let mut view = SpecRenderView {
            messages: self.l_messages.clone(),
            n_rows_combined: self.table_combined.as_ref().map(Table::height),
            n_rows_cleaned: self.table_cleaned.as_ref().map(Table::height),
            ..Default::default()
        };
        if let Some(report) = &self.report_ingest {
            view.files_uploaded = report.files_uploaded.clone();
            view.files_parsed = report.files_parsed.clone();
        }

        let Some(table_cleaned) = &self.table_cleaned else {
            return view;
        };
        view.columns = self.selection.controls(table_cleaned.columns());

        let table_projected = match self.selection.project(table_cleaned) {
            Ok(table) => table,
            Err(err) => {
                view.messages.push(SpecMessage::warning(err.to_string()));
                return view;
            }
        };
        view.preview = Some(table_projected.head(self.options.n_rows_preview_max));

        match export_table_to_xlsx(
            &table_projected,
            &self.options.sheet_name,
            &self.options.export_file_name,
        ) {
            Ok(artifact) => {
                for c_warning in &artifact.warnings {
                    view.messages.push(SpecMessage::warning(c_warning.clone()));
                }
                info!(file = %artifact.file_name, "export ready");
                view.export = Some(artifact);
            }
            Err(err) => view.messages.push(SpecMessage::error(err.to_string())),
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::EnumMessageLevel;

    fn csv(name: &str, body: &str) -> SpecUpload {
        SpecUpload::new(name, body.as_bytes().to_vec())
    }

    fn texts(messages: &[SpecMessage], level: EnumMessageLevel) -> Vec<String> {
        messages
            .iter()
            .filter(|m| m.level == level)
            .map(|m| m.text.clone())
            .collect()
    }

    #[test]
    fn test_clean_without_combined_table_is_guarded() {
        let mut session = Session::default();
        let l_msgs = session.handle(EnumSessionAction::Clean).to_vec();
        assert_eq!(
            texts(&l_msgs, EnumMessageLevel::Error),
            vec![CleanError::NoCombinedTable.to_string()]
        );
        assert!(!session.if_cleaning_applied());
        assert!(session.render().export.is_none());
    }

    #[test]
    fn test_submit_with_no_matching_files_reports_error() {
        let mut session = Session::default();
        let l_msgs = session
            .handle(EnumSessionAction::Submit(vec![csv("a.txt", "x")]))
            .to_vec();
        assert_eq!(
            texts(&l_msgs, EnumMessageLevel::Warning),
            vec!["File type of a.txt is not supported.".to_string()]
        );
        assert_eq!(
            texts(&l_msgs, EnumMessageLevel::Error),
            vec![CleanError::NoFilesAccepted.to_string()]
        );
        assert!(!session.if_files_appended());
        assert!(session.table_combined().is_none());
    }

    #[test]
    fn test_selection_edits_require_cleaned_table() {
        let mut session = Session::default();
        let l_msgs = session
            .handle(EnumSessionAction::SetColumnChecked {
                column: "url".to_string(),
                if_checked: true,
            })
            .to_vec();
        assert_eq!(
            texts(&l_msgs, EnumMessageLevel::Error),
            vec![CleanError::NoCleanedTable.to_string()]
        );
    }

    #[test]
    fn test_full_flow_produces_export_and_preview() {
        let mut session = Session::default();
        session.handle(EnumSessionAction::Submit(vec![csv(
            "a.csv",
            "url,sentiment,tags_marking\nhttp://a,5,checked\nhttp://b,0,pending\n",
        )]));
        assert!(session.if_files_appended());
        session.handle(EnumSessionAction::Clean);
        assert!(session.if_cleaning_applied());

        let view = session.render();
        assert_eq!(view.n_rows_combined, Some(2));
        assert_eq!(view.n_rows_cleaned, Some(1));
        let preview = view.preview.expect("preview");
        assert_eq!(preview.columns(), &["url", "sentiment"][..]);
        let export = view.export.expect("export");
        assert_eq!(export.file_name, "filtered_cleaned_files.xlsx");
        assert!(!export.bytes.is_empty());
    }

    #[test]
    fn test_resubmit_resets_selection_and_flags() {
        let mut session = Session::default();
        session.handle(EnumSessionAction::Submit(vec![csv("a.csv", "url\nx\n")]));
        session.handle(EnumSessionAction::Clean);
        session.handle(EnumSessionAction::SetColumnChecked {
            column: "url".to_string(),
            if_checked: false,
        });
        assert_eq!(session.selection().state("url").map(|s| s.if_checked), Some(false));

        session.handle(EnumSessionAction::Submit(vec![csv("b.csv", "url\ny\n")]));
        assert!(!session.if_cleaning_applied());
        assert!(session.table_cleaned().is_none());
        assert!(session.selection().is_empty());

        session.handle(EnumSessionAction::Clean);
        assert_eq!(session.selection().state("url").map(|s| s.if_checked), Some(true));
    }
}
