//! Ingest/clean report models and the mutable ingest report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::{EnumCleanStep, SpecFileRowCount, SpecIngestError};

/// Outcome of reading one batch of uploads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportIngest {
    /// Every upload name, in upload order.
    pub files_uploaded: Vec<String>,
    /// Row counts of every parsed file, accepted or not.
    pub files_parsed: Vec<SpecFileRowCount>,
    /// Parsed files whose column set differs from the reference file.
    pub files_mismatched: Vec<String>,
    /// Uploads with an unsupported extension.
    pub files_unsupported: Vec<String>,
    /// Per-file parse failures.
    pub errors: Vec<SpecIngestError>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl ReportIngest {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Number of files combined into the table.
    pub fn n_files_accepted(&self) -> usize {
        self.files_parsed.iter().filter(|f| f.if_accepted).count()
    }

    /// Row total of accepted files.
    pub fn n_rows_accepted(&self) -> usize {
        self.files_parsed
            .iter()
            .filter(|f| f.if_accepted)
            .map(|f| f.n_rows)
            .sum()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_uploaded".to_string(), self.files_uploaded.len() as u64);
        dict_counts.insert("cnt_parsed".to_string(), self.files_parsed.len() as u64);
        dict_counts.insert("cnt_accepted".to_string(), self.n_files_accepted() as u64);
        dict_counts.insert(
            "cnt_mismatched".to_string(),
            self.files_mismatched.len() as u64,
        );
        dict_counts.insert(
            "cnt_unsupported".to_string(),
            self.files_unsupported.len() as u64,
        );
        dict_counts.insert("cnt_rows".to_string(), self.n_rows_accepted() as u64);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} uploaded={} parsed={} accepted={} mismatched={} unsupported={} rows={} errors={} warnings={}",
            dict_counts["cnt_uploaded"],
            dict_counts["cnt_parsed"],
            dict_counts["cnt_accepted"],
            dict_counts["cnt_mismatched"],
            dict_counts["cnt_unsupported"],
            dict_counts["cnt_rows"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportIngest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[INGEST]"))
    }
}

/// Mutable accumulator for [`ReportIngest`].
#[derive(Debug, Default, Clone)]
pub struct ReportIngestBuilder {
    report: ReportIngest,
}

impl ReportIngestBuilder {
    pub fn add_uploaded(&mut self, file_name: &str) {
        self.report.files_uploaded.push(file_name.to_string());
    }

    pub fn add_parsed(&mut self, file_name: &str, n_rows: usize, if_accepted: bool) {
        self.report.files_parsed.push(SpecFileRowCount {
            file_name: file_name.to_string(),
            n_rows,
            if_accepted,
        });
        if !if_accepted {
            self.report.files_mismatched.push(file_name.to_string());
        }
    }

    pub fn add_unsupported(&mut self, file_name: &str) {
        self.report.files_unsupported.push(file_name.to_string());
        self.add_warning(format!("File type of {file_name} is not supported."));
    }

    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    pub fn add_error(&mut self, file_name: &str, exception: String) {
        self.report.errors.push(SpecIngestError {
            file_name: file_name.to_string(),
            exception,
        });
    }

    pub fn build(self) -> ReportIngest {
        self.report
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportClean {
    pub n_rows_input: usize,
    pub n_rows_output: usize,
    /// Steps whose guard column(s) were present, in order.
    pub steps_applied: Vec<EnumCleanStep>,
    /// Rows dropped per filter step.
    pub rows_dropped: Vec<(EnumCleanStep, usize)>,
    /// Columns created by tag expansion.
    pub columns_added: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReportClean {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn format(&self, prefix: &str) -> String {
        let c_steps = self
            .steps_applied
            .iter()
            .map(|step| step.name())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{prefix} rows_in={} rows_out={} steps=[{c_steps}] columns_added={} warnings={}",
            self.n_rows_input,
            self.n_rows_output,
            self.columns_added.len(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportClean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[CLEAN]"))
    }
}
