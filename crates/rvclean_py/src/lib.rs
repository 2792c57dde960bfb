use std::collections::BTreeMap;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use rvclean_clean::{
    EnumCellValue, EnumSessionAction, ReportIngest, Session, SpecCleanOptions, SpecColumnControl,
    SpecMessage, SpecUpload,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "rvclean.session.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "SpecMessage")]
#[derive(Debug, Clone)]
struct PySpecMessage {
    #[pyo3(get)]
    level: String,
    #[pyo3(get)]
    text: String,
}

impl From<SpecMessage> for PySpecMessage {
    fn from(message: SpecMessage) -> Self {
        Self {
            level: message.level.as_str().to_string(),
            text: message.text,
        }
    }
}

#[pymethods]
impl PySpecMessage {
    fn __repr__(&self) -> String {
        format!("SpecMessage(level={:?}, text={:?})", self.level, self.text)
    }
}

#[pyclass(name = "SpecColumnControl")]
#[derive(Debug, Clone)]
struct PySpecColumnControl {
    #[pyo3(get)]
    column: String,
    #[pyo3(get)]
    if_checked: bool,
    #[pyo3(get)]
    display_name: String,
}

impl From<SpecColumnControl> for PySpecColumnControl {
    fn from(control: SpecColumnControl) -> Self {
        Self {
            column: control.column,
            if_checked: control.if_checked,
            display_name: control.display_name,
        }
    }
}

#[pyclass(name = "ReportIngest")]
#[derive(Debug, Clone)]
struct PyReportIngest {
    #[pyo3(get)]
    files_uploaded: Vec<String>,
    /// `(file_name, n_rows, if_accepted)` per parsed file.
    #[pyo3(get)]
    files_parsed: Vec<(String, usize, bool)>,
    #[pyo3(get)]
    files_mismatched: Vec<String>,
    #[pyo3(get)]
    files_unsupported: Vec<String>,
    /// `(file_name, exception)` per parse failure.
    #[pyo3(get)]
    errors: Vec<(String, String)>,
    #[pyo3(get)]
    warnings: Vec<String>,
    inner: ReportIngest,
}

impl From<ReportIngest> for PyReportIngest {
    fn from(report: ReportIngest) -> Self {
        Self {
            files_uploaded: report.files_uploaded.clone(),
            files_parsed: report
                .files_parsed
                .iter()
                .map(|f| (f.file_name.clone(), f.n_rows, f.if_accepted))
                .collect(),
            files_mismatched: report.files_mismatched.clone(),
            files_unsupported: report.files_unsupported.clone(),
            errors: report
                .errors
                .iter()
                .map(|e| (e.file_name.clone(), e.exception.clone()))
                .collect(),
            warnings: report.warnings.clone(),
            inner: report,
        }
    }
}

#[pymethods]
impl PyReportIngest {
    #[getter]
    fn error_count(&self) -> usize {
        self.inner.error_count()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.inner.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = "[INGEST]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

/// One interactive cleaning session; hold one per UI user.
#[pyclass(name = "CleanSession")]
struct PyCleanSession {
    inner: Session,
}

impl PyCleanSession {
    fn run(&mut self, py: Python<'_>, action: EnumSessionAction) -> Vec<PySpecMessage> {
        let l_messages = py.allow_threads(|| self.inner.handle(action).to_vec());
        l_messages.into_iter().map(PySpecMessage::from).collect()
    }
}

#[pymethods]
impl PyCleanSession {
    #[new]
    #[pyo3(signature = (config_toml = None))]
    fn new(config_toml: Option<&str>) -> PyResult<Self> {
        let options = match config_toml {
            Some(c_text) => toml::from_str::<SpecCleanOptions>(c_text)
                .map_err(|err| PyValueError::new_err(format!("Invalid config: {err}")))?,
            None => SpecCleanOptions::default(),
        };
        Ok(Self {
            inner: Session::new(options),
        })
    }

    /// Ingest `(file_name, bytes)` pairs; resets cleaning and selection.
    fn submit(&mut self, py: Python<'_>, files: Vec<(String, Vec<u8>)>) -> Vec<PySpecMessage> {
        let uploads = files
            .into_iter()
            .map(|(file_name, bytes)| SpecUpload::new(file_name, bytes))
            .collect();
        self.run(py, EnumSessionAction::Submit(uploads))
    }

    fn clean(&mut self, py: Python<'_>) -> Vec<PySpecMessage> {
        self.run(py, EnumSessionAction::Clean)
    }

    fn set_column_checked(
        &mut self,
        py: Python<'_>,
        column: String,
        if_checked: bool,
    ) -> Vec<PySpecMessage> {
        self.run(py, EnumSessionAction::SetColumnChecked { column, if_checked })
    }

    fn set_column_name(
        &mut self,
        py: Python<'_>,
        column: String,
        display_name: String,
    ) -> Vec<PySpecMessage> {
        self.run(
            py,
            EnumSessionAction::SetColumnName {
                column,
                display_name,
            },
        )
    }

    #[getter]
    fn if_files_appended(&self) -> bool {
        self.inner.if_files_appended()
    }

    #[getter]
    fn if_cleaning_applied(&self) -> bool {
        self.inner.if_cleaning_applied()
    }

    #[getter]
    fn n_rows_combined(&self) -> Option<usize> {
        self.inner.table_combined().map(|t| t.height())
    }

    #[getter]
    fn n_rows_cleaned(&self) -> Option<usize> {
        self.inner.table_cleaned().map(|t| t.height())
    }

    /// Messages of the last action.
    fn messages(&self) -> Vec<PySpecMessage> {
        self.inner
            .messages()
            .iter()
            .cloned()
            .map(PySpecMessage::from)
            .collect()
    }

    fn report_ingest(&self) -> Option<PyReportIngest> {
        self.inner.report_ingest().cloned().map(PyReportIngest::from)
    }

    /// Column controls in cleaned column order (empty before cleaning).
    fn columns(&self) -> Vec<PySpecColumnControl> {
        let Some(table) = self.inner.table_cleaned() else {
            return Vec::new();
        };
        self.inner
            .selection()
            .controls(table.columns())
            .into_iter()
            .map(PySpecColumnControl::from)
            .collect()
    }

    /// `(columns, rows)` of the renamed preview, cells as text or `None`.
    #[allow(clippy::type_complexity)]
    fn preview(&self, py: Python<'_>) -> Option<(Vec<String>, Vec<Vec<Option<String>>>)> {
        let view = py.allow_threads(|| self.inner.render());
        let (columns, rows) = view.preview?.into_parts();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|value| match value {
                        EnumCellValue::None => None,
                        value => Some(value.to_text()),
                    })
                    .collect()
            })
            .collect();
        Some((columns, rows))
    }

    /// Render-time messages (selection warnings, export problems).
    fn render_messages(&self, py: Python<'_>) -> Vec<PySpecMessage> {
        let view = py.allow_threads(|| self.inner.render());
        view.messages.into_iter().map(PySpecMessage::from).collect()
    }

    /// `(file_name, mime, bytes)` of a fresh export, `None` when nothing is selectable.
    fn export_bytes<'py>(
        &self,
        py: Python<'py>,
    ) -> PyResult<Option<(String, String, Bound<'py, PyBytes>)>> {
        let view = py.allow_threads(|| self.inner.render());
        if let Some(message) = view
            .messages
            .iter()
            .find(|m| m.level == rvclean_clean::EnumMessageLevel::Error)
        {
            return Err(PyRuntimeError::new_err(message.text.clone()));
        }
        Ok(view.export.map(|artifact| {
            (
                artifact.file_name,
                artifact.mime,
                PyBytes::new(py, &artifact.bytes),
            )
        }))
    }
}

/// Canonical options as TOML text.
#[pyfunction(name = "default_config_toml")]
fn default_config_toml_py() -> PyResult<String> {
    toml::to_string_pretty(&SpecCleanOptions::default())
        .map_err(|err| PyRuntimeError::new_err(format!("Failed to serialize options: {err}")))
}

#[pymodule]
fn _rvclean_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySpecMessage>()?;
    module.add_class::<PySpecColumnControl>()?;
    module.add_class::<PyReportIngest>()?;
    module.add_class::<PyCleanSession>()?;
    module.add_function(wrap_pyfunction!(default_config_toml_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
