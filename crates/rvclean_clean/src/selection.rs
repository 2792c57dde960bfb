//! Persistent per-column check state and display names.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::spec::{CleanError, SpecCleanOptions, SpecColumnControl, SpecColumnState};
use crate::table::Table;
use crate::util::normalize_header_name;

/// Column choices keyed by cleaned column name.
///
/// A column's state is created the first time the column is seen and is
/// never reset by later syncs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    dict_states: BTreeMap<String, SpecColumnState>,
}

impl ColumnSelection {
    /// Initialize state for columns seen for the first time.
    ///
    /// Returns how many columns were newly initialized.
    pub fn sync_columns(&mut self, columns: &[String], options: &SpecCleanOptions) -> usize {
        let set_checked: BTreeSet<String> = options
            .columns_default_checked
            .iter()
            .map(|c| normalize_header_name(c))
            .collect();
        let dict_names: BTreeMap<String, &String> = options
            .column_names_default
            .iter()
            .map(|(c_col, c_name)| (normalize_header_name(c_col), c_name))
            .collect();

        let mut n_new = 0;
        for c_col in columns {
            if self.dict_states.contains_key(c_col) {
                continue;
            }
            let display_name = dict_names
                .get(c_col)
                .map(|c_name| c_name.to_string())
                .unwrap_or_else(|| c_col.clone());
            self.dict_states.insert(
                c_col.clone(),
                SpecColumnState {
                    if_checked: set_checked.contains(c_col),
                    display_name,
                },
            );
            n_new += 1;
        }
        debug!(new = n_new, total = self.dict_states.len(), "sync_columns");
        n_new
    }

    pub fn state(&self, column: &str) -> Option<&SpecColumnState> {
        self.dict_states.get(column)
    }

    pub fn set_checked(&mut self, column: &str, if_checked: bool) -> Result<(), CleanError> {
        let state = self
            .dict_states
            .get_mut(column)
            .ok_or_else(|| CleanError::UnknownColumn(column.to_string()))?;
        state.if_checked = if_checked;
        Ok(())
    }

    pub fn set_display_name(&mut self, column: &str, display_name: &str) -> Result<(), CleanError> {
        let state = self
            .dict_states
            .get_mut(column)
            .ok_or_else(|| CleanError::UnknownColumn(column.to_string()))?;
        state.display_name = display_name.to_string();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.dict_states.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.dict_states.is_empty()
    }

    /// Controls for `columns`, in that order.
    pub fn controls(&self, columns: &[String]) -> Vec<SpecColumnControl> {
        columns
            .iter()
            .filter_map(|c_col| {
                self.dict_states.get(c_col).map(|state| SpecColumnControl {
                    column: c_col.clone(),
                    if_checked: state.if_checked,
                    display_name: state.display_name.clone(),
                })
            })
            .collect()
    }

    /// Checked columns of `table`, in table order, renamed.
    pub fn project(&self, table: &Table) -> Result<Table, CleanError> {
        let mut l_idx = Vec::new();
        let mut l_names = Vec::new();
        for (n_idx, c_col) in table.columns().iter().enumerate() {
            if let Some(state) = self.dict_states.get(c_col)
                && state.if_checked
            {
                l_idx.push(n_idx);
                l_names.push(state.display_name.clone());
            }
        }
        if l_idx.is_empty() {
            return Err(CleanError::NoColumnsSelected);
        }

        let mut set_seen = BTreeSet::new();
        let mut set_dup = BTreeSet::new();
        for c_name in &l_names {
            if !set_seen.insert(c_name.as_str()) {
                set_dup.insert(c_name.as_str());
            }
        }
        if !set_dup.is_empty() {
            let c_dup = set_dup.into_iter().collect::<Vec<_>>().join(", ");
            return Err(CleanError::DuplicateDisplayNames(c_dup));
        }

        table.project(&l_idx, l_names)
    }
}

#[cfg(test)]
mod tests {
    use rvclean_io_xlsx::EnumCellValue;

    use super::*;
    use crate::conf::derive_default_clean_options;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|c| c.to_string()).collect()
    }

    fn cleaned() -> Table {
        let columns = cols(&["url", "title", "published", "engagement", "category"]);
        let row = columns
            .iter()
            .map(|c| EnumCellValue::String(format!("{c}-1")))
            .collect();
        Table::new(columns, vec![row]).expect("table")
    }

    #[test]
    fn test_defaults_follow_allow_list_and_rename_table() {
        let mut selection = ColumnSelection::default();
        let table = cleaned();
        assert_eq!(selection.sync_columns(table.columns(), &derive_default_clean_options()), 5);

        let l_controls = selection.controls(table.columns());
        let l_checked: Vec<_> = l_controls
            .iter()
            .filter(|c| c.if_checked)
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(l_checked, vec!["url", "date", "total_engagement", "category"]);
        assert_eq!(selection.state("title").map(|s| s.if_checked), Some(false));
    }

    #[test]
    fn test_sync_never_resets_touched_state() {
        let options = derive_default_clean_options();
        let mut selection = ColumnSelection::default();
        let table = cleaned();
        selection.sync_columns(table.columns(), &options);
        selection.set_checked("url", false).expect("known");
        selection.set_display_name("title", "headline").expect("known");

        assert_eq!(selection.sync_columns(table.columns(), &options), 0);
        assert_eq!(selection.state("url").map(|s| s.if_checked), Some(false));
        assert_eq!(
            selection.state("title").map(|s| s.display_name.as_str()),
            Some("headline")
        );
        assert!(selection.set_checked("nope", true).is_err());
    }

    #[test]
    fn test_project_keeps_table_order_and_renames() {
        let mut selection = ColumnSelection::default();
        let table = cleaned();
        selection.sync_columns(table.columns(), &derive_default_clean_options());
        let projected = selection.project(&table).expect("project");
        assert_eq!(
            projected.columns(),
            &["url", "date", "total_engagement", "category"][..]
        );
        assert_eq!(
            projected.cell(0, "date"),
            Some(&EnumCellValue::String("published-1".to_string()))
        );
    }

    #[test]
    fn test_project_rejects_empty_and_duplicate_selection() {
        let mut selection = ColumnSelection::default();
        let table = cleaned();
        selection.sync_columns(table.columns(), &derive_default_clean_options());
        selection.set_display_name("category", "url").expect("known");
        assert_eq!(
            selection.project(&table),
            Err(CleanError::DuplicateDisplayNames("url".to_string()))
        );

        for c_col in table.columns() {
            selection.set_checked(c_col, false).expect("known");
        }
        assert_eq!(selection.project(&table), Err(CleanError::NoColumnsSelected));
    }
}
