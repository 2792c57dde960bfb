//! Row-oriented table over a fixed, ordered column list.

use std::collections::BTreeSet;

use rvclean_io_xlsx::EnumCellValue;

use crate::spec::CleanError;

/// Ordered rows over a fixed column schema.
///
/// Every row holds exactly `columns.len()` cells and column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<EnumCellValue>>,
}

impl Table {
    /// Build a table, validating row widths and column uniqueness.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<EnumCellValue>>) -> Result<Self, CleanError> {
        let mut set_seen = BTreeSet::new();
        for c_name in &columns {
            if !set_seen.insert(c_name.as_str()) {
                return Err(CleanError::DuplicateColumn(c_name.clone()));
            }
        }
        if let Some(n_idx) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(CleanError::RaggedRow {
                row: n_idx,
                found: rows[n_idx].len(),
                expected: columns.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }

    /// Unordered column-name set, used for schema comparison.
    pub fn column_set(&self) -> BTreeSet<String> {
        self.columns.iter().cloned().collect()
    }

    /// Cell at (`row`, `column`), `None` when either is missing.
    pub fn cell(&self, row: usize, column: &str) -> Option<&EnumCellValue> {
        let n_idx_col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[n_idx_col])
    }

    /// All cells of one column in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&EnumCellValue>> {
        let n_idx_col = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[n_idx_col]).collect())
    }

    /// Keep rows for which `predicate(cell_of_column)` holds.
    ///
    /// Returns the number of dropped rows, or `None` when `column` is absent.
    pub fn retain_rows_by<F>(&mut self, column: &str, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&EnumCellValue) -> bool,
    {
        let n_idx_col = self.column_index(column)?;
        let n_rows_before = self.rows.len();
        self.rows.retain(|row| predicate(&row[n_idx_col]));
        Some(n_rows_before - self.rows.len())
    }

    /// Replace every cell of `column` with `f(cell)`. Returns `false` when absent.
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> bool
    where
        F: FnMut(&EnumCellValue) -> EnumCellValue,
    {
        let Some(n_idx_col) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            row[n_idx_col] = f(&row[n_idx_col]);
        }
        true
    }

    /// Overwrite `column` if present, append it otherwise.
    pub fn set_column(
        &mut self,
        column: &str,
        values: Vec<EnumCellValue>,
    ) -> Result<(), CleanError> {
        if values.len() != self.rows.len() {
            return Err(CleanError::ColumnLength {
                column: column.to_string(),
                found: values.len(),
                expected: self.rows.len(),
            });
        }
        match self.column_index(column) {
            Some(n_idx_col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[n_idx_col] = value;
                }
            }
            None => {
                self.columns.push(column.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Rename all columns at once (same length, unique names).
    pub fn set_column_names(&mut self, columns: Vec<String>) -> Result<(), CleanError> {
        if columns.len() != self.columns.len() {
            return Err(CleanError::ColumnLength {
                column: "<header>".to_string(),
                found: columns.len(),
                expected: self.columns.len(),
            });
        }
        let mut set_seen = BTreeSet::new();
        for c_name in &columns {
            if !set_seen.insert(c_name.as_str()) {
                return Err(CleanError::DuplicateColumn(c_name.clone()));
            }
        }
        self.columns = columns;
        Ok(())
    }

    /// Reorder columns to `columns` (same set, any order).
    pub fn reorder_to(self, columns: &[String]) -> Result<Table, CleanError> {
        let mut l_idx = Vec::with_capacity(columns.len());
        for c_name in columns {
            let n_idx_col = self
                .column_index(c_name)
                .ok_or_else(|| CleanError::UnknownColumn(c_name.clone()))?;
            l_idx.push(n_idx_col);
        }
        if l_idx.len() != self.columns.len() {
            return Err(CleanError::ColumnLength {
                column: "<header>".to_string(),
                found: columns.len(),
                expected: self.columns.len(),
            });
        }
        if l_idx.iter().enumerate().all(|(n_pos, n_idx)| n_pos == *n_idx) {
            return Ok(self);
        }
        let rows = self
            .rows
            .into_iter()
            .map(|row| l_idx.iter().map(|n_idx| row[*n_idx].clone()).collect())
            .collect();
        Ok(Table {
            columns: columns.to_vec(),
            rows,
        })
    }

    /// Project columns by position, naming them `names`.
    pub fn project(&self, l_idx: &[usize], names: Vec<String>) -> Result<Table, CleanError> {
        let rows = self
            .rows
            .iter()
            .map(|row| l_idx.iter().map(|n_idx| row[*n_idx].clone()).collect())
            .collect();
        Table::new(names, rows)
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Append rows of a table with identical column order.
    pub fn extend_rows(&mut self, other: Table) -> Result<(), CleanError> {
        if other.columns != self.columns {
            return Err(CleanError::UnknownColumn(other.columns.join(",")));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<EnumCellValue>>) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> EnumCellValue {
        EnumCellValue::String(v.to_string())
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_new_rejects_ragged_rows_and_duplicate_columns() {
        assert!(matches!(
            Table::new(cols(&["a", "b"]), vec![vec![s("x")]]),
            Err(CleanError::RaggedRow { row: 0, found: 1, expected: 2 })
        ));
        assert!(matches!(
            Table::new(cols(&["a", "a"]), vec![]),
            Err(CleanError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_reorder_to_realigns_cells() {
        let table = Table::new(cols(&["a", "b"]), vec![vec![s("1"), s("2")]]).expect("table");
        let table = table.reorder_to(&cols(&["b", "a"])).expect("reorder");
        assert_eq!(table.columns(), &cols(&["b", "a"])[..]);
        assert_eq!(table.rows()[0], vec![s("2"), s("1")]);
    }

    #[test]
    fn test_set_column_overwrites_or_appends() {
        let mut table = Table::new(cols(&["a"]), vec![vec![s("1")], vec![s("2")]]).expect("t");
        table.set_column("a", vec![s("x"), s("y")]).expect("overwrite");
        table.set_column("b", vec![s("p"), s("q")]).expect("append");
        assert_eq!(table.columns(), &cols(&["a", "b"])[..]);
        assert_eq!(table.cell(1, "a"), Some(&s("y")));
        assert_eq!(table.cell(0, "b"), Some(&s("p")));
        assert!(table.set_column("c", vec![s("only one")]).is_err());
    }

    #[test]
    fn test_retain_rows_by_reports_dropped_count() {
        let mut table =
            Table::new(cols(&["k"]), vec![vec![s("keep")], vec![s("drop")]]).expect("t");
        let n_dropped = table.retain_rows_by("k", |v| v.as_str() == Some("keep"));
        assert_eq!(n_dropped, Some(1));
        assert_eq!(table.height(), 1);
        assert_eq!(table.retain_rows_by("missing", |_| true), None);
    }
}
