// Column-oriented row store behind TableView.
//
// Cells are strings; a missing cell never reaches the store (query rows with
// missing values are dropped, join gaps are filled with a caller value).

pub mod expand;
pub mod join;
pub mod view;

pub use expand::Expansion;
pub use join::JoinMode;
pub use view::{ExportFormat, QueryOptions, TableView};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use crate::error::{GraphError, GraphResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// Uniform-length named columns with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<Column>,
}

/// Wire shape of `Table` before its invariants are checked.
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for Table {
    type Error = GraphError;

    fn try_from(raw: RawTable) -> GraphResult<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = raw.columns.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Err(GraphError::ColumnExists(dup.name.clone()));
        }

        let rows = raw.columns.first().map_or(0, |c| c.values.len());
        if let Some(ragged) = raw.columns.iter().find(|c| c.values.len() != rows) {
            return Err(GraphError::InvalidArgument(format!(
                "column {} has {} values, expected {}",
                ragged.name,
                ragged.values.len(),
                rows
            )));
        }

        Ok(Self { columns: raw.columns })
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a header and row-major cells.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> GraphResult<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = header.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(GraphError::ColumnExists(dup.clone()));
        }

        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(rows.len()),
            })
            .collect();

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(GraphError::InvalidArgument(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(cell);
            }
        }

        Ok(Self { columns })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|i| self.columns[i].values.as_slice())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// No columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }

    pub fn row(&self, index: usize) -> Row<'_> {
        Row { table: self, index }
    }

    /// Cells of one row in column order.
    pub fn row_values(&self, index: usize) -> Vec<&str> {
        self.columns.iter().map(|c| c.values[index].as_str()).collect()
    }

    /// Sets `name` to `values`, replacing an existing column in place or
    /// appending a new one. The length must match the current row count
    /// unless the table has no columns yet.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> GraphResult<()> {
        if !self.columns.is_empty() && values.len() != self.row_count() {
            return Err(GraphError::InvalidArgument(format!(
                "column {} has {} values, table has {} rows",
                name,
                values.len(),
                self.row_count()
            )));
        }

        match self.position(name) {
            Some(i) => self.columns[i].values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Vec<String>> {
        let i = self.position(name)?;
        Some(self.columns.remove(i).values)
    }

    /// Renames columns per `labels`; columns not in the map keep their name.
    pub fn rename(&mut self, labels: &HashMap<String, String>) -> GraphResult<()> {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| labels.get(&c.name).cloned().unwrap_or_else(|| c.name.clone()))
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = renamed.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(GraphError::ColumnExists(dup.clone()));
        }

        for (column, name) in self.columns.iter_mut().zip(renamed) {
            column.name = name;
        }
        Ok(())
    }

    /// Copy restricted to `names`, in the given order.
    pub fn select(&self, names: &[String]) -> GraphResult<Table> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let i = self
                .position(name)
                .ok_or_else(|| GraphError::ColumnNotFound(name.clone()))?;
            columns.push(self.columns[i].clone());
        }
        Ok(Table { columns })
    }

    /// Keeps the rows whose entry in `keep` is true.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| flags.next().copied().unwrap_or(false));
        }
    }

    /// Appends a row; cells are in column order.
    pub(crate) fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.values.push(cell);
        }
    }

    /// Empty table with the given column names.
    pub(crate) fn with_header(header: Vec<String>) -> Self {
        Self {
            columns: header
                .into_iter()
                .map(|name| Column { name, values: Vec::new() })
                .collect(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Borrowed view of a single row, indexed by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table
            .column(column)
            .and_then(|values| values.get(self.index))
            .map(String::as_str)
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample() -> Table {
        Table::from_rows(
            strings(&["city", "state"]),
            vec![strings(&["a", "CA"]), strings(&["b", "CA"]), strings(&["c", "NV"])],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_shape() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.width(), 2);
        assert_eq!(table.column("state").unwrap(), strings(&["CA", "CA", "NV"]).as_slice());
        assert_eq!(table.row_values(2), vec!["c", "NV"]);
        assert_eq!(table.row(1).get("city"), Some("b"));
        assert_eq!(table.row(1).get("missing"), None);
    }

    #[test]
    fn test_from_rows_rejects_ragged_and_duplicate_header() {
        let ragged = Table::from_rows(strings(&["a", "b"]), vec![strings(&["x"])]);
        assert!(matches!(ragged, Err(GraphError::InvalidArgument(_))));

        let dup = Table::from_rows(strings(&["a", "a"]), vec![]);
        assert!(matches!(dup, Err(GraphError::ColumnExists(_))));
    }

    #[test]
    fn test_empty_variants() {
        assert!(Table::new().is_empty());
        assert!(Table::with_header(strings(&["a"])).is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_set_column_length_checked() {
        let mut table = sample();
        assert!(table.set_column("pop", strings(&["1", "2"])).is_err());

        table.set_column("pop", strings(&["1", "2", "3"])).unwrap();
        table.set_column("state", strings(&["X", "Y", "Z"])).unwrap();
        assert_eq!(table.column_names(), strings(&["city", "state", "pop"]));
        assert_eq!(table.column("state").unwrap()[2], "Z");

        // First column of an empty table sets the row count
        let mut fresh = Table::new();
        fresh.set_column("a", strings(&["1", "2"])).unwrap();
        assert_eq!(fresh.row_count(), 2);
    }

    #[test]
    fn test_rename_and_collisions() {
        let mut table = sample();
        let labels: HashMap<String, String> = [("city".to_string(), "City".to_string())].into_iter().collect();
        table.rename(&labels).unwrap();
        assert_eq!(table.column_names(), strings(&["City", "state"]));

        let clash: HashMap<String, String> = [("City".to_string(), "state".to_string())].into_iter().collect();
        assert!(matches!(table.rename(&clash), Err(GraphError::ColumnExists(_))));
        // Failed rename leaves names untouched
        assert_eq!(table.column_names(), strings(&["City", "state"]));
    }

    #[test]
    fn test_select_and_retain() {
        let mut table = sample();
        let projected = table.select(&strings(&["state"])).unwrap();
        assert_eq!(projected.width(), 1);
        assert!(matches!(table.select(&strings(&["nope"])), Err(GraphError::ColumnNotFound(_))));

        table.retain_rows(&[true, false, true]);
        assert_eq!(table.column("city").unwrap(), strings(&["a", "c"]).as_slice());
        assert_eq!(table.drop_column("city"), Some(strings(&["a", "c"])));
        assert_eq!(table.width(), 1);
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let json = serde_json::to_string(&sample()).unwrap();
        let decoded: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, sample());

        let ragged = r#"{"columns": [{"name": "a", "values": ["1", "2"]}, {"name": "b", "values": ["x"]}]}"#;
        assert!(serde_json::from_str::<Table>(ragged).is_err());

        let dup = r#"{"columns": [{"name": "a", "values": ["1"]}, {"name": "a", "values": ["2"]}]}"#;
        let err = serde_json::from_str::<Table>(dup).unwrap_err();
        assert!(err.to_string().contains("Column already exists"));
    }
}
