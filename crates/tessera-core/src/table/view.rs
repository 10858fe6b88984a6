use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tessera_common::config::DEFAULT_QUERY_ROWS;
use tessera_common::{QueryRequest, SaveTableRequest, SavedTable, TEXT_TYPE};
use super::{Row, Table};
use crate::error::{GraphError, GraphResult};
use crate::query::DatalogQuery;
use crate::service::GraphService;

type RowFilter = Box<dyn Fn(&Row<'_>) -> bool + Send + Sync>;
type PostProcess = Box<dyn FnOnce(Table) -> GraphResult<Table> + Send>;

/// How query results are shaped before they are frozen into a view.
///
/// Stages run in a fixed order: `filter` (sees original variable names),
/// then `post_process`, then `labels` (variable -> column renames).
pub struct QueryOptions {
    pub rows: usize,
    pub labels: HashMap<String, String>,
    /// Column types keyed by original variable name; wins over inferred types.
    pub type_hint: HashMap<String, String>,
    filter: Option<RowFilter>,
    post_process: Option<PostProcess>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_QUERY_ROWS,
            labels: HashMap::new(),
            type_hint: HashMap::new(),
            filter: None,
            post_process: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(mut self, n: usize) -> Self {
        self.rows = n;
        self
    }

    pub fn label(mut self, var: impl Into<String>, column: impl Into<String>) -> Self {
        self.labels.insert(var.into(), column.into());
        self
    }

    pub fn type_hint(mut self, var: impl Into<String>, value_type: impl Into<String>) -> Self {
        self.type_hint.insert(var.into(), value_type.into());
        self
    }

    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Row<'_>) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(f));
        self
    }

    /// Arbitrary transform of the row store. May add or drop columns.
    pub fn post_process<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Table) -> GraphResult<Table> + Send + 'static,
    {
        self.post_process = Some(Box::new(f));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    fn separator(&self) -> &'static str {
        match self {
            ExportFormat::Csv => ",",
            ExportFormat::Tsv => "\t",
        }
    }
}

/// Typed, column-oriented view over graph query results.
///
/// Every column in the row store has a recorded semantic type. Mutating
/// methods take `&mut self`; a view is owned by one caller at a time.
#[derive(Clone)]
pub struct TableView {
    pub(crate) service: Arc<dyn GraphService>,
    pub(crate) table: Table,
    pub(crate) col_types: HashMap<String, String>,
}

impl fmt::Debug for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableView")
            .field("table", &self.table)
            .field("col_types", &self.col_types)
            .finish()
    }
}

impl TableView {
    pub fn new(service: Arc<dyn GraphService>) -> Self {
        Self {
            service,
            table: Table::new(),
            col_types: HashMap::new(),
        }
    }

    /// Wraps an existing row store. Every column needs a type in `col_types`;
    /// types for absent columns are discarded.
    pub fn from_parts(
        service: Arc<dyn GraphService>,
        table: Table,
        mut col_types: HashMap<String, String>,
    ) -> GraphResult<Self> {
        if let Some(untyped) = table.column_names().into_iter().find(|c| !col_types.contains_key(c)) {
            return Err(GraphError::InvalidArgument(format!("column {} has no type", untyped)));
        }
        col_types.retain(|name, _| table.has_column(name));

        Ok(Self {
            service,
            table,
            col_types,
        })
    }

    /// Loads a view saved earlier with `save`.
    pub async fn from_cache(service: Arc<dyn GraphService>, name: &str) -> GraphResult<Self> {
        let saved = service.read_table(name).await.map_err(|e| match e {
            GraphError::NotFound(name) => GraphError::NotFound(name),
            other => GraphError::Io(format!("failed to read \"{}\": {}", name, other)),
        })?;

        let table: Table = serde_json::from_str(&saved.dataframe_blob)
            .map_err(|e| GraphError::Io(format!("failed to decode \"{}\": {}", name, e)))?;

        tracing::info!(
            "Loaded table \"{}\" ({} rows, {} columns)",
            name,
            table.row_count(),
            table.width()
        );
        Self::from_parts(service, table, saved.col_types)
    }

    /// Runs `query` and freezes the result into a view.
    ///
    /// Rows with missing cells are dropped. A column's type comes from the
    /// hint, else from the query's variable types, else from the service,
    /// else `Text`; only columns that survive `post_process` get one.
    pub async fn from_query(
        service: Arc<dyn GraphService>,
        query: &DatalogQuery,
        options: QueryOptions,
    ) -> GraphResult<Self> {
        let req = QueryRequest {
            query: query.to_string(),
            rows: options.rows,
            db_path: service.db_path(),
        };
        let response = service
            .query(&req)
            .await
            .map_err(|e| GraphError::QueryExecution(e.to_string()))?;

        let header = if response.header.is_empty() {
            query.variables().to_vec()
        } else {
            response.header
        };

        let total = response.rows.len();
        let complete: Vec<Vec<String>> = response
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().collect::<Option<Vec<String>>>())
            .collect();
        if complete.len() < total {
            tracing::warn!("Dropped {} rows with missing values", total - complete.len());
        }

        let mut table = Table::from_rows(header, complete)
            .map_err(|e| GraphError::QueryExecution(format!("malformed result: {}", e)))?;

        if let Some(filter) = &options.filter {
            let keep: Vec<bool> = (0..table.row_count()).map(|i| filter(&table.row(i))).collect();
            table.retain_rows(&keep);
        }
        if let Some(post_process) = options.post_process {
            table = post_process(table)?;
        }

        let var_types = query.var_types();
        let mut col_types = HashMap::new();
        for col in table.column_names() {
            let col_type = options
                .type_hint
                .get(&col)
                .or_else(|| var_types.get(&col))
                .or_else(|| response.types.get(&col))
                .cloned()
                .unwrap_or_else(|| TEXT_TYPE.to_string());
            let col_name = options.labels.get(&col).cloned().unwrap_or(col);
            col_types.insert(col_name, col_type);
        }
        table.rename(&options.labels)?;

        tracing::info!(
            "Query produced {} rows, {} columns",
            table.row_count(),
            table.width()
        );
        Self::from_parts(service, table, col_types)
    }

    pub fn service(&self) -> &Arc<dyn GraphService> {
        &self.service
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn columns(&self) -> Vec<String> {
        self.table.column_names()
    }

    pub fn types(&self) -> &HashMap<String, String> {
        &self.col_types
    }

    pub fn type_of(&self, column: &str) -> Option<&str> {
        self.col_types.get(column).map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.table.column(name)
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Sets a column and its type, overwriting any existing column of that name.
    pub fn add_column(&mut self, name: &str, col_type: &str, values: Vec<String>) -> GraphResult<()> {
        self.table.set_column(name, values)?;
        self.col_types.insert(name.to_string(), col_type.to_string());
        Ok(())
    }

    /// Renames columns and carries their types along.
    pub fn rename(&mut self, labels: &HashMap<String, String>) -> GraphResult<()> {
        self.table.rename(labels)?;

        let mut col_types = HashMap::with_capacity(self.col_types.len());
        for (name, col_type) in self.col_types.drain() {
            let name = labels.get(&name).cloned().unwrap_or(name);
            col_types.insert(name, col_type);
        }
        self.col_types = col_types;
        Ok(())
    }

    /// Copy limited to `columns`, or when none are given, to every column
    /// whose type is not `exclude_type`. An empty list counts as none.
    pub fn project(&self, columns: Option<&[String]>, exclude_type: Option<&str>) -> GraphResult<TableView> {
        let names: Vec<String> = match columns.filter(|c| !c.is_empty()) {
            Some(columns) => columns.to_vec(),
            None => self
                .table
                .column_names()
                .into_iter()
                .filter(|c| exclude_type.map_or(true, |t| self.type_of(c) != Some(t)))
                .collect(),
        };

        let table = self.table.select(&names)?;
        Self::from_parts(self.service.clone(), table, self.col_types.clone())
    }

    /// Delimited text with a header row. Cells containing the separator are
    /// written as-is. An empty `columns` list exports every column.
    pub fn export(&self, format: ExportFormat, columns: Option<&[String]>) -> GraphResult<String> {
        let table = match columns.filter(|c| !c.is_empty()) {
            Some(columns) => self.table.select(columns)?,
            None => self.table.clone(),
        };
        let sep = format.separator();

        let mut out = table.column_names().join(sep);
        out.push('\n');
        for i in 0..table.row_count() {
            out.push_str(&table.row_values(i).join(sep));
            out.push('\n');
        }
        Ok(out)
    }

    pub fn clear(&mut self) {
        self.table = Table::new();
        self.col_types.clear();
    }

    /// Persists rows and column types under `name`; returns the storage key.
    pub async fn save(&self, name: &str) -> GraphResult<String> {
        let saved = SavedTable {
            dataframe_blob: serde_json::to_string(&self.table)?,
            col_types: self.col_types.clone(),
        };
        let req = SaveTableRequest {
            data: serde_json::to_string(&saved)?,
            file_name: name.to_string(),
        };

        let key = self
            .service
            .save_table(&req)
            .await
            .map_err(|e| GraphError::Persist(e.to_string()))?;
        tracing::info!("Saved table \"{}\" as {}", name, key);
        Ok(key)
    }
}
