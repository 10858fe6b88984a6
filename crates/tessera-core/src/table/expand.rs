// Expansion Engine - derive a new column by following a property from an
// identifier column, then left-join the results back in.

use std::collections::HashSet;
use tessera_common::config::DEFAULT_QUERY_ROWS;
use tessera_common::{Direction, PropertyTypeRequest, TEXT_TYPE};
use super::{JoinMode, QueryOptions, TableView};
use crate::error::{GraphError, GraphResult};
use crate::query::{DatalogQuery, Term};

const SEED_NODE_VAR: &str = "?node";
// Result variables are fixed so column names never collide in the query
const SEED_VAR: &str = "?seed";
const VALUE_VAR: &str = "?value";

/// Parameters for `TableView::expand`.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub property: String,
    pub seed_column: String,
    pub new_column: String,
    /// Looked up from the schema when unset.
    pub new_column_type: Option<String>,
    pub direction: Direction,
    pub rows: usize,
}

impl Expansion {
    /// Seed entities are the subjects of `property`.
    pub fn outgoing(property: &str, seed_column: &str, new_column: &str) -> Self {
        Self {
            property: property.to_string(),
            seed_column: seed_column.to_string(),
            new_column: new_column.to_string(),
            new_column_type: None,
            direction: Direction::Outgoing,
            rows: DEFAULT_QUERY_ROWS,
        }
    }

    /// Seed entities are the objects of `property`.
    pub fn incoming(property: &str, seed_column: &str, new_column: &str) -> Self {
        Self {
            direction: Direction::Incoming,
            ..Self::outgoing(property, seed_column, new_column)
        }
    }

    pub fn column_type(mut self, value_type: impl Into<String>) -> Self {
        self.new_column_type = Some(value_type.into());
        self
    }

    pub fn rows(mut self, n: usize) -> Self {
        self.rows = n;
        self
    }
}

impl TableView {
    /// Adds `expansion.new_column` holding the values reached from each
    /// entity in the seed column through `expansion.property`.
    ///
    /// An outgoing expansion with no resolvable type falls back to `Text`;
    /// an incoming one fails, since the domain of an incoming edge cannot
    /// always be inferred.
    pub async fn expand(&mut self, expansion: &Expansion) -> GraphResult<()> {
        let seed_column = &expansion.seed_column;
        let new_column = &expansion.new_column;

        let seed_type = match (self.table.column(seed_column), self.type_of(seed_column)) {
            (Some(_), Some(t)) => t.to_string(),
            _ => {
                return Err(GraphError::InvalidArgument(format!(
                    "{} is not a valid seed column",
                    seed_column
                )))
            }
        };
        if self.table.has_column(new_column) {
            return Err(GraphError::ColumnExists(new_column.clone()));
        }
        if seed_type == TEXT_TYPE {
            return Err(GraphError::InvalidArgument(format!(
                "{} must contain dcids",
                seed_column
            )));
        }

        let new_type = match &expansion.new_column_type {
            Some(t) => Some(t.clone()),
            None => {
                let req = PropertyTypeRequest {
                    subject_type: seed_type.clone(),
                    property: expansion.property.clone(),
                    outgoing: expansion.direction.is_outgoing(),
                };
                self.service.property_type(&req).await?
            }
        };
        let new_type = match (new_type, expansion.direction) {
            (Some(t), _) => t,
            (None, Direction::Outgoing) => TEXT_TYPE.to_string(),
            (None, Direction::Incoming) => {
                return Err(GraphError::Schema(format!(
                    "{} does not have incoming property {}",
                    seed_type, expansion.property
                )))
            }
        };

        let mut seen = HashSet::new();
        let dcids: Vec<String> = self
            .table
            .column(seed_column)
            .unwrap_or_default()
            .iter()
            .filter(|v| !v.is_empty() && seen.insert(v.as_str()))
            .cloned()
            .collect();

        if dcids.is_empty() {
            tracing::info!("Seed column {} has no entries; {} left empty", seed_column, new_column);
            let blanks = vec![String::new(); self.table.row_count()];
            return self.add_column(new_column, &new_type, blanks);
        }

        let property = Term::Const(expansion.property.clone());

        let mut query = DatalogQuery::new()
            .select(SEED_VAR)
            .select(VALUE_VAR)
            .constraint(SEED_NODE_VAR, "typeOf", Term::Const(seed_type.clone()))
            .constraint(SEED_NODE_VAR, "dcid", Term::List(dcids))
            .constraint(SEED_NODE_VAR, "dcid", SEED_VAR);
        query = match expansion.direction {
            Direction::Outgoing => query.constraint(SEED_NODE_VAR, property, VALUE_VAR),
            Direction::Incoming => query.constraint(VALUE_VAR, property, SEED_NODE_VAR),
        };

        let options = QueryOptions::new()
            .rows(expansion.rows)
            .label(SEED_VAR, seed_column.clone())
            .label(VALUE_VAR, new_column.clone())
            .type_hint(SEED_VAR, seed_type)
            .type_hint(VALUE_VAR, new_type);

        tracing::info!(
            "Expanding {} via {} ({}) into {}",
            seed_column,
            expansion.property,
            expansion.direction.as_str(),
            new_column
        );
        let derived = TableView::from_query(self.service.clone(), &query, options).await?;
        self.merge(&derived, JoinMode::Left, "")
    }
}
