pub mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpGraphService;

use async_trait::async_trait;
use tessera_common::config::DEFAULT_RESULT_LIMIT;
use tessera_common::{
    NodeInfo, PropertyLabels, PropertyTypeRequest, PropertyValueRequest, PropertyValueResponse,
    QueryRequest, QueryResponse, SaveTableRequest, SavedTable, Triple,
};
use crate::error::GraphResult;

/// Request/response collaborator in front of the remote knowledge graph.
///
/// Implementations only move data; caching, deduplication and error
/// re-labelling happen in `Node` and `TableView`.
#[async_trait]
pub trait GraphService: Send + Sync {
    async fn get_node(&self, dcid: &str) -> GraphResult<NodeInfo>;

    async fn get_property_labels(&self, dcid: &str) -> GraphResult<PropertyLabels>;

    async fn get_property_values(&self, req: &PropertyValueRequest) -> GraphResult<PropertyValueResponse>;

    async fn get_triples(&self, dcid: &str) -> GraphResult<Vec<Triple>>;

    /// Runs a serialized conjunctive query. `req.rows` caps the result size.
    async fn query(&self, req: &QueryRequest) -> GraphResult<QueryResponse>;

    /// Range of `property` for subjects of `subject_type`, or its domain
    /// when the edge is incoming. `None` when the schema does not say.
    async fn property_type(&self, req: &PropertyTypeRequest) -> GraphResult<Option<String>>;

    /// Fails with `GraphError::NotFound` when nothing is stored under `name`.
    async fn read_table(&self, name: &str) -> GraphResult<SavedTable>;

    /// Returns the storage key the table was saved under.
    async fn save_table(&self, req: &SaveTableRequest) -> GraphResult<String>;

    /// Database path forwarded with queries, if the transport is configured with one.
    fn db_path(&self) -> Option<String> {
        None
    }

    /// Limit applied to property lookups that do not ask for one.
    fn default_limit(&self) -> usize {
        DEFAULT_RESULT_LIMIT
    }
}
