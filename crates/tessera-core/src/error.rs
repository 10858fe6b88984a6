use thiserror::Error;

/// Errors surfaced by nodes, table views and the graph service transport.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Column already exists: {0}")]
    ColumnExists(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Missing persisted artifact
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Column type mismatch for {column}. Current: {current}, given: {given}")]
    TypeMismatch {
        column: String,
        current: String,
        given: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("Failed to persist table: {0}")]
    Persist(String),

    #[error("Failed to read table: {0}")]
    Io(String),

    /// Non-success status returned by the graph service
    #[error("Graph service error ({status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
