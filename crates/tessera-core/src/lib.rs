pub mod error;
pub mod node;
pub mod query;
pub mod service;
pub mod table;

pub use error::{GraphError, GraphResult};
pub use node::{Node, NodeSpec, PropertyCache, ValueQuery};
pub use query::{DatalogQuery, Term};
pub use service::{GraphService, HttpGraphService};
pub use table::{ExportFormat, Expansion, JoinMode, QueryOptions, Table, TableView};

// Re-export common types for convenience
pub use tessera_common::{config::ServiceConfig, Direction, TEXT_TYPE};
