// In-memory GraphService used by the node and table tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tessera_common::{
    Direction, NodeEntry, NodeInfo, PropertyLabels, PropertyTypeRequest, PropertyValueRequest,
    PropertyValueResponse, QueryRequest, QueryResponse, SaveTableRequest, SavedTable, Triple,
};
use super::GraphService;
use crate::error::{GraphError, GraphResult};

type QueryHandler = Box<dyn Fn(&QueryRequest) -> GraphResult<QueryResponse> + Send + Sync>;

#[derive(Default)]
pub(crate) struct FakeGraphService {
    pub nodes: HashMap<String, NodeInfo>,
    pub labels: HashMap<String, PropertyLabels>,
    pub triples: HashMap<String, Vec<Triple>>,
    pub values: HashMap<(String, String, Direction), Vec<NodeEntry>>,
    pub property_types: HashMap<(String, String, bool), String>,
    pub query_handler: Option<QueryHandler>,
    pub fail_saves: bool,
    tables: Mutex<HashMap<String, String>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    value_requests: Mutex<Vec<PropertyValueRequest>>,
    query_requests: Mutex<Vec<QueryRequest>>,
}

impl FakeGraphService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, dcid: &str, name: &str, types: &[&str]) -> Self {
        self.nodes.insert(
            dcid.to_string(),
            NodeInfo {
                name: Some(name.to_string()),
                types: Some(types.iter().map(|t| t.to_string()).collect()),
            },
        );
        self
    }

    pub fn with_values(mut self, dcid: &str, property: &str, direction: Direction, entries: Vec<NodeEntry>) -> Self {
        self.values
            .insert((dcid.to_string(), property.to_string(), direction), entries);
        self
    }

    pub fn with_property_type(mut self, subject_type: &str, property: &str, outgoing: bool, value_type: &str) -> Self {
        self.property_types.insert(
            (subject_type.to_string(), property.to_string(), outgoing),
            value_type.to_string(),
        );
        self
    }

    pub fn with_query_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&QueryRequest) -> GraphResult<QueryResponse> + Send + Sync + 'static,
    {
        self.query_handler = Some(Box::new(handler));
        self
    }

    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    pub fn value_requests(&self) -> Vec<PropertyValueRequest> {
        self.value_requests.lock().unwrap().clone()
    }

    pub fn query_requests(&self) -> Vec<QueryRequest> {
        self.query_requests.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &'static str) {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
    }
}

pub(crate) fn entity(dcid: &str, name: &str, types: &[&str]) -> NodeEntry {
    NodeEntry {
        dcid: Some(dcid.to_string()),
        value: None,
        name: Some(name.to_string()),
        types: Some(types.iter().map(|t| t.to_string()).collect()),
    }
}

pub(crate) fn literal(value: &str) -> NodeEntry {
    NodeEntry {
        value: Some(value.to_string()),
        ..NodeEntry::default()
    }
}

#[async_trait]
impl GraphService for FakeGraphService {
    async fn get_node(&self, dcid: &str) -> GraphResult<NodeInfo> {
        self.record("node");
        Ok(self.nodes.get(dcid).cloned().unwrap_or_default())
    }

    async fn get_property_labels(&self, dcid: &str) -> GraphResult<PropertyLabels> {
        self.record("property");
        Ok(self.labels.get(dcid).cloned().unwrap_or_default())
    }

    async fn get_property_values(&self, req: &PropertyValueRequest) -> GraphResult<PropertyValueResponse> {
        self.record("propertyvalue");
        self.value_requests.lock().unwrap().push(req.clone());

        let direction = Direction::from_outgoing(req.outgoing);
        let mut response = PropertyValueResponse::new();
        for dcid in &req.dcid {
            if let Some(entries) = self.values.get(&(dcid.clone(), req.property.clone(), direction)) {
                let page = entries
                    .iter()
                    .filter(|e| match (&req.value_type, &e.types) {
                        (Some(wanted), Some(types)) => types.contains(wanted),
                        (Some(_), None) => false,
                        (None, _) => true,
                    })
                    .take(req.limit)
                    .cloned()
                    .collect();
                response
                    .entry(dcid.clone())
                    .or_default()
                    .insert(req.property.clone(), page);
            }
        }
        Ok(response)
    }

    async fn get_triples(&self, dcid: &str) -> GraphResult<Vec<Triple>> {
        self.record("triples");
        Ok(self.triples.get(dcid).cloned().unwrap_or_default())
    }

    async fn query(&self, req: &QueryRequest) -> GraphResult<QueryResponse> {
        self.record("query");
        self.query_requests.lock().unwrap().push(req.clone());
        match &self.query_handler {
            Some(handler) => handler(req),
            None => Ok(QueryResponse::default()),
        }
    }

    async fn property_type(&self, req: &PropertyTypeRequest) -> GraphResult<Option<String>> {
        self.record("property_type");
        Ok(self
            .property_types
            .get(&(req.subject_type.clone(), req.property.clone(), req.outgoing))
            .cloned())
    }

    async fn read_table(&self, name: &str) -> GraphResult<SavedTable> {
        self.record("read_table");
        let tables = self.tables.lock().unwrap();
        let data = tables
            .get(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
        Ok(serde_json::from_str(data)?)
    }

    async fn save_table(&self, req: &SaveTableRequest) -> GraphResult<String> {
        self.record("save_table");
        if self.fail_saves {
            return Err(GraphError::Service {
                status: 503,
                body: "storage unavailable".into(),
            });
        }
        self.tables
            .lock()
            .unwrap()
            .insert(req.file_name.clone(), req.data.clone());
        Ok(req.file_name.clone())
    }

    fn db_path(&self) -> Option<String> {
        Some("test.graph".into())
    }
}
