use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tessera_common::config::ServiceConfig;
use tessera_common::{
    NodeInfo, PropertyLabels, PropertyLabelsResponse, PropertyTypeRequest, PropertyTypeResponse,
    PropertyValueRequest, PropertyValueResponse, QueryRequest, QueryResponse, ReadTableRequest,
    SaveTableRequest, SaveTableResponse, SavedTable, Triple, TriplesResponse,
};
use super::GraphService;
use crate::error::{GraphError, GraphResult};

/// `GraphService` over the REST endpoints named in `ServiceConfig`.
pub struct HttpGraphService {
    client: Client,
    config: ServiceConfig,
}

impl HttpGraphService {
    pub fn new(config: ServiceConfig) -> Self {
        let client = match Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build HTTP client ({}); using defaults without timeout", e);
                Client::default()
            }
        };

        Self { client, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Sends the request and decodes a JSON body, turning any non-2xx status
    /// into `GraphError::Service` with the raw body attached.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> GraphResult<T> {
        let res = req.send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!("Graph service returned {}: {}", status, body);
            return Err(GraphError::Service {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl GraphService for HttpGraphService {
    async fn get_node(&self, dcid: &str) -> GraphResult<NodeInfo> {
        let url = self.config.url(&self.config.endpoints.node);
        tracing::debug!("GET {} dcid={}", url, dcid);
        self.send(self.client.get(&url).query(&[("dcid", dcid)])).await
    }

    async fn get_property_labels(&self, dcid: &str) -> GraphResult<PropertyLabels> {
        let url = self.config.url(&self.config.endpoints.property);
        tracing::debug!("GET {} dcid={}", url, dcid);
        let mut payload: PropertyLabelsResponse =
            self.send(self.client.get(&url).query(&[("dcid", dcid)])).await?;
        Ok(payload.remove(dcid).unwrap_or_default())
    }

    async fn get_property_values(&self, req: &PropertyValueRequest) -> GraphResult<PropertyValueResponse> {
        let url = self.config.url(&self.config.endpoints.property_value);
        tracing::debug!(
            "POST {} property={} outgoing={} limit={}",
            url,
            req.property,
            req.outgoing,
            req.limit
        );
        self.send(self.client.post(&url).json(req)).await
    }

    async fn get_triples(&self, dcid: &str) -> GraphResult<Vec<Triple>> {
        let url = self.config.url(&self.config.endpoints.triples);
        tracing::debug!("GET {} dcid={}", url, dcid);
        let mut payload: TriplesResponse =
            self.send(self.client.get(&url).query(&[("dcid", dcid)])).await?;
        Ok(payload.remove(dcid).unwrap_or_default())
    }

    async fn query(&self, req: &QueryRequest) -> GraphResult<QueryResponse> {
        let url = self.config.url(&self.config.endpoints.query);
        tracing::debug!("POST {} rows={}", url, req.rows);
        self.send(self.client.post(&url).json(req)).await
    }

    async fn property_type(&self, req: &PropertyTypeRequest) -> GraphResult<Option<String>> {
        let url = self.config.url(&self.config.endpoints.property_type);
        let payload: PropertyTypeResponse = self.send(self.client.post(&url).json(req)).await?;
        Ok(payload.value_type)
    }

    async fn read_table(&self, name: &str) -> GraphResult<SavedTable> {
        let url = self.config.url(&self.config.endpoints.read_table);
        let req = ReadTableRequest { file_name: name.to_string() };
        match self.send(self.client.post(&url).json(&req)).await {
            Err(GraphError::Service { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(GraphError::NotFound(name.to_string()))
            }
            other => other,
        }
    }

    async fn save_table(&self, req: &SaveTableRequest) -> GraphResult<String> {
        let url = self.config.url(&self.config.endpoints.save_table);
        let payload: SaveTableResponse = self.send(self.client.post(&url).json(req)).await?;
        Ok(payload.file_name)
    }

    fn db_path(&self) -> Option<String> {
        self.config.db_path.clone()
    }

    fn default_limit(&self) -> usize {
        self.config.default_limit
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
