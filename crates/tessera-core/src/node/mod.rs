// Graph nodes materialized on the client.
//
// A node is either an entity addressed by its dcid or a leaf carrying a
// scalar value. Related values are fetched lazily and kept in a per-node
// cache that only grows.

pub mod cache;

pub use cache::{CacheKey, CacheStats, PropertyCache};

use std::fmt;
use std::hash::{Hash, Hasher};
use tessera_common::{Direction, NodeEntry, PropertyLabels, PropertyValueRequest, Triple};
use crate::error::{GraphError, GraphResult};
use crate::service::GraphService;

/// Fields a node is built from. Exactly one identity is carried by
/// construction; emptiness is checked when the node is built.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    Dcid {
        dcid: String,
        name: Option<String>,
        types: Option<Vec<String>>,
    },
    Leaf(String),
}

impl NodeSpec {
    pub fn dcid(dcid: impl Into<String>) -> Self {
        NodeSpec::Dcid {
            dcid: dcid.into(),
            name: None,
            types: None,
        }
    }

    pub fn leaf(value: impl Into<String>) -> Self {
        NodeSpec::Leaf(value.into())
    }

    /// Sets the display name. No effect on leaves.
    pub fn with_name(mut self, value: impl Into<String>) -> Self {
        if let NodeSpec::Dcid { name, .. } = &mut self {
            *name = Some(value.into());
        }
        self
    }

    /// Sets the declared types. No effect on leaves.
    pub fn with_types(mut self, value: Vec<String>) -> Self {
        if let NodeSpec::Dcid { types, .. } = &mut self {
            *types = Some(value);
        }
        self
    }

    /// Resolves an open field set. A non-empty dcid wins over a value; with
    /// neither present the input is rejected.
    pub fn from_fields(
        dcid: Option<String>,
        value: Option<String>,
        name: Option<String>,
        types: Option<Vec<String>>,
    ) -> GraphResult<Self> {
        match (dcid.filter(|d| !d.is_empty()), value.filter(|v| !v.is_empty())) {
            (Some(dcid), _) => Ok(NodeSpec::Dcid { dcid, name, types }),
            (None, Some(value)) => Ok(NodeSpec::Leaf(value)),
            (None, None) => Err(GraphError::InvalidArgument(
                "must specify one of \"dcid\" or \"value\"".into(),
            )),
        }
    }

    /// True when building the node needs a lookup to fill name or types.
    fn needs_lookup(&self) -> bool {
        matches!(self, NodeSpec::Dcid { name, types, .. } if name.is_none() || types.is_none())
    }
}

impl TryFrom<NodeEntry> for NodeSpec {
    type Error = GraphError;

    fn try_from(entry: NodeEntry) -> GraphResult<Self> {
        NodeSpec::from_fields(entry.dcid, entry.value, entry.name, entry.types)
    }
}

#[derive(Debug, Clone)]
enum Identity {
    Dcid(String),
    Leaf(String),
}

/// Options for `Node::get_property_values`.
#[derive(Debug, Clone)]
pub struct ValueQuery {
    pub property: String,
    pub direction: Direction,
    pub value_type: Option<String>,
    pub reload: bool,
    /// Falls back to the service's default limit when unset.
    pub limit: Option<usize>,
}

impl ValueQuery {
    pub fn outgoing(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Outgoing,
            value_type: None,
            reload: false,
            limit: None,
        }
    }

    pub fn incoming(property: impl Into<String>) -> Self {
        Self {
            direction: Direction::Incoming,
            ..Self::outgoing(property)
        }
    }

    pub fn value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    /// Asks the service to bypass its own cache. The local cache is still consulted.
    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// A node of the knowledge graph.
///
/// Equality is deliberately not an equivalence: two nodes are equal only when
/// both carry the same non-empty dcid, and a leaf is never equal to anything,
/// itself included. The hash of a leaf is derived from its value, so equal
/// hashes do not imply equality and leaves must not be used as map keys.
#[derive(Debug, Clone)]
pub struct Node {
    identity: Identity,
    name: Option<String>,
    types: Vec<String>,
    properties: PropertyCache,
    labels: Option<PropertyLabels>,
    triples: Option<Vec<Triple>>,
}

impl Node {
    /// Builds a node, looking up name and types for a dcid when either is
    /// missing from `spec`. Supplied fields win over fetched ones.
    pub async fn resolve(service: &dyn GraphService, spec: NodeSpec) -> GraphResult<Self> {
        if !spec.needs_lookup() {
            return Self::offline(spec);
        }

        let (dcid, name, types) = match spec {
            NodeSpec::Dcid { dcid, name, types } if !dcid.is_empty() => (dcid, name, types),
            other => return Self::offline(other),
        };

        tracing::debug!("Looking up node {}", dcid);
        let info = service.get_node(&dcid).await?;
        Self::offline(NodeSpec::Dcid {
            name: name.or(info.name),
            types: types.or(info.types),
            dcid,
        })
    }

    /// Builds a node from `spec` alone; missing name/types stay empty.
    pub fn offline(spec: NodeSpec) -> GraphResult<Self> {
        let (identity, name, types) = match spec {
            NodeSpec::Dcid { dcid, .. } if dcid.is_empty() => {
                return Err(GraphError::InvalidArgument("dcid must not be empty".into()))
            }
            NodeSpec::Leaf(value) if value.is_empty() => {
                return Err(GraphError::InvalidArgument("value must not be empty".into()))
            }
            NodeSpec::Dcid { dcid, name, types } => {
                (Identity::Dcid(dcid), name, types.unwrap_or_default())
            }
            NodeSpec::Leaf(value) => (Identity::Leaf(value), None, Vec::new()),
        };

        Ok(Self {
            identity,
            name,
            types,
            properties: PropertyCache::new(),
            labels: None,
            triples: None,
        })
    }

    pub fn dcid(&self) -> Option<&str> {
        match &self.identity {
            Identity::Dcid(dcid) => Some(dcid),
            Identity::Leaf(_) => None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match &self.identity {
            Identity::Leaf(value) => Some(value),
            Identity::Dcid(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.identity, Identity::Leaf(_))
    }

    pub fn cache(&self) -> &PropertyCache {
        &self.properties
    }

    fn require_dcid(&self, operation: &str) -> GraphResult<String> {
        self.dcid().map(str::to_string).ok_or_else(|| {
            GraphError::InvalidArgument(format!("{} is not supported on leaf nodes", operation))
        })
    }

    /// Returns up to `limit` nodes related to this one through `property`.
    ///
    /// Values already cached are served locally; only the shortfall is
    /// requested from the service, and whatever comes back is appended to
    /// the cache before the first `limit` values are returned.
    pub async fn get_property_values(
        &mut self,
        service: &dyn GraphService,
        query: &ValueQuery,
    ) -> GraphResult<Vec<Node>> {
        let dcid = self.require_dcid("get_property_values")?;
        let limit = query.limit.unwrap_or_else(|| service.default_limit());
        let key = CacheKey::new(query.property.clone(), query.direction);

        if let Some(cached) = self.properties.lookup(&key, limit) {
            return Ok(cached);
        }

        let req = PropertyValueRequest {
            dcid: vec![dcid.clone()],
            property: query.property.clone(),
            outgoing: query.direction.is_outgoing(),
            reload: query.reload,
            limit: limit - self.properties.count(&key),
            value_type: query.value_type.clone(),
        };
        let mut payload = service.get_property_values(&req).await?;

        let entries = payload
            .remove(&dcid)
            .and_then(|mut props| props.remove(&query.property))
            .unwrap_or_default();

        let mut fetched = Vec::with_capacity(entries.len());
        for entry in entries {
            fetched.push(Node::resolve(service, NodeSpec::try_from(entry)?).await?);
        }

        Ok(self.properties.merge_and_truncate(key, fetched, limit))
    }

    /// Property labels attached to this node in the given direction.
    pub async fn get_properties(
        &mut self,
        service: &dyn GraphService,
        direction: Direction,
        reload: bool,
    ) -> GraphResult<Vec<String>> {
        let dcid = self.require_dcid("get_properties")?;

        if reload || self.labels.is_none() {
            self.labels = Some(service.get_property_labels(&dcid).await?);
        }

        Ok(self
            .labels
            .as_ref()
            .map(|labels| labels.for_direction(direction).to_vec())
            .unwrap_or_default())
    }

    /// Every triple with this node as subject or object.
    pub async fn get_triples(&mut self, service: &dyn GraphService, reload: bool) -> GraphResult<Vec<Triple>> {
        let dcid = self.require_dcid("get_triples")?;

        if reload || self.triples.is_none() {
            self.triples = Some(service.get_triples(&dcid).await?);
        }

        Ok(self.triples.clone().unwrap_or_default())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (&self.identity, &other.identity) {
            (Identity::Dcid(a), Identity::Dcid(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.identity {
            Identity::Dcid(dcid) => format!("dcid:{}", dcid).hash(state),
            Identity::Leaf(value) => format!("value:{}", value).hash(state),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = serde_json::Map::new();
        if let Some(dcid) = self.dcid() {
            fields.insert("dcid".into(), dcid.into());
        }
        if let Some(name) = &self.name {
            fields.insert("name".into(), name.as_str().into());
        }
        if let Some(value) = self.value() {
            fields.insert("value".into(), value.into());
        }
        write!(f, "{}", serde_json::Value::Object(fields))
    }
}
