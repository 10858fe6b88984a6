use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod config;

/// Semantic type recorded for columns whose values are opaque strings.
pub const TEXT_TYPE: &str = "Text";

/// Which end of a property edge the local node sits on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    /// The node is the subject.
    Outgoing,
    /// The node is the object.
    Incoming,
}

impl Direction {
    pub fn from_outgoing(outgoing: bool) -> Self {
        if outgoing {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    pub fn is_outgoing(&self) -> bool {
        matches!(self, Direction::Outgoing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
        }
    }
}

/// Response of a node lookup by dcid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

/// One related node inside a property-value response. Exactly one of
/// `dcid`/`value` is expected to be non-empty; that is checked when the
/// entry is turned into a node, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyValueRequest {
    pub dcid: Vec<String>,
    pub property: String,
    pub outgoing: bool,
    pub reload: bool,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

/// `{<dcid>: {<property>: [entry, ...]}}`
pub type PropertyValueResponse = HashMap<String, HashMap<String, Vec<NodeEntry>>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyLabels {
    #[serde(default)]
    pub in_labels: Vec<String>,
    #[serde(default)]
    pub out_labels: Vec<String>,
}

impl PropertyLabels {
    pub fn for_direction(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Outgoing => &self.out_labels,
            Direction::Incoming => &self.in_labels,
        }
    }
}

/// `{<dcid>: {in_labels, out_labels}}`
pub type PropertyLabelsResponse = HashMap<String, PropertyLabels>;

/// A (subject, predicate, object) statement touching a node. The object is
/// either another entity (`object_id`) or a literal (`object_value`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Triple {
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub predicate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_value: Option<String>,
}

/// `{<dcid>: [triple, ...]}`
pub type TriplesResponse = HashMap<String, Vec<Triple>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

/// Row-oriented query result. A `None` cell is a missing value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
    /// Types the service inferred for result variables, if any.
    #[serde(default)]
    pub types: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyTypeRequest {
    #[serde(rename = "type")]
    pub subject_type: String,
    pub property: String,
    pub outgoing: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyTypeResponse {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

/// A persisted table: the serialized row store plus its column types.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedTable {
    pub dataframe_blob: String,
    pub col_types: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadTableRequest {
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveTableRequest {
    /// JSON encoding of a `SavedTable`.
    pub data: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveTableResponse {
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_request_omits_missing_value_type() {
        let req = PropertyValueRequest {
            dcid: vec!["geoId/06".into()],
            property: "containedInPlace".into(),
            outgoing: false,
            reload: false,
            limit: 10,
            value_type: None,
        };
        let json = serde_json::to_value(&req).expect("Failed to serialize");
        assert!(json.get("value_type").is_none());
        assert_eq!(json["dcid"][0], "geoId/06");
        assert_eq!(json["limit"], 10);
    }

    #[test]
    fn test_node_entry_accepts_partial_fields() {
        let json = r#"{"geoId/06": {"name": [{"value": "California"}, {"dcid": "geoId/06085", "name": "Santa Clara"}]}}"#;
        let resp: PropertyValueResponse = serde_json::from_str(json).expect("Failed to deserialize");
        let entries = &resp["geoId/06"]["name"];
        assert_eq!(entries[0].value.as_deref(), Some("California"));
        assert!(entries[0].dcid.is_none());
        assert_eq!(entries[1].dcid.as_deref(), Some("geoId/06085"));
        assert!(entries[1].types.is_none());
    }

    #[test]
    fn test_query_response_null_cells() {
        let json = r#"{"header": ["?a", "?b"], "rows": [["x", null]]}"#;
        let resp: QueryResponse = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(resp.rows[0], vec![Some("x".to_string()), None]);
        assert!(resp.types.is_empty());
    }

    #[test]
    fn test_property_type_uses_type_key() {
        let req = PropertyTypeRequest {
            subject_type: "City".into(),
            property: "containedInPlace".into(),
            outgoing: true,
        };
        let json = serde_json::to_value(&req).expect("Failed to serialize");
        assert_eq!(json["type"], "City");

        let resp: PropertyTypeResponse = serde_json::from_str(r#"{"type": "Country"}"#).expect("Failed to deserialize");
        assert_eq!(resp.value_type.as_deref(), Some("Country"));
        let empty: PropertyTypeResponse = serde_json::from_str("{}").expect("Failed to deserialize");
        assert!(empty.value_type.is_none());
    }

    #[test]
    fn test_direction_labels() {
        let labels = PropertyLabels {
            in_labels: vec!["containedInPlace".into()],
            out_labels: vec!["name".into(), "typeOf".into()],
        };
        assert_eq!(labels.for_direction(Direction::Incoming).len(), 1);
        assert_eq!(labels.for_direction(Direction::from_outgoing(true)).len(), 2);
        assert!(Direction::Outgoing.is_outgoing());
        assert_eq!(Direction::Incoming.as_str(), "incoming");
    }
}
