use serde::{Deserialize, Serialize};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};

// --- Constants for Default Configuration ---
pub const DEFAULT_API_ROOT: &str = "http://localhost:8081";
pub const DEFAULT_RESULT_LIMIT: usize = 100;
pub const DEFAULT_QUERY_ROWS: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_NODE_PATH: &str = "/node";
pub const DEFAULT_PROPERTY_PATH: &str = "/property";
pub const DEFAULT_PROPERTY_VALUE_PATH: &str = "/propertyvalue";
pub const DEFAULT_TRIPLES_PATH: &str = "/triples";
pub const DEFAULT_QUERY_PATH: &str = "/query";
pub const DEFAULT_PROPERTY_TYPE_PATH: &str = "/schema/property";
pub const DEFAULT_READ_TABLE_PATH: &str = "/table/read";
pub const DEFAULT_SAVE_TABLE_PATH: &str = "/table/save";

/// Per-operation paths, appended to `ServiceConfig::api_root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointPaths {
    pub node: String,
    pub property: String,
    pub property_value: String,
    pub triples: String,
    pub query: String,
    pub property_type: String,
    pub read_table: String,
    pub save_table: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            node: DEFAULT_NODE_PATH.into(),
            property: DEFAULT_PROPERTY_PATH.into(),
            property_value: DEFAULT_PROPERTY_VALUE_PATH.into(),
            triples: DEFAULT_TRIPLES_PATH.into(),
            query: DEFAULT_QUERY_PATH.into(),
            property_type: DEFAULT_PROPERTY_TYPE_PATH.into(),
            read_table: DEFAULT_READ_TABLE_PATH.into(),
            save_table: DEFAULT_SAVE_TABLE_PATH.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_root: String,
    #[serde(default)]
    pub endpoints: EndpointPaths,
    /// Limit used by property lookups when the caller does not give one.
    #[serde(default = "default_result_limit")]
    pub default_limit: usize,
    /// Database the query endpoint should run against. Forwarded verbatim.
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_result_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.into(),
            endpoints: EndpointPaths::default(),
            default_limit: DEFAULT_RESULT_LIMIT,
            db_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    /// Config pointing at `api_root` with every other option defaulted.
    pub fn with_root(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            ..Self::default()
        }
    }

    /// Joins the API root with an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            // File: tessera.toml
            .add_source(File::with_name("tessera").required(false))

            // Environment: TESSERA__SERVICE__API_ROOT=http://... -> service.api_root
            .add_source(Environment::with_prefix("TESSERA").separator("__"))

            .build()?;

        s.try_deserialize()
    }

    /// Layers a TOML document over the defaults. Environment is not consulted.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("service.api_root", DEFAULT_API_ROOT)?
            .set_default("service.default_limit", DEFAULT_RESULT_LIMIT as i64)?
            .set_default("service.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("service.endpoints.node", DEFAULT_NODE_PATH)?
            .set_default("service.endpoints.property", DEFAULT_PROPERTY_PATH)?
            .set_default("service.endpoints.property_value", DEFAULT_PROPERTY_VALUE_PATH)?
            .set_default("service.endpoints.triples", DEFAULT_TRIPLES_PATH)?
            .set_default("service.endpoints.query", DEFAULT_QUERY_PATH)?
            .set_default("service.endpoints.property_type", DEFAULT_PROPERTY_TYPE_PATH)?
            .set_default("service.endpoints.read_table", DEFAULT_READ_TABLE_PATH)?
            .set_default("service.endpoints.save_table", DEFAULT_SAVE_TABLE_PATH)
    }
}
