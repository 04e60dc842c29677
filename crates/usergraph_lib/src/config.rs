//! usergraph configuration parsing and validation.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use usergraph_backend_client::{
    BackendClient, CompanyRecord, RestBackend, StaticBackend, UserRecord,
};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlConfig {
    /// The port on which the GraphQL API server should listen.
    #[serde(default = "Config::default_graphql_api_port")]
    pub port: u16,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            port: Config::default_graphql_api_port(),
        }
    }
}

/// Where users and companies come from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackendConfig {
    /// A JSON document server exposing `/users` and `/companies`.
    Rest(RestBackendConfig),
    /// A fixed, read-only set of records held in memory.
    Static(StaticBackendConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestBackendConfig {
    /// Base URL of the backend, e.g. `http://localhost:3000`.
    pub url: Url,
    /// Per-request timeout. Requests that take longer fail the field that
    /// issued them.
    #[serde(default = "Config::default_timeout_in_seconds")]
    pub timeout_in_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaticBackendConfig {
    /// Users to serve. If neither users nor companies are given, a small
    /// built-in data set is used.
    #[serde(default)]
    pub users: Option<Vec<UserRecord>>,
    #[serde(default)]
    pub companies: Option<Vec<CompanyRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutationsConfig {
    /// Whether `addUser` sends its `companyId` argument to the backend.
    /// When disabled, the request body only contains `firstName` and `age`
    /// and a supplied `companyId` is dropped with a warning.
    #[serde(default)]
    pub forward_company_id: bool,
}

/// A [`serde`]-compatible representation of usergraph's YAML configuration
/// file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// GraphQL API configuration.
    #[serde(default)]
    pub graphql: GraphQlConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub mutations: MutationsConfig,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        serde_yaml::from_reader(file).context("invalid config file")
    }

    pub fn from_yaml(s: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(s).context("invalid config")
    }

    /// Builds the backend client this configuration describes.
    pub fn backend_client(&self) -> Arc<dyn BackendClient> {
        let backend: Arc<dyn BackendClient> = match &self.backend {
            BackendConfig::Rest(config) => Arc::new(
                RestBackend::new(config.url.clone())
                    .with_timeout(Duration::from_secs(config.timeout_in_seconds)),
            ),
            BackendConfig::Static(config) => Arc::new(config.to_backend()),
        };
        info!(backend = %backend.describe(), "Configured backend");
        backend
    }

    fn default_graphql_api_port() -> u16 {
        4000
    }

    fn default_timeout_in_seconds() -> u64 {
        30
    }
}

impl StaticBackendConfig {
    fn to_backend(&self) -> StaticBackend {
        if self.users.is_none() && self.companies.is_none() {
            return StaticBackend::default();
        }
        StaticBackend::new(
            self.users.clone().unwrap_or_default(),
            self.companies.clone().unwrap_or_default(),
        )
    }
}
