pub mod api_types;
mod server;

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Schema, SchemaBuilder};
use tracing::warn;
use usergraph_backend_client::{BackendClient, BackendError};

pub use self::server::{MutationRoot, QueryRoot};
use crate::config::{Config, MutationsConfig};

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Everything resolvers can reach. Immutable once the schema is built.
pub struct ApiSchemaContext {
    pub backend: Arc<dyn BackendClient>,
    pub mutations: MutationsConfig,
}

impl ApiSchemaContext {
    pub fn new(backend: Arc<dyn BackendClient>, mutations: MutationsConfig) -> Self {
        Self { backend, mutations }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend_client(), config.mutations.clone())
    }
}

pub fn api_schema_builder() -> SchemaBuilder<QueryRoot, MutationRoot, EmptySubscription> {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
}

pub fn api_schema(ctx: ApiSchemaContext) -> ApiSchema {
    api_schema_builder().data(ctx).finish()
}

pub fn ctx_data<'a>(ctx: &'a Context) -> &'a ApiSchemaContext {
    ctx.data::<ApiSchemaContext>()
        .expect("Failed to get API context")
}

/// Turns a backend failure into a field error, tagged with
/// `extensions.code`.
pub(crate) fn backend_error(err: BackendError) -> async_graphql::Error {
    if !err.is_not_found() {
        warn!(error = %err, "Backend request failed");
    }
    let code = err.code();
    async_graphql::Error::new(err.to_string())
        .extend_with(|_, ext| ext.set("code", code.to_string()))
}
