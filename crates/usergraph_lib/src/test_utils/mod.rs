pub mod mocks;

use std::sync::Arc;

use usergraph_backend_client::{BackendClient, CompanyRecord, StaticBackend, UserRecord};

use crate::config::MutationsConfig;
use crate::graphql_api::{api_schema, ApiSchema, ApiSchemaContext};

pub fn company(id: &str, name: &str, description: &str) -> CompanyRecord {
    CompanyRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

pub fn user(id: &str, first_name: &str, age: i32, company_id: Option<&str>) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        first_name: first_name.to_string(),
        age,
        company_id: company_id.map(str::to_string),
    }
}

/// Three companies: one with a single employee, one with two, one with none.
pub fn companies() -> Vec<CompanyRecord> {
    vec![
        company("1", "Apple", "iphone"),
        company("2", "Google", "search"),
        company("3", "Initech", "TPS reports"),
    ]
}

/// Users spread over [`companies`], plus one without a company.
pub fn users() -> Vec<UserRecord> {
    vec![
        user("23", "Bill", 20, Some("1")),
        user("47", "Samantha", 21, Some("2")),
        user("40", "Alex", 40, Some("2")),
        user("44", "Nick", 34, None),
    ]
}

pub fn static_backend() -> StaticBackend {
    StaticBackend::new(users(), companies())
}

/// Builds the API schema around `backend`, with mutations configured as
/// given.
pub fn test_schema(backend: Arc<dyn BackendClient>, forward_company_id: bool) -> ApiSchema {
    api_schema(ApiSchemaContext::new(
        backend,
        MutationsConfig { forward_company_id },
    ))
}

/// Executes `query` and returns the response as JSON, errors included.
pub async fn execute_json(schema: &ApiSchema, query: &str) -> serde_json::Value {
    let response = schema.execute(query).await;
    serde_json::to_value(&response).expect("Failed to serialize GraphQL response")
}

/// Extracts `extensions.code` of every error in a JSON response.
pub fn error_codes(response: &serde_json::Value) -> Vec<String> {
    response["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|err| err["extensions"]["code"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
