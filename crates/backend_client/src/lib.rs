//! Clients for the users and companies backend.
//!
//! The backend is the sole owner of persisted state: it assigns identifiers,
//! stores users and companies, and answers lookups. Everything in this crate
//! is a thin, stateless view over it.

mod error;
mod rest_backend;
mod static_backend;

use std::fmt::Debug;

use async_trait::async_trait;
pub use error::{BackendError, Entity};
pub use rest_backend::RestBackend;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use static_backend::StaticBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// A source of users and companies.
///
/// Every method performs at most one backend exchange. Implementations MUST
/// NOT cache or retry: two calls for the same entity are two exchanges.
#[async_trait]
pub trait BackendClient: Send + Sync + Debug {
    /// Human-readable description of where data comes from, for logs.
    fn describe(&self) -> String;

    /// `GET /users/:id`.
    async fn user(&self, id: &str) -> BackendResult<UserRecord>;

    /// `GET /companies/:id`.
    async fn company(&self, id: &str) -> BackendResult<CompanyRecord>;

    /// `GET /companies/:id/users`. An unknown company, or one with no
    /// employees, yields an empty list.
    async fn company_users(&self, company_id: &str) -> BackendResult<Vec<UserRecord>>;

    /// `POST /users`. The returned record carries the identifier assigned by
    /// the backend.
    async fn create_user(&self, new_user: NewUser) -> BackendResult<UserRecord>;
}

/// A user as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub first_name: String,
    pub age: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

/// A company as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The body of a user creation request. There is no `id`: the backend
/// assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub age: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}
