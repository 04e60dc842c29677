use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::*;
use url::Url;

use crate::{
    BackendClient, BackendError, BackendResult, CompanyRecord, Entity, NewUser, UserRecord,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`BackendClient`] that talks to a JSON document server over HTTP.
///
/// All requests share a single [`reqwest::Client`], and thus its connection
/// pool. Nothing else is shared between requests.
#[derive(Debug, Clone)]
pub struct RestBackend {
    base_url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl RestBackend {
    /// Creates a new [`RestBackend`] rooted at `base_url`, e.g.
    /// `http://localhost:3000`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Sets the timeout for each request to the backend.
    ///
    /// The default timeout is 30 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL. Segments are percent-encoded,
    /// so a `/` inside an identifier stays within its segment. Dot segments
    /// (`.` and `..`) are dropped and an empty segment leaves a trailing
    /// slash; callers must reject such identifiers with [`is_addressable`].
    fn endpoint(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and decodes a JSON body. A `404` is read according
    /// to `on_not_found`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        on_not_found: OnNotFound<'_, T>,
    ) -> BackendResult<T> {
        let response = request.timeout(self.timeout).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            match on_not_found {
                OnNotFound::Missing(entity, id) => return Err(not_found(entity, id)),
                OnNotFound::Value(value) => {
                    trace!(url = %response.url(), "Backend has nothing at this path");
                    return Ok(value);
                }
                OnNotFound::Fail => {}
            }
        }
        if !status.is_success() {
            warn!(%status, url = %response.url(), "Backend returned an error status");
            return Err(BackendError::Status {
                status,
                url: response.url().to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        on_not_found: OnNotFound<'_, T>,
    ) -> BackendResult<T> {
        let url = self.endpoint(segments)?;
        trace!(timeout = ?self.timeout, %url, "Sending GET request");
        self.send(self.client.get(url), on_not_found).await
    }
}

/// What a `404` from the backend means for a given request.
enum OnNotFound<'a, T> {
    /// The record `(entity, id)` doesn't exist.
    Missing(Entity, &'a str),
    /// An ordinary outcome, answered with this value.
    Value(T),
    /// An unexpected error status.
    Fail,
}

/// Whether `id` names a resource of its own once appended to a URL path.
fn is_addressable(id: &str) -> bool {
    !matches!(id, "" | "." | "..")
}

fn not_found(entity: Entity, id: &str) -> BackendError {
    BackendError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[async_trait]
impl BackendClient for RestBackend {
    fn describe(&self) -> String {
        format!("REST backend at {}", self.base_url)
    }

    async fn user(&self, id: &str) -> BackendResult<UserRecord> {
        if !is_addressable(id) {
            return Err(not_found(Entity::User, id));
        }
        self.get(&["users", id], OnNotFound::Missing(Entity::User, id)).await
    }

    async fn company(&self, id: &str) -> BackendResult<CompanyRecord> {
        if !is_addressable(id) {
            return Err(not_found(Entity::Company, id));
        }
        self.get(&["companies", id], OnNotFound::Missing(Entity::Company, id)).await
    }

    async fn company_users(&self, company_id: &str) -> BackendResult<Vec<UserRecord>> {
        if !is_addressable(company_id) {
            return Ok(vec![]);
        }
        // An unknown company has no users.
        self.get(&["companies", company_id, "users"], OnNotFound::Value(vec![])).await
    }

    async fn create_user(&self, new_user: NewUser) -> BackendResult<UserRecord> {
        let url = self.endpoint(&["users"])?;
        debug!(%url, first_name = %new_user.first_name, "Creating user");
        let created: UserRecord = self
            .send(self.client.post(url).json(&new_user), OnNotFound::Fail)
            .await?;
        info!(id = %created.id, "Backend created user");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RestBackend {
        RestBackend::new(base.parse().unwrap())
    }

    #[test]
    fn endpoint_appends_segments() {
        let url = backend("http://localhost:3000")
            .endpoint(&["companies", "1", "users"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/companies/1/users");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = backend("http://localhost:3000/api/")
            .endpoint(&["users", "23"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/users/23");
    }

    #[test]
    fn endpoint_escapes_identifiers() {
        let url = backend("http://localhost:3000")
            .endpoint(&["users", "../companies/1"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/users/..%2Fcompanies%2F1");
    }

    #[test]
    fn endpoint_rejects_cannot_be_a_base_urls() {
        let err = backend("mailto:someone@example.com")
            .endpoint(&["users"])
            .unwrap_err();
        assert_eq!(err.code(), "BACKEND_MISCONFIGURED");
    }

    #[test]
    fn endpoint_drops_dot_segments() {
        let backend = backend("http://localhost:3000");

        let url = backend.endpoint(&["users", ".."]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/users");
        let url = backend.endpoint(&["companies", ".", "users"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/companies/users");
    }

    #[test]
    fn dot_and_empty_identifiers_are_not_addressable() {
        for id in ["", ".", ".."] {
            assert!(!is_addressable(id), "{id:?} should not be addressable");
        }
        for id in ["23", "...", ".hidden", "a.b", "../companies/1"] {
            assert!(is_addressable(id), "{id:?} should be addressable");
        }
    }

    // Nothing listens on the discard port, so any request that went out
    // would come back as a transport error.
    #[tokio::test]
    async fn unaddressable_identifiers_miss_without_a_request() {
        let backend = backend("http://127.0.0.1:9").with_timeout(Duration::from_secs(5));

        for id in ["", ".", ".."] {
            let err = backend.user(id).await.unwrap_err();
            assert!(err.is_not_found(), "user {id:?}: {err}");
            let err = backend.company(id).await.unwrap_err();
            assert!(err.is_not_found(), "company {id:?}: {err}");
            let users = backend.company_users(id).await.unwrap();
            assert!(users.is_empty());
        }
    }
}
