use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;
use usergraph_backend_client::{
    BackendClient, BackendResult, CompanyRecord, NewUser, RestBackend, UserRecord,
};

/// A single call made through a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    User(String),
    Company(String),
    CompanyUsers(String),
    CreateUser(NewUser),
}

/// Pretends to be a backend by routing requests to `target`, keeping a log of
/// every call on the way.
#[derive(Debug)]
pub struct RecordingBackend {
    target: Arc<dyn BackendClient>,
    calls: Mutex<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn new(target: Arc<dyn BackendClient>) -> Self {
        Self {
            target,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BackendClient for RecordingBackend {
    fn describe(&self) -> String {
        format!("recording {}", self.target.describe())
    }

    async fn user(&self, id: &str) -> BackendResult<UserRecord> {
        self.record(BackendCall::User(id.to_string()));
        self.target.user(id).await
    }

    async fn company(&self, id: &str) -> BackendResult<CompanyRecord> {
        self.record(BackendCall::Company(id.to_string()));
        self.target.company(id).await
    }

    async fn company_users(&self, company_id: &str) -> BackendResult<Vec<UserRecord>> {
        self.record(BackendCall::CompanyUsers(company_id.to_string()));
        self.target.company_users(company_id).await
    }

    async fn create_user(&self, new_user: NewUser) -> BackendResult<UserRecord> {
        self.record(BackendCall::CreateUser(new_user.clone()));
        self.target.create_user(new_user).await
    }
}

#[derive(Debug, Default)]
struct MockState {
    users: Vec<UserRecord>,
    companies: Vec<CompanyRecord>,
    requests: Vec<String>,
    created_bodies: Vec<serde_json::Value>,
    canned_statuses: HashMap<String, StatusCode>,
    delays: HashMap<String, Duration>,
    next_id: u64,
}

impl MockState {
    /// Logs the request and returns the canned failure for it, if any.
    fn record(&mut self, method: &str, path: String) -> Option<Response> {
        self.requests.push(format!("{method} {path}"));
        self.canned_statuses
            .get(&path)
            .map(|status| (*status, "boo").into_response())
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = self.next_id.to_string();
            if !self.users.iter().any(|user| user.id == id) {
                return id;
            }
        }
    }
}

type SharedState = Arc<Mutex<MockState>>;

/// A JSON document server with `/users` and `/companies` routes, served over
/// HTTP on an ephemeral local port. It's stopped when dropped.
pub struct MockRestServer {
    url: Url,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl MockRestServer {
    pub async fn start(
        users: Vec<UserRecord>,
        companies: Vec<CompanyRecord>,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(MockState {
            users,
            companies,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/users", post(create_user))
            .route("/users/:id", get(get_user))
            .route("/companies/:id", get(get_company))
            .route("/companies/:id/users", get(get_company_users))
            .with_state(state.clone());

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let url: Url = format!("http://{}", listener.local_addr()?).parse()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self { url, state, handle })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn backend(&self) -> RestBackend {
        RestBackend::new(self.url.clone())
    }

    /// Every request received so far, as `"<METHOD> <path>"`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    /// The raw JSON bodies of all user creation requests.
    pub fn created_bodies(&self) -> Vec<serde_json::Value> {
        self.state.lock().unwrap().created_bodies.clone()
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.state.lock().unwrap().users.clone()
    }

    /// Makes every subsequent request to `path` fail with a 500.
    pub fn fail_path(&self, path: impl Into<String>) {
        self.respond_with(path, StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// Makes every subsequent request to `path` answer with a bare 404, as
    /// if no route matched.
    pub fn hide_path(&self, path: impl Into<String>) {
        self.respond_with(path, StatusCode::NOT_FOUND);
    }

    /// Holds every subsequent response for `path` back by `delay`.
    pub fn delay_path(&self, path: impl Into<String>, delay: Duration) {
        self.state.lock().unwrap().delays.insert(path.into(), delay);
    }

    fn respond_with(&self, path: impl Into<String>, status: StatusCode) {
        self.state
            .lock()
            .unwrap()
            .canned_statuses
            .insert(path.into(), status);
    }
}

impl Drop for MockRestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sleeps for the delay registered for `path`, if any. The state lock is
/// released before sleeping.
async fn wait_for(state: &SharedState, path: &str) {
    let delay = state.lock().unwrap().delays.get(path).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response()
}

async fn get_user(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let path = format!("/users/{id}");
    wait_for(&state, &path).await;
    let mut state = state.lock().unwrap();
    if let Some(failure) = state.record("GET", path) {
        return failure;
    }

    match state.users.iter().find(|user| user.id == id) {
        Some(user) => Json(user.clone()).into_response(),
        None => not_found(),
    }
}

async fn get_company(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let path = format!("/companies/{id}");
    wait_for(&state, &path).await;
    let mut state = state.lock().unwrap();
    if let Some(failure) = state.record("GET", path) {
        return failure;
    }

    match state.companies.iter().find(|company| company.id == id) {
        Some(company) => Json(company.clone()).into_response(),
        None => not_found(),
    }
}

async fn get_company_users(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let path = format!("/companies/{id}/users");
    wait_for(&state, &path).await;
    let mut state = state.lock().unwrap();
    if let Some(failure) = state.record("GET", path) {
        return failure;
    }

    let users: Vec<UserRecord> = state
        .users
        .iter()
        .filter(|user| user.company_id.as_deref() == Some(id.as_str()))
        .cloned()
        .collect();
    Json(users).into_response()
}

async fn create_user(
    State(state): State<SharedState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(failure) = state.record("POST", "/users".to_string()) {
        return failure;
    }
    state.created_bodies.push(body.clone());

    let Ok(new_user) = serde_json::from_value::<NewUser>(body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let user = UserRecord {
        id: state.fresh_id(),
        first_name: new_user.first_name,
        age: new_user.age,
        company_id: new_user.company_id,
    };
    state.users.push(user.clone());

    (StatusCode::CREATED, Json(user)).into_response()
}
