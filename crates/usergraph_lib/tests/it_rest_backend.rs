use std::net::{Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join;
use serde_json::json;
use usergraph_lib::backend::{BackendClient, NewUser, RestBackend};
use usergraph_lib::config::Config;
use usergraph_lib::graphql_api::{api_schema, ApiSchemaContext};
use usergraph_lib::test_utils::mocks::MockRestServer;
use usergraph_lib::test_utils::{companies, error_codes, execute_json, test_schema, users};

async fn mock_server() -> MockRestServer {
    MockRestServer::start(users(), companies()).await.unwrap()
}

#[tokio::test]
async fn fetches_user_and_company() {
    let server = mock_server().await;
    let backend = server.backend();

    let user = backend.user("23").await.unwrap();
    assert_eq!(user.first_name, "Bill");
    assert_eq!(user.company_id.as_deref(), Some("1"));

    let company = backend.company("1").await.unwrap();
    assert_eq!(company.name, "Apple");

    assert_eq!(server.requests(), ["GET /users/23", "GET /companies/1"]);
}

#[tokio::test]
async fn not_found_maps_to_lookup_miss() {
    let server = mock_server().await;
    let backend = server.backend();

    let err = backend.user("99").await.unwrap_err();
    assert!(err.is_not_found());
    let err = backend.company("99").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn company_users_of_unknown_company_is_empty() {
    let server = mock_server().await;

    let users = server.backend().company_users("99").await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
#[tracing_test::traced_test]
async fn missing_company_users_route_is_quietly_empty() {
    let server = mock_server().await;
    server.hide_path("/companies/1/users");

    let users = server.backend().company_users("1").await.unwrap();

    assert!(users.is_empty());
    assert_eq!(server.requests(), ["GET /companies/1/users"]);
    assert!(!logs_contain("Backend returned an error status"));
}

#[tokio::test]
#[tracing_test::traced_test]
async fn unexpected_status_is_logged() {
    let server = mock_server().await;
    server.fail_path("/companies/1/users");

    let err = server.backend().company_users("1").await.unwrap_err();

    assert_eq!(err.code(), "BACKEND_STATUS");
    assert!(logs_contain("Backend returned an error status"));
}

#[tokio::test]
async fn dot_and_empty_ids_never_reach_the_backend() {
    let server = mock_server().await;
    let backend = server.backend();
    let schema = test_schema(Arc::new(server.backend()), false);

    for id in ["", ".", ".."] {
        assert!(backend.user(id).await.unwrap_err().is_not_found());
        assert!(backend.company(id).await.unwrap_err().is_not_found());
        assert!(backend.company_users(id).await.unwrap().is_empty());
    }

    let response = execute_json(
        &schema,
        r#"{ a: user(id: "..") { id } b: company(id: ".") { id } c: user(id: "") { id } }"#,
    )
    .await;

    assert_eq!(response["data"], json!({"a": null, "b": null, "c": null}));
    assert_eq!(error_codes(&response), ["NOT_FOUND"; 3]);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn server_errors_map_to_status_errors() {
    let server = mock_server().await;
    server.fail_path("/users/23");

    let err = server.backend().user("23").await.unwrap_err();
    assert_eq!(err.code(), "BACKEND_STATUS");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let addr = {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        listener.local_addr().unwrap()
    };
    let backend = RestBackend::new(format!("http://{addr}").parse().unwrap())
        .with_timeout(Duration::from_secs(5));

    let err = backend.user("23").await.unwrap_err();
    assert_eq!(err.code(), "BACKEND_UNAVAILABLE");
}

#[tokio::test]
async fn create_user_returns_backend_assigned_id() {
    let server = mock_server().await;
    let backend = server.backend();
    let existing_ids: Vec<String> = users().into_iter().map(|u| u.id).collect();

    let created = backend
        .create_user(NewUser {
            first_name: "Bill".to_string(),
            age: 20,
            company_id: None,
        })
        .await
        .unwrap();

    assert!(!existing_ids.contains(&created.id));
    assert_eq!(created.first_name, "Bill");
    assert_eq!(server.users().len(), existing_ids.len() + 1);
    assert_eq!(
        server.created_bodies(),
        [json!({"firstName": "Bill", "age": 20})]
    );
}

#[tokio::test]
async fn nested_query_over_http() {
    let server = mock_server().await;
    let schema = test_schema(Arc::new(server.backend()), false);

    let response = execute_json(
        &schema,
        r#"{ user(id: "47") { firstName company { name users { firstName } } } }"#,
    )
    .await;

    assert_eq!(
        response["data"],
        json!({"user": {
            "firstName": "Samantha",
            "company": {
                "name": "Google",
                "users": [{"firstName": "Samantha"}, {"firstName": "Alex"}]
            }
        }})
    );
    assert_eq!(
        server.requests(),
        ["GET /users/47", "GET /companies/2", "GET /companies/2/users"]
    );
}

#[tokio::test]
async fn nested_failure_stays_on_its_field() {
    let server = mock_server().await;
    server.fail_path("/companies/1");
    let schema = test_schema(Arc::new(server.backend()), false);

    let response = execute_json(
        &schema,
        r#"{ user(id: "23") { firstName company { name } } company(id: "2") { name } }"#,
    )
    .await;

    assert_eq!(
        response["data"],
        json!({
            "user": {"firstName": "Bill", "company": null},
            "company": {"name": "Google"}
        })
    );
    assert_eq!(error_codes(&response), ["BACKEND_STATUS"]);
    assert_eq!(response["errors"][0]["path"], json!(["user", "company"]));
}

#[tokio::test]
async fn add_user_without_company_over_http() {
    let server = mock_server().await;
    let schema = test_schema(Arc::new(server.backend()), false);

    let response = execute_json(
        &schema,
        r#"mutation { addUser(firstName: "Bill", age: 20) { id firstName age company { id } } }"#,
    )
    .await;

    let created = &response["data"]["addUser"];
    assert_eq!(created["firstName"], "Bill");
    assert_eq!(created["age"], 20);
    assert!(created["company"].is_null());

    let id = created["id"].as_str().unwrap();
    assert!(!users().iter().any(|user| user.id == id));
    assert_eq!(server.requests(), ["POST /users"]);
}

#[tokio::test]
async fn add_user_forwards_company_id_when_enabled() {
    let forwarding = mock_server().await;
    let dropping = mock_server().await;
    let mutation =
        r#"mutation { addUser(firstName: "Ann", age: 30, companyId: "3") { company { name } } }"#;

    let forwarding_schema = test_schema(Arc::new(forwarding.backend()), true);
    let dropping_schema = test_schema(Arc::new(dropping.backend()), false);
    let (forwarded, dropped) = join(
        execute_json(&forwarding_schema, mutation),
        execute_json(&dropping_schema, mutation),
    )
    .await;

    assert_eq!(
        forwarding.created_bodies(),
        [json!({"firstName": "Ann", "age": 30, "companyId": "3"})]
    );
    assert_eq!(
        forwarded["data"],
        json!({"addUser": {"company": {"name": "Initech"}}})
    );

    assert_eq!(
        dropping.created_bodies(),
        [json!({"firstName": "Ann", "age": 30})]
    );
    assert_eq!(dropped["data"], json!({"addUser": {"company": null}}));
}

#[tokio::test]
async fn each_mutation_creates_a_new_record() {
    let server = mock_server().await;
    let schema = test_schema(Arc::new(server.backend()), false);
    let mutation = r#"mutation { addUser(firstName: "Bill", age: 20) { id } }"#;

    let first = execute_json(&schema, mutation).await;
    let second = execute_json(&schema, mutation).await;

    assert_ne!(
        first["data"]["addUser"]["id"],
        second["data"]["addUser"]["id"]
    );
    assert_eq!(server.users().len(), users().len() + 2);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = mock_server().await;
    server.delay_path("/users/23", Duration::from_secs(5));
    let backend = server.backend().with_timeout(Duration::from_millis(50));

    let started = Instant::now();
    let err = backend.user("23").await.unwrap_err();

    assert_eq!(err.code(), "BACKEND_UNAVAILABLE");
    assert!(started.elapsed() < Duration::from_secs(5));

    // Other paths answer within the timeout.
    assert_eq!(backend.company("1").await.unwrap().name, "Apple");
}

#[tokio::test]
async fn configured_timeout_applies_to_backend_requests() {
    let server = mock_server().await;
    server.delay_path("/companies/1", Duration::from_secs(4));
    let config = Config::from_yaml(&format!(
        "backend:\n  type: rest\n  url: {}\n  timeoutInSeconds: 1\n",
        server.url()
    ))
    .unwrap();
    let schema = api_schema(ApiSchemaContext::from_config(&config));

    let started = Instant::now();
    let response = execute_json(
        &schema,
        r#"{ user(id: "23") { firstName company { name } } }"#,
    )
    .await;

    assert_eq!(
        response["data"],
        json!({"user": {"firstName": "Bill", "company": null}})
    );
    assert_eq!(error_codes(&response), ["BACKEND_UNAVAILABLE"]);
    assert!(started.elapsed() < Duration::from_secs(4));
}
