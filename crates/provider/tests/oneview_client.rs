use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oneview_common::Error;
use oneview_managed_san::config::{ApplianceConfig, ConfigOverrides};
use oneview_managed_san::{ManagedSanClient, OneViewClient};

const SAN_PATH: &str = "/rest/fc-sans/managed-sans/a374d517";

fn config(server: &MockServer) -> ApplianceConfig {
    let mut config = ApplianceConfig::default().with_overrides(&ConfigOverrides {
        hostname: Some(server.uri()),
        username: Some("administrator".into()),
        password: Some("my_password".into()),
        api_version: Some(500),
        ..Default::default()
    });
    config.tasks.poll_interval_ms = 10;
    config
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/login-sessions"))
        .and(header("X-API-Version", "500"))
        .and(body_json(json!({"userName": "administrator", "password": "my_password"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionID": "session-1"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn connect(server: &MockServer) -> OneViewClient {
    mount_login(server).await;
    OneViewClient::connect(&config(server)).await.unwrap()
}

fn task(state: &str) -> serde_json::Value {
    json!({
        "category": "tasks",
        "type": "TaskResourceV2",
        "uri": "/rest/tasks/task-1",
        "taskState": state,
        "associatedResource": {"resourceUri": SAN_PATH},
    })
}

#[tokio::test]
async fn login_stores_session() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    assert_eq!(client.session_id(), Some("session-1"));
}

#[tokio::test]
async fn login_failure_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/login-sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorCode": "AUTHN_AUTH_FAIL",
            "message": "Invalid user name or password."
        })))
        .mount(&server)
        .await;

    let err = OneViewClient::connect(&config(&server)).await.err().unwrap();
    match err {
        Error::Authentication(message) => assert_eq!(message, "Invalid user name or password."),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn get_by_name_filters_and_matches_locally() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/fc-sans/managed-sans"))
        .and(query_param("filter", "\"name='san1_0'\""))
        .and(header("Auth", "session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [
                {"name": "SAN1_01", "uri": "/rest/fc-sans/managed-sans/other"},
                {"name": "SAN1_0", "uri": SAN_PATH}
            ],
            "nextPageUri": null
        })))
        .mount(&server)
        .await;

    let san = client.get_by_name("san1_0").await.unwrap().unwrap();
    assert_eq!(san.uri(), Some(SAN_PATH));
}

#[tokio::test]
async fn get_by_name_returns_none_when_absent() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/fc-sans/managed-sans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": []})))
        .mount(&server)
        .await;

    assert!(client.get_by_name("SAN1_0").await.unwrap().is_none());
}

#[tokio::test]
async fn update_returns_body_when_no_task() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let data = json!({"name": "SAN1_0", "sanPolicy": {"zoningPolicy": "SingleInitiatorSingleTarget"}});
    let updated = json!({"name": "SAN1_0", "uri": SAN_PATH, "sanPolicy": {"zoningPolicy": "SingleInitiatorSingleTarget"}});
    Mock::given(method("PUT"))
        .and(path(SAN_PATH))
        .and(body_json(data.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .update(SAN_PATH, data.as_object().unwrap())
        .await
        .unwrap();
    assert_eq!(result, updated);
}

#[tokio::test]
async fn update_waits_for_task_and_fetches_resource() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let task_url = format!("{}/rest/tasks/task-1", server.uri());
    Mock::given(method("PUT"))
        .and(path(SAN_PATH))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", task_url.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/tasks/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("Running")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/tasks/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("Completed")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SAN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "SAN1_0", "refreshState": "RefreshPending"})))
        .mount(&server)
        .await;

    let data = json!({"refreshState": "RefreshPending"});
    let result = client
        .update(SAN_PATH, data.as_object().unwrap())
        .await
        .unwrap();
    assert_eq!(result["refreshState"], json!("RefreshPending"));
}

#[tokio::test]
async fn failed_task_is_reported() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let mut failed = task("Error");
    failed["taskErrors"] = json!([{"errorCode": "FCSAN_ERROR", "message": "Refresh failed."}]);
    Mock::given(method("POST"))
        .and(path(format!("{}/endpoints/", SAN_PATH)))
        .respond_with(ResponseTemplate::new(202).set_body_json(failed))
        .mount(&server)
        .await;

    let err = client.create_endpoints_csv_file(SAN_PATH).await.unwrap_err();
    match err {
        Error::TaskFailed { state, message, .. } => {
            assert_eq!(state, "Error");
            assert_eq!(message, "Refresh failed.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn issues_report_returns_task_output() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let mut done = task("Completed");
    done["taskOutput"] = json!(["zone Z1 has no initiator"]);
    Mock::given(method("POST"))
        .and(path(format!("{}/issues/", SAN_PATH)))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(202).set_body_json(done))
        .mount(&server)
        .await;

    let report = client.create_issues_report(SAN_PATH).await.unwrap();
    assert_eq!(report, json!(["zone Z1 has no initiator"]));
}

#[tokio::test]
async fn api_errors_carry_error_code() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    Mock::given(method("PUT"))
        .and(path(SAN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorCode": "INVALID_ZONING_POLICY",
            "message": "The zoning policy is not valid."
        })))
        .mount(&server)
        .await;

    let data = json!({"sanPolicy": {"zoningPolicy": "Bogus"}});
    let err = client
        .update(SAN_PATH, data.as_object().unwrap())
        .await
        .unwrap_err();
    match err {
        Error::Api { status, error_code, message } => {
            assert_eq!(status, 400);
            assert_eq!(error_code, "INVALID_ZONING_POLICY");
            assert_eq!(message, "The zoning policy is not valid.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn disabled_etag_validation_sends_if_match() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let mut config = config(&server);
    config.validate_etag = false;
    let client = OneViewClient::connect(&config).await.unwrap();

    Mock::given(method("PUT"))
        .and(path(SAN_PATH))
        .and(header("If-Match", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "SAN1_0"})))
        .expect(1)
        .mount(&server)
        .await;

    let data = json!({"name": "SAN1_0"});
    client
        .update(SAN_PATH, data.as_object().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn get_by_name_follows_next_page() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/fc-sans/managed-sans"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [{"name": "SAN2_0", "uri": "/rest/fc-sans/managed-sans/other"}],
            "nextPageUri": "/rest/fc-sans/managed-sans?start=1&count=1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/fc-sans/managed-sans"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [{"name": "SAN1_0", "uri": SAN_PATH}],
            "nextPageUri": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let san = client.get_by_name("SAN1_0").await.unwrap().unwrap();
    assert_eq!(san.uri(), Some(SAN_PATH));
}

#[tokio::test]
async fn task_wait_honours_timeout() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let mut config = config(&server);
    config.tasks.timeout_secs = Some(0);
    let client = OneViewClient::connect(&config).await.unwrap();

    Mock::given(method("PUT"))
        .and(path(SAN_PATH))
        .respond_with(ResponseTemplate::new(202).set_body_json(task("Running")))
        .mount(&server)
        .await;

    let data = json!({"refreshState": "RefreshPending"});
    let err = client
        .update(SAN_PATH, data.as_object().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { seconds: 0 }), "{err}");
}

#[tokio::test]
async fn logout_deletes_session() {
    let server = MockServer::start().await;
    let mut client = connect(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/login-sessions"))
        .and(header("Auth", "session-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
    assert!(client.session_id().is_none());

    // Already logged out: no second DELETE
    client.logout().await.unwrap();
}
