use auraprobe::scan::ScanOptions;
use serde_json::{json, Value};
use wiremock::matchers::{body_string, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AURA_PATH: &str = "/s/sfsites/aura";
pub const ACCOUNT_ID: &str = "001000000000001AAA";

/// Mock site whose endpoint answers detection requests like an unauthenticated
/// Aura endpoint.
pub async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AURA_PATH))
        .and(body_string(""))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"*/{"event":{"descriptor":"markup://aura:invalidSession"}}/*ERROR*/"#),
        )
        .mount(&server)
        .await;
    server
}

pub fn options(server: &MockServer) -> ScanOptions {
    ScanOptions {
        target: server.uri(),
        types: vec!["Account".to_string()],
        ..Default::default()
    }
}

pub fn success(return_value: Value) -> Value {
    json!({
        "actions": [{"id": "1;a", "state": "SUCCESS", "returnValue": return_value, "error": []}],
        "context": {"fwuid": "abc", "app": "siteforce:communityApp"}
    })
}

pub async fn mock_action(server: &MockServer, fragment: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(AURA_PATH))
        .and(body_string_contains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Every other action succeeds with nothing in it. Mount last.
pub async fn mock_empty(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(AURA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"actions": []})))
        .mount(server)
        .await;
}

/// Listing that returns a single Account row.
pub async fn mock_account_listing(server: &MockServer) {
    mock_action(
        server,
        "getItems",
        success(json!({
            "result": [{"record": {"Id": ACCOUNT_ID, "Name": "Acme"}}]
        })),
    )
    .await;
}
