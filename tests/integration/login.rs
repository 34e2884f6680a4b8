use auraprobe::scan::{self, ScanOptions};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

const GLOBEX_ID: &str = "001000000000002AAA";

async fn mock_login(server: &MockServer) {
    let redirect = format!("{}/secur/frontdoor.jsp?sid=00D", server.uri());
    mock_action(
        server,
        "LightningLoginFormController",
        json!({
            "actions": [{"state": "SUCCESS", "returnValue": null}],
            "events": [{
                "descriptor": "markup://aura:clientRedirect",
                "attributes": {"values": {"url": redirect}}
            }]
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/secur/frontdoor.jsp"))
        .respond_with(
            ResponseTemplate::new(302).append_header("Set-Cookie", "sid=00D!session; Path=/"),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "__Host-ERIC_PROD123=tok123; Path=/; Secure"),
        )
        .mount(server)
        .await;
}

fn credentials(server: &MockServer) -> ScanOptions {
    ScanOptions {
        username: Some("alice@example.com".to_string()),
        password: Some("hunter2".to_string()),
        ..options(server)
    }
}

#[tokio::test]
async fn test_login_opens_api_channels() {
    let server = site().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/services/data/[^/]+/query/$"))
        .and(header("Authorization", "OAuth 00D!session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 1,
            "done": true,
            "records": [{"attributes": {"type": "Account"}, "Id": GLOBEX_ID, "Name": "Globex"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mock_account_listing(&server).await;
    mock_empty(&server).await;

    let report = scan::run(&credentials(&server)).await.unwrap();

    assert!(report.authenticated);
    assert_eq!(report.records.len(), 2);
    let globex = report
        .records
        .iter()
        .find(|r| r.id() == Some(GLOBEX_ID))
        .unwrap();
    assert_eq!(globex.sobject_type(), "Account");
    assert!(report.records.iter().any(|r| r.id() == Some(ACCOUNT_ID)));
}

#[tokio::test]
async fn test_failed_login_scans_as_guest() {
    let server = site().await;
    mock_action(
        &server,
        "LightningLoginFormController",
        json!({"actions": [{"state": "ERROR", "error": [{"message": "Your login attempt has failed."}]}]}),
    )
    .await;
    mock_account_listing(&server).await;
    mock_empty(&server).await;

    let report = scan::run(&credentials(&server)).await.unwrap();

    assert!(!report.authenticated);
    assert_eq!(report.records.len(), 1);
}

#[tokio::test]
async fn test_explicit_sid_skips_login() {
    let server = site().await;
    Mock::given(method("POST"))
        .and(body_string_contains("LightningLoginFormController"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/services/data/[^/]+/query/$"))
        .and(header("Authorization", "OAuth 00D!given"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&server)
        .await;
    mock_empty(&server).await;

    let options = ScanOptions {
        sid: Some("00D!given".to_string()),
        ..options(&server)
    };
    let report = scan::run(&options).await.unwrap();

    assert!(report.authenticated);
    assert!(report.records.is_empty());
}
