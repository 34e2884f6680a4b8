use auraprobe::scan::{self, ScanOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

#[tokio::test]
async fn test_guest_scan_enumerates_and_dumps() {
    let server = site().await;
    mock_account_listing(&server).await;
    mock_empty(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let options = ScanOptions {
        dump: Some(dir.path().to_path_buf()),
        ..options(&server)
    };
    let report = scan::run(&options).await.unwrap();

    assert_eq!(report.aura_path.as_deref(), Some(AURA_PATH));
    assert!(!report.authenticated);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.id(), Some(ACCOUNT_ID));
    assert_eq!(record.sobject_type(), "Account");

    let dumped = dir.path().join("Account").join(format!("{ACCOUNT_ID}.json"));
    assert_eq!(report.dumped, vec![dumped.clone()]);
    let content: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dumped).unwrap()).unwrap();
    assert_eq!(content["sobjectType"], "Account");
    assert!(content["fields"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["name"] == "Name" && f["value"] == "Acme"));
}

#[tokio::test]
async fn test_missing_endpoint_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = scan::run(&options(&server)).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_forced_scan_uses_given_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/custom/aura"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"actions": []})))
        .mount(&server)
        .await;

    let options = ScanOptions {
        path: Some("/custom/aura".to_string()),
        force: true,
        ..options(&server)
    };
    let report = scan::run(&options).await.unwrap();

    assert_eq!(report.aura_path, None);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_invalid_proxy_is_rejected() {
    let options = ScanOptions {
        target: "https://community.example.com".to_string(),
        proxy: Some("no-port".to_string()),
        ..Default::default()
    };
    assert!(scan::run(&options).await.is_err());
}

#[tokio::test]
async fn test_by_id_scan_with_bruteforce() {
    let server = site().await;
    mock_action(
        &server,
        "RecordGvpController",
        success(serde_json::json!({
            "record": {"sobjectType": "Account", "Id": ACCOUNT_ID, "Name": "Acme"}
        })),
    )
    .await;
    mock_empty(&server).await;

    let options = ScanOptions {
        record_id: Some(ACCOUNT_ID.to_string()),
        bruteforce: Some(2),
        types: Vec::new(),
        ..options(&server)
    };
    let report = scan::run(&options).await.unwrap();

    // Every id gets the same answer from the mock, each keyed by its own id.
    assert!(!report.records.is_empty());
    assert!(report.records.iter().all(|r| r.sobject_type() == "Account"));
}
