
use wiremock::MockServer;

use crate::tests::test_support::{base_config, capture_logs, drain_logs};

use super::*;

#[tokio::test]
async fn request_descriptor_follows_authentication_state() {
    let auth = MockServer::start().await;
    let public = MockServer::start().await;
    let client = AuthClient::new(base_config(&auth, &public)).expect("client");

    let ctx = request_context::RequestContext::original(
        "api/v1/me",
        RequestOptions::new().header("User-Agent", "spoofed"),
    );
    let (descriptor, sent) = client.build_descriptor(&ctx).unwrap();
    assert_eq!(descriptor.method, reqwest::Method::GET);
    assert_eq!(descriptor.url.as_str(), format!("{}/api/v1/me", public.uri()));
    assert_eq!(descriptor.header("user-agent"), Some("test-agent/1.0"));
    assert!(descriptor.header("authorization").is_none());
    assert!(sent.is_none());

    let client = AuthClient::new(
        base_config(&auth, &public).with_tokens(Some("T".into()), None),
    )
    .unwrap();
    let (descriptor, sent) = client.build_descriptor(&ctx).unwrap();
    assert_eq!(descriptor.url.as_str(), format!("{}/api/v1/me", auth.uri()));
    assert_eq!(descriptor.header("Authorization"), Some("bearer T"));
    assert_eq!(sent.as_deref(), Some("T"));
}

#[tokio::test]
async fn basic_auth_replaces_bearer_and_url_override_wins() {
    let auth = MockServer::start().await;
    let public = MockServer::start().await;
    let client = AuthClient::new(
        base_config(&auth, &public).with_tokens(Some("T".into()), None),
    )
    .unwrap();

    let ctx = request_context::RequestContext::token_grant(
        "/ignored",
        RequestOptions::new()
            .method(reqwest::Method::POST)
            .url("https://elsewhere.test/custom")
            .basic_auth("app", "secret"),
    );
    let (descriptor, sent) = client.build_descriptor(&ctx).unwrap();
    assert_eq!(descriptor.url.as_str(), "https://elsewhere.test/custom");
    assert!(descriptor.header("authorization").is_none());
    assert_eq!(
        descriptor.basic_auth,
        Some(("app".to_string(), "secret".to_string()))
    );
    assert!(sent.is_none());
}

#[tokio::test]
async fn construction_logs_structured_fields() {
    let auth = MockServer::start().await;
    let public = MockServer::start().await;

    let (lines, guard) = capture_logs();
    let client = AuthClient::new(
        base_config(&auth, &public)
            .with_request_buffer(7)
            .with_min_interval(std::time::Duration::from_millis(250)),
    );
    drop(guard);
    client.expect("client");

    let logs = drain_logs(lines);
    let ready = logs
        .iter()
        .find(|line| line.contains("client.ready"))
        .unwrap_or_else(|| panic!("expected client.ready event, got {:?}", logs));
    assert!(ready.contains("INFO"), "{ready}");
    assert!(ready.contains("capacity=7"), "{ready}");
    assert!(ready.contains("min_interval_ms=250"), "{ready}");
    assert!(ready.contains("authenticated=false"), "{ready}");
}
