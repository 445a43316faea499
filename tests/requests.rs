mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::Hosts;
use reddit_oauth::{AuthClient, Error, ReqwestTransport, RequestOptions};

#[tokio::test]
async fn get_sends_params_in_query_string() {
    let hosts = Hosts::start().await;
    Mock::given(method("GET"))
        .and(path("/r/rust/hot"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "Listing" })))
        .expect(1)
        .mount(&hosts.public)
        .await;

    let client = AuthClient::new(hosts.config()).unwrap();
    let listing = client
        .get("/r/rust/hot", [("limit", "5")])
        .await
        .expect("listing");
    assert_eq!(listing.json["kind"], "Listing");
}

#[tokio::test]
async fn post_sends_form_body() {
    let hosts = Hosts::start().await;
    Mock::given(method("POST"))
        .and(path("/api/comment"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("thing_id=t3_abc&text=hello+world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&hosts.auth)
        .await;

    let client = AuthClient::new(hosts.config().with_tokens(Some("T".into()), None)).unwrap();
    let resp = client
        .post(
            "/api/comment",
            [("thing_id", "t3_abc"), ("text", "hello world")],
        )
        .await
        .expect("comment");

    #[derive(serde::Deserialize)]
    struct Ack {
        success: bool,
    }
    assert!(resp.parse::<Ack>().unwrap().success);
}

#[tokio::test]
async fn malformed_json_on_200_fails_the_call() {
    let hosts = Hosts::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&hosts.public)
        .await;

    let client = AuthClient::new(hosts.config()).unwrap();
    match client.request("/api/v1/me", RequestOptions::new()).await {
        Err(Error::MalformedResponse { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        Err(other) => panic!("expected MalformedResponse, got {other}"),
        Ok(_) => panic!("expected MalformedResponse, got Ok"),
    }
}

#[tokio::test]
async fn full_queue_rejects_until_a_slot_frees() {
    let hosts = Hosts::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&hosts.public)
        .await;

    let client = AuthClient::new(hosts.config().with_request_buffer(1)).unwrap();

    let x = client.submit("/x", RequestOptions::new()).expect("first fits");
    assert_eq!(client.queue_len(), 1);
    match client.submit("/y", RequestOptions::new()) {
        Err(Error::QueueFull { capacity }) => assert_eq!(capacity, 1),
        Err(other) => panic!("expected QueueFull, got {other}"),
        Ok(_) => panic!("expected QueueFull, got Ok"),
    }

    x.await.expect("first completes");
    assert_eq!(client.queue_len(), 0);
    client
        .request("/z", RequestOptions::new())
        .await
        .expect("third call fits after the first completed");

    let paths: Vec<String> = hosts
        .public_requests()
        .await
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/x", "/z"]);
}

#[tokio::test]
async fn min_interval_spaces_requests() {
    let hosts = Hosts::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&hosts.public)
        .await;

    let client = AuthClient::new(
        hosts
            .config()
            .with_min_interval(Duration::from_millis(200)),
    )
    .unwrap();

    let started = std::time::Instant::now();
    let a = client.submit("/a", RequestOptions::new()).unwrap();
    let b = client.submit("/b", RequestOptions::new()).unwrap();
    let c = client.submit("/c", RequestOptions::new()).unwrap();
    a.await.unwrap();
    b.await.unwrap();
    c.await.unwrap();

    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "three requests with a 200ms interval finished in {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn default_user_agent_is_sent() {
    let hosts = Hosts::start().await;
    Mock::given(method("GET"))
        .and(header(
            "User-Agent",
            concat!("reddit-oauth-rust/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&hosts.public)
        .await;

    let mut config = hosts.config();
    config.user_agent = None;
    let client = AuthClient::new(config).unwrap();
    client
        .request("/api/v1/scopes", RequestOptions::new())
        .await
        .expect("default user agent");
}

#[tokio::test]
async fn transport_error_reaches_the_caller_and_queue_moves_on() {
    let hosts = Hosts::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&hosts.public)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&hosts.public)
        .await;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let client =
        AuthClient::with_transport(hosts.config(), ReqwestTransport::new(http_client)).unwrap();

    let slow = client.submit("/slow", RequestOptions::new()).unwrap();
    let fast = client.submit("/fast", RequestOptions::new()).unwrap();

    match slow.await {
        Err(Error::Http(err)) => assert!(err.is_timeout(), "expected a timeout, got {err}"),
        Err(other) => panic!("expected Error::Http, got {other}"),
        Ok(_) => panic!("expected Error::Http, got Ok"),
    }
    assert_eq!(fast.await.expect("queue keeps dispatching").json["ok"], true);
    assert!(!client.is_authenticated());
}
