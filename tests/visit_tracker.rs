//! Integration tests for best-effort visit reporting.
//!
//! Every test starts its own wiremock server standing in for the visit
//! endpoint, so request counts and bodies are isolated per test.

use catalog_admin::tracker::{LaunchContext, UserAuth, VisitTracker, VisitType};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tracker_for(server: &MockServer) -> VisitTracker {
    let base = Url::parse(&format!("{}/", server.uri())).unwrap();
    VisitTracker::new(reqwest::Client::new(), &base, Duration::from_secs(2)).unwrap()
}

fn launch_with_promotion(code: &str) -> LaunchContext {
    let mut query = HashMap::new();
    query.insert("promotionCode".to_string(), code.to_string());
    query.insert("referrerUserId".to_string(), "77".to_string());
    LaunchContext {
        scene: Some("1047".to_string()),
        query,
        path: Some("pages/index/index".to_string()),
    }
}

async fn bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_init_reports_launch_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/visit"))
        .and(body_partial_json(json!({
            "visitType": "launch",
            "promotionCode": "PROMO1",
            "referrerUserId": "77",
            "scene": "1047",
            "pagePath": "pages/index/index"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "visitId": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    tracker.init(launch_with_promotion("PROMO1")).await;
    tracker.init(launch_with_promotion("OTHER")).await;

    assert!(tracker.is_initialized());
    assert_eq!(tracker.session_info().promotion_code.as_deref(), Some("PROMO1"));
}

#[tokio::test]
async fn test_attribution_ignored_without_scene() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    let mut launch = launch_with_promotion("PROMO1");
    launch.scene = None;
    tracker.init(launch).await;

    let info = tracker.session_info();
    assert_eq!(info.promotion_code, None);
    assert_eq!(info.referrer_user_id, None);
}

#[tokio::test]
async fn test_server_assigned_promotion_code_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "visitId": 9,
            "promotionCode": "SRV42",
            "isNewUser": true
        })))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    let reply = tracker
        .on_page_visit("pages/product/detail", json!({"productId": 3}))
        .await
        .expect("visit recorded");
    assert_eq!(reply.visit_id, Some(9));
    assert_eq!(reply.is_new_user, Some(true));
    assert_eq!(tracker.session_info().promotion_code.as_deref(), Some("SRV42"));

    // Later reports carry the new code
    tracker.on_order(json!({"orderId": 1})).await;
    let sent = bodies(&server).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1]["promotionCode"], json!("SRV42"));
    assert_eq!(sent[1]["visitType"], json!("order"));
}

#[tokio::test]
async fn test_auth_body_is_camel_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    tracker
        .on_user_authorize(UserAuth {
            user_info: json!({"nickName": "Li"}),
            open_id: Some("oid-1".to_string()),
            user_id: Some(12),
        })
        .await;

    let sent = bodies(&server).await;
    let body = sent[0].as_object().unwrap();
    for key in [
        "sessionId",
        "openId",
        "userId",
        "visitType",
        "promotionCode",
        "referrerUserId",
        "scene",
        "userInfo",
        "pagePath",
    ] {
        assert!(body.contains_key(key), "missing {}", key);
    }
    assert_eq!(body["visitType"], json!("auth"));
    assert_eq!(body["openId"], json!("oid-1"));
    assert_eq!(body["userId"], json!(12));
    assert_eq!(body["userInfo"], json!({"nickName": "Li"}));
    assert_eq!(body["sessionId"], json!(tracker.session_id()));

    let info = tracker.session_info();
    assert_eq!(info.open_id.as_deref(), Some("oid-1"));
    assert_eq!(info.user_id, Some(12));
}

#[tokio::test]
async fn test_server_error_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/visit"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    let reply = tracker.record_visit(VisitType::Browse, Map::new()).await;
    assert_eq!(reply, None);
    assert_eq!(tracker.session_info().promotion_code, None);
}

#[tokio::test]
async fn test_unsuccessful_reply_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "visit record failed",
            "promotionCode": "IGNORED"
        })))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server);
    assert_eq!(tracker.on_order(json!({})).await, None);
    // A rejected reply never updates the promotion code
    assert_eq!(tracker.session_info().promotion_code, None);
}

#[tokio::test]
async fn test_session_info_serializes_camel_case() {
    let server = MockServer::start().await;
    let tracker = tracker_for(&server);
    let value = serde_json::to_value(tracker.session_info()).unwrap();
    assert!(value["sessionId"].as_str().unwrap().starts_with("SESSION_"));
    assert_eq!(value["promotionCode"], Value::Null);
}

#[tokio::test]
async fn test_stalled_body_is_cut_off_by_timeout() {
    // Headers arrive promptly, the promised body never does
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"success\":",
            )
            .await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let base = Url::parse(&format!("http://{}/", addr)).unwrap();
    let tracker =
        VisitTracker::new(reqwest::Client::new(), &base, Duration::from_millis(300)).unwrap();

    let started = Instant::now();
    let reply = tracker.record_visit(VisitType::Browse, Map::new()).await;
    assert_eq!(reply, None);
    assert!(started.elapsed() < Duration::from_secs(5));
}
