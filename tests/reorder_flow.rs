//! End-to-end tests for the subcategory reorder flow.
//!
//! Each test runs against its own wiremock backend: the snapshot is loaded
//! over HTTP, a sort session is driven through drag operations, and the
//! resulting PUT sequence is checked request by request.

use catalog_admin::api::{load_snapshot, CatalogClient};
use catalog_admin::catalog::{
    persist_sort_order, CatalogSnapshot, ReorderSession, RowSpan, SelectionState, SortUpdate,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client_for(server: &MockServer) -> CatalogClient {
    let base = Url::parse(&format!("{}/", server.uri())).unwrap();
    CatalogClient::new(reqwest::Client::new(), base, Duration::from_secs(5))
}

fn success(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": data}))
}

/// Backend with one category holding A(0), B(1), C(2).
async fn seeded_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/product-categories"))
        .respond_with(success(json!([
            {"id": 1, "name": "Frames", "code": "FRAME", "sort_order": 0}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/product-subcategories"))
        .respond_with(success(json!([
            {"id": 10, "category_id": 1, "name": "A", "code": "A", "sort_order": 0},
            {"id": 11, "category_id": 1, "name": "B", "code": "B", "sort_order": 1},
            {"id": 12, "category_id": 1, "name": "C", "code": "C", "sort_order": 2}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/products"))
        .respond_with(success(json!([])))
        .mount(&server)
        .await;
    server
}

fn open_session(snapshot: &CatalogSnapshot) -> ReorderSession {
    let mut selection = SelectionState::default();
    selection.select_category(1);
    ReorderSession::open(&selection, snapshot).unwrap()
}

/// Row geometry used by the drag tests: three 40px rows.
fn rows() -> Vec<RowSpan> {
    (0..3).map(|i| RowSpan::new(i as f32 * 40.0, 40.0)).collect()
}

/// `(id, sort_order)` of every PUT the backend received, in arrival order.
async fn received_puts(server: &MockServer) -> Vec<(i64, i64)> {
    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| {
            let id = r
                .url
                .path()
                .rsplit('/')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap();
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            (id, body["sort_order"].as_i64().unwrap())
        })
        .collect()
}

#[tokio::test]
async fn test_drag_last_to_top_saves_in_order() {
    let server = seeded_backend().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/admin/product-subcategories/\d+$"))
        .respond_with(|req: &Request| {
            let id: i64 = req
                .url
                .path()
                .rsplit('/')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            success(json!({"id": id, "name": "x", "code": "x"}))
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = load_snapshot(&client).await.unwrap();
    let mut session = open_session(&snapshot);

    // Pick up C and hover it over the top half of A
    session.begin_drag(12).unwrap();
    assert!(session.hover_insertion_point(10, 5.0, &rows()));
    let ids: Vec<i64> = session.visual_items().map(|s| s.id).collect();
    assert_eq!(ids, vec![12, 10, 11]);
    session.complete_drop();
    assert!(session.is_modified());

    let plan = session.save_plan();
    assert_eq!(
        plan,
        vec![
            SortUpdate { subcategory_id: 12, sort_order: 0 },
            SortUpdate { subcategory_id: 10, sort_order: 1 },
            SortUpdate { subcategory_id: 11, sort_order: 2 },
        ]
    );

    let applied = persist_sort_order(&client, &plan).await.unwrap();
    assert_eq!(applied, 3);
    assert_eq!(received_puts(&server).await, vec![(12, 0), (10, 1), (11, 2)]);
}

#[tokio::test]
async fn test_failure_stops_later_updates() {
    let server = seeded_backend().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/product-subcategories/12"))
        .respond_with(success(json!({"id": 12, "name": "C", "code": "C"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/product-subcategories/10"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "message": "Subcategory is locked"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/product-subcategories/11"))
        .respond_with(success(json!({"id": 11, "name": "B", "code": "B"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = load_snapshot(&client).await.unwrap();
    let mut session = open_session(&snapshot);
    session.begin_drag(12).unwrap();
    session.nudge(-2);
    session.complete_drop();

    let err = persist_sort_order(&client, &session.save_plan())
        .await
        .unwrap_err();
    assert_eq!(err.failed_id, 10);
    assert_eq!(err.applied, 1);
    assert_eq!(err.total, 3);
    assert_eq!(err.user_message(), "Subcategory 10: Subcategory is locked");

    // The first update stays applied; nothing after the failure was sent
    let puts = received_puts(&server).await;
    assert_eq!(puts.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![12, 10]);
}

#[tokio::test]
async fn test_aborted_drag_sends_nothing() {
    let server = seeded_backend().await;
    let client = client_for(&server);
    let snapshot = load_snapshot(&client).await.unwrap();
    let mut session = open_session(&snapshot);

    session.begin_drag(10).unwrap();
    session.hover_insertion_point(12, 100.0, &rows());
    session.abort_drag();

    assert!(!session.is_modified());
    let ids: Vec<i64> = session.visual_items().map(|s| s.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);
    assert!(received_puts(&server).await.is_empty());
}

#[tokio::test]
async fn test_snapshot_load_fails_when_one_list_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/product-categories"))
        .respond_with(success(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/product-subcategories"))
        .respond_with(success(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/products"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(load_snapshot(&client_for(&server)).await.is_err());
}
