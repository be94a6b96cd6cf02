//! Tests for the moderation workflow
//!
//! Exercises the state machine end to end: submit, approve (fork),
//! reject, soft delete, restore and purge, including the permission and
//! invalid-transition failure paths.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use rolodex::database::{init_db, AppState};
use rolodex::route::create_app;

const ADMIN_TOKEN: &str = "admin_secret";

fn setup_test_app() -> (axum::Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();
    let db = init_db(db_path).expect("Failed to initialize test database");
    let state = AppState {
        db: Arc::new(db),
        admin_token: Some(ADMIN_TOKEN.to_string()),
    };
    (create_app(state), temp_db)
}

async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

fn api_request(method: &str, uri: &str, user: &str, admin: bool, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", user);
    if admin {
        builder = builder.header("X-Admin-Token", ADMIN_TOKEN);
    }
    match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Creates an entry owned by `user` and returns its id
async fn create_entry(app: &axum::Router, user: &str, title: &str) -> u64 {
    let payload = json!({
        "url": format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        "title": title,
        "tags": ["shared"],
    });

    let response = app
        .clone()
        .oneshot(api_request("POST", "/api/entries", user, false, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response.into_body()).await;
    body["id"].as_u64().unwrap()
}

/// Creates and submits an entry, returning its id
async fn create_submitted_entry(app: &axum::Router, user: &str, title: &str) -> u64 {
    let id = create_entry(app, user, title).await;
    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/entries/{id}/submit"), user, false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    id
}

async fn fetch_entry(app: &axum::Router, user: &str, admin: bool, id: u64) -> Value {
    let response = app
        .clone()
        .oneshot(api_request("GET", &format!("/api/entries/{id}"), user, admin, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response.into_body()).await
}

#[tokio::test]
async fn test_submit_transitions_to_submitted() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "My Link").await;

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/entries/{id}/submit"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["status"], "submitted");

    let entry = fetch_entry(&app, "alice", false, id).await;
    assert_eq!(entry["status"], "submitted");
}

#[tokio::test]
async fn test_submit_requires_owner() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "My Link").await;

    let response = app
        .oneshot(api_request("POST", &format!("/api/entries/{id}/submit"), "bob", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "not_owner");
}

#[tokio::test]
async fn test_submit_twice_rejected() {
    let (app, _temp_db) = setup_test_app();

    let id = create_submitted_entry(&app, "alice", "My Link").await;

    // At most one outstanding submission per entry
    let response = app
        .oneshot(api_request("POST", &format!("/api/entries/{id}/submit"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "invalid_transition");
}

#[tokio::test]
async fn test_submit_unknown_entry() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .oneshot(api_request("POST", "/api/entries/4242/submit", "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approve_forks_public_copy() {
    let (app, _temp_db) = setup_test_app();

    let source_id = create_submitted_entry(&app, "alice", "Example Site").await;

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/admin/approve/{source_id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let copy = response_json(response.into_body()).await;
    assert_ne!(copy["id"].as_u64().unwrap(), source_id);
    assert_eq!(copy["is_public_copy"], true);
    assert_eq!(copy["status"], "approved");
    assert_eq!(copy["original_id"], source_id);
    assert_eq!(copy["owner_id"], "admin");
    assert_eq!(copy["title"], "Example Site");
    assert_eq!(copy["tags"], json!(["shared"]));

    // The fork is additive: the source keeps its submitted status
    let source = fetch_entry(&app, "alice", false, source_id).await;
    assert_eq!(source["status"], "submitted");

    // And the copy is what the directory serves
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/yellowpages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], copy["id"]);
}

#[tokio::test]
async fn test_approve_requires_admin() {
    let (app, _temp_db) = setup_test_app();

    let id = create_submitted_entry(&app, "alice", "My Link").await;

    let response = app
        .oneshot(api_request("POST", &format!("/api/admin/approve/{id}"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn test_approve_twice_creates_no_second_copy() {
    let (app, _temp_db) = setup_test_app();

    let id = create_submitted_entry(&app, "alice", "My Link").await;

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/admin/approve/{id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/admin/approve/{id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/yellowpages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_approve_unsubmitted_entry() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "Still Private").await;

    let response = app
        .oneshot(api_request("POST", &format!("/api/admin/approve/{id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reject_blocks_resubmission() {
    let (app, _temp_db) = setup_test_app();

    let id = create_submitted_entry(&app, "alice", "My Link").await;

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/admin/reject/{id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["status"], "rejected");

    // Rejection is terminal for this entry: no way back into the queue
    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/entries/{id}/submit"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // But the owner may still edit the rejected entry
    let payload = json!({"url": "https://example.com/fixed", "title": "Fixed"});
    let response = app
        .oneshot(api_request("PUT", &format!("/api/entries/{id}"), "alice", false, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reject_never_submitted_entry() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "Private Forever").await;

    let response = app
        .oneshot(api_request("POST", &format!("/api/admin/reject/{id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "invalid_transition");
}

#[tokio::test]
async fn test_reject_requires_admin() {
    let (app, _temp_db) = setup_test_app();

    let id = create_submitted_entry(&app, "alice", "My Link").await;

    let response = app
        .oneshot(api_request("POST", &format!("/api/admin/reject/{id}"), "bob", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_soft_delete_then_purge() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "Doomed").await;

    let response = app
        .clone()
        .oneshot(api_request("DELETE", &format!("/api/entries/{id}"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["deleted_id"], id);

    // Still present (soft-deleted) until an admin purges
    let entry = fetch_entry(&app, "alice", false, id).await;
    assert_eq!(entry["status"], "deleted");

    let response = app
        .clone()
        .oneshot(api_request("POST", "/api/admin/purge", "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["purged"], 1);

    // Gone for good
    let response = app
        .oneshot(api_request("GET", &format!("/api/entries/{id}"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_purge_requires_admin() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .oneshot(api_request("POST", "/api/admin/purge", "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_purge_with_nothing_deleted() {
    let (app, _temp_db) = setup_test_app();

    create_entry(&app, "alice", "Alive").await;

    let response = app
        .oneshot(api_request("POST", "/api/admin/purge", "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["purged"], 0);
}

#[tokio::test]
async fn test_restore_reverts_to_private() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "Recoverable").await;

    app.clone()
        .oneshot(api_request("DELETE", &format!("/api/entries/{id}"), "alice", false, None))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/entries/{id}/restore"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["status"], "private");
}

#[tokio::test]
async fn test_restore_requires_deleted_status() {
    let (app, _temp_db) = setup_test_app();

    let id = create_entry(&app, "alice", "Not Deleted").await;

    let response = app
        .oneshot(api_request("POST", &format!("/api/entries/{id}/restore"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "invalid_transition");
}

#[tokio::test]
async fn test_deleting_source_keeps_public_copy() {
    let (app, _temp_db) = setup_test_app();

    let source_id = create_submitted_entry(&app, "alice", "Survivor").await;

    let response = app
        .clone()
        .oneshot(api_request("POST", &format!("/api/admin/approve/{source_id}"), "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let copy = response_json(response.into_body()).await;

    // The owner deletes their original; the audit trail must survive
    let response = app
        .clone()
        .oneshot(api_request("DELETE", &format!("/api/entries/{source_id}"), "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/yellowpages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], copy["id"]);
    assert_eq!(body["data"][0]["original_id"], source_id);
}

#[tokio::test]
async fn test_pending_queue_visibility() {
    let (app, _temp_db) = setup_test_app();

    create_entry(&app, "alice", "Unsubmitted").await;
    let submitted_id = create_submitted_entry(&app, "bob", "In Review").await;

    let response = app
        .clone()
        .oneshot(api_request("GET", "/api/admin/pending", "admin", true, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], submitted_id);

    // Resolving the submission empties the queue
    app.clone()
        .oneshot(api_request("POST", &format!("/api/admin/approve/{submitted_id}"), "admin", true, None))
        .await
        .unwrap();

    let response = app
        .oneshot(api_request("GET", "/api/admin/pending", "admin", true, None))
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_pending_queue_requires_admin() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .oneshot(api_request("GET", "/api/admin/pending", "alice", false, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
