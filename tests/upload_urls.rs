mod common;

use axum::http::StatusCode;
use sea_orm::EntityTrait;
use serde_json::json;

use common::{Auth, TestApp};
use vidhost::entities::video_upload_url;

#[tokio::test]
async fn issuing_an_upload_url_records_a_grant() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", "pw").await;

    let token = app.token(&alice);
    let response = app
        .request(
            "POST",
            "/api/v1/video-upload-urls/",
            Some(json!({ "filename": "holiday.mp4" })),
            Auth::Bearer(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let id = response.body["id"].as_str().unwrap();
    assert_eq!(response.body["method"], "PUT");
    assert_eq!(
        response.body["url"],
        format!("https://uploads.test/{}/holiday.mp4", id)
    );
    assert!(response.body["expires_at"].as_i64().unwrap() > chrono::Utc::now().timestamp());
    assert_eq!(app.backend.calls_to("create_upload_url"), ["holiday.mp4"]);

    let grants = video_upload_url::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].owner_id, alice.id);
    assert_eq!(grants[0].public_video_id, id);
    assert_eq!(grants[0].filename, "holiday.mp4");
    assert_eq!(Some(grants[0].expires_at), response.body["expires_at"].as_i64());
    assert!(!grants[0].was_used);
}

#[tokio::test]
async fn issued_grant_reconciles_once_upload_completes() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", "pw").await;
    let token = app.token(&alice);

    let issued = app
        .request(
            "POST",
            "/api/v1/video-upload-urls/",
            Some(json!({ "filename": "clip.mp4" })),
            Auth::Bearer(&token),
        )
        .await;
    let id = issued.body["id"].as_str().unwrap().to_string();
    let path = format!("/api/v1/videos/{}/", id);

    let pending = app.request("GET", &path, None, Auth::Bearer(&token)).await;
    assert_eq!(pending.status, StatusCode::NOT_FOUND);

    app.backend.mark_uploaded(&id, None);
    let done = app.request("GET", &path, None, Auth::Bearer(&token)).await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.body["title"], "clip.mp4");

    let list = app.request("GET", "/api/v1/videos/", None, Auth::Bearer(&token)).await;
    assert_eq!(list.body[0]["id"], id.as_str());
}

#[tokio::test]
async fn missing_filename_is_a_field_error() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", "pw").await;

    let token = app.token(&alice);
    let response = app
        .request("POST", "/api/v1/video-upload-urls/", Some(json!({})), Auth::Bearer(&token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "filename": ["This field is required."] }));
    assert!(app.backend.calls_to("create_upload_url").is_empty());
    assert!(video_upload_url::Entity::find().all(&app.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_upload_urls_is_not_allowed() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", "pw").await;

    let token = app.token(&alice);
    let response = app
        .request("GET", "/api/v1/video-upload-urls/", None, Auth::Bearer(&token))
        .await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}
