use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use brainshelf_api::{router, AppState};
use brainshelf_db::test_fixtures::{connect_test_db, create_test_project, unique_name};

async fn call(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_tag_lifecycle_over_http() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let app = router(AppState::new(db));

    let old = unique_name("js");
    let new = unique_name("javascript");

    let (status, entry) = call(
        &app,
        Method::POST,
        "/api/v1/entries",
        Some(json!({
            "projectId": project.id,
            "title": "Closures",
            "type": "note",
            "content": "functions capturing scope",
            "tags": [old.to_uppercase(), new]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = entry["id"].as_str().unwrap().to_string();

    let (status, tags) = call(&app, Method::GET, &format!("/api/v1/tags?search={}", old), None).await;
    assert_eq!(status, StatusCode::OK);
    let source_id = tags[0]["id"].clone();
    assert_eq!(tags[0]["name"], old);

    let (_, tags) = call(&app, Method::GET, &format!("/api/v1/tags?search={}", new), None).await;
    let target_id = tags[0]["id"].clone();

    // Renaming onto an existing name conflicts.
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/tags/{}/rename", source_id.as_str().unwrap()),
        Some(json!({ "newName": new })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/tags/merge",
        Some(json!({ "sourceTagId": source_id, "targetTagId": target_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tags merged successfully");
    assert_eq!(body["reassignedEntries"], 1);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/tags/{}", source_id.as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, entry) = call(&app, Method::GET, &format!("/api/v1/entries/{}", entry_id), None).await;
    assert_eq!(entry["tags"], json!([new]));

    let (status, stats) = call(&app, Method::GET, "/api/v1/tags/statistics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["totalTags"].as_i64().unwrap() >= 1);
    assert!(stats["mostUsedTags"].as_array().unwrap().len() <= 10);
    assert!(stats["recentlyUsedTags"].as_array().unwrap().len() <= 10);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/v1/tags/{}", target_id.as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/entries/{}", entry_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_search_over_http_uses_page_shape() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let app = router(AppState::new(db));

    let (status, page) = call(
        &app,
        Method::GET,
        &format!("/api/v1/search?projectId={}&pageSize=5", project.id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 0);
    assert_eq!(page["pageNumber"], 1);
    assert_eq!(page["pageSize"], 5);
    assert!(page["items"].as_array().unwrap().is_empty());
    assert!(page.get("totalPages").is_some());
}
