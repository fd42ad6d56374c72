//! Handler-level tests over the sample in-memory world.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use test_utils::{sample_repository, PROJECT_SYSCODE};
use tile_api::state::AppState;

fn app() -> axum::Router {
    tile_api::router(Arc::new(AppState::from_repository(sample_repository())))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_tile_serves_content_with_etag() {
    let app = app();

    let response = app
        .oneshot(
            Request::get("/tiles/0/0/0?class=Roads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let etag = response.headers().get(header::ETAG).unwrap();
    assert!(etag.to_str().unwrap().starts_with('"'));
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=0"
    );
}

#[tokio::test]
async fn conditional_get_returns_not_modified() {
    let app = app();

    let first = app
        .clone()
        .oneshot(
            Request::get("/tiles/0/0/0?class=Roads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let etag = first.headers().get(header::ETAG).unwrap().clone();

    let second = app
        .oneshot(
            Request::get("/tiles/0/0/0?class=Roads")
                .header(header::IF_NONE_MATCH, etag.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers().get(header::ETAG).unwrap(), &etag);
}

#[tokio::test]
async fn attribute_tile_roundtrip() {
    let app = app();

    let response = app
        .oneshot(
            Request::get("/tiles/0/0/0?class=Roads&attr=name")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let decoded: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(decoded["attributes"][0]["feature_id"], 100);
}

#[tokio::test]
async fn unknown_class_is_not_found() {
    let app = app();

    let response = app
        .oneshot(
            Request::get("/tiles/0/0/0?class=Ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn undefined_attribute_is_not_found() {
    let app = app();

    let response = app
        .oneshot(
            Request::get("/tiles/0/0/0?class=Roads&attr=nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_generation_over_extent() {
    let app = app();

    let request = serde_json::json!({
        "extent": "-1.0,-1.0,1.0,1.0",
        "feature_classes": ["Roads"],
        "from_level": 0,
        "to_level": 1,
    });
    let response = app
        .oneshot(
            Request::post("/generator")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Level 0 yields one tile; at level 1 the extent straddles the origin,
    // touching all four tiles.
    assert_eq!(body["tiles_saved"].as_u64().unwrap(), 5);
}

#[tokio::test]
async fn bulk_generation_for_project() {
    let app = app();

    let request = serde_json::json!({
        "project_syscode": PROJECT_SYSCODE,
        "feature_classes": ["Roads"],
        "from_level": 0,
        "to_level": 0,
    });
    let response = app
        .oneshot(
            Request::post("/generator")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // One geometry tile plus the kind/name/toll attribute tiles.
    assert_eq!(body["tiles_saved"].as_u64().unwrap(), 4);
}

#[tokio::test]
async fn malformed_extent_is_bad_request() {
    let app = app();

    let request = serde_json::json!({
        "extent": "not,an,extent",
        "feature_classes": ["Roads"],
    });
    let response = app
        .oneshot(
            Request::post("/generator")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extent_and_project_together_rejected() {
    let app = app();

    let request = serde_json::json!({
        "extent": "-1.0,-1.0,1.0,1.0",
        "project_syscode": PROJECT_SYSCODE,
        "feature_classes": ["Roads"],
    });
    let response = app
        .oneshot(
            Request::post("/generator")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subclass_next_to_ancestor_rejected() {
    let app = app();

    let request = serde_json::json!({
        "extent": "-1.0,-1.0,1.0,1.0",
        "feature_classes": ["Roads", "RoadsMajor"],
    });
    let response = app
        .oneshot(
            Request::post("/generator")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_class_in_bulk_is_not_found() {
    let app = app();

    let request = serde_json::json!({
        "extent": "-1.0,-1.0,1.0,1.0",
        "feature_classes": ["Ghost"],
    });
    let response = app
        .oneshot(
            Request::post("/generator")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
