use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tower::ServiceExt;

use crate::support::{body_json, test_state};

#[sqlx::test(migrations = "../catalog/migrations")]
async fn store_then_query_round_trips_raw_bytes(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(pool, dir.path(), 64 * 1024 * 1024);
    let app = api::routes::routes(state);

    let mut metadata = serde_json::json!({"timestamp": 1700000000, "content_type": 1, "create_collection": true}).to_string();
    metadata.push('\n');
    let mut body = metadata.into_bytes();
    body.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    let store_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/store/A/")
                .header("content-type", "application/octet-stream")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(store_response.status(), StatusCode::OK);

    let query_response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/query/A?min_timestamp=1699999999&max_timestamp=1700000001&ascending=true&limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(query_response.status(), StatusCode::OK);

    let json = body_json(query_response).await;
    assert_eq!(json["results"][0]["data"], "deadbeef");
    assert_eq!(json["results"][0]["timestamp"], 1700000000);
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn query_on_an_unknown_collection_returns_empty_results(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(pool, dir.path(), 64 * 1024 * 1024);
    let app = api::routes::routes(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/query/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["results"].as_array().unwrap().is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn storing_without_create_collection_is_rejected(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(pool, dir.path(), 64 * 1024 * 1024);
    let app = api::routes::routes(state);

    let mut metadata = serde_json::json!({"timestamp": 1, "content_type": 1}).to_string();
    metadata.push('\n');
    let mut body = metadata.into_bytes();
    body.extend_from_slice(b"x");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/store/missing/")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
