use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tower::ServiceExt;

use crate::support::{body_json, test_state};

#[sqlx::test(migrations = "../catalog/migrations")]
async fn create_list_and_delete_a_collection(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(pool, dir.path(), 64 * 1024 * 1024);
    let app = api::routes::routes(state);

    let create = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/collection/")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({"name": "events"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);

    let duplicate = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/collection/")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({"name": "events"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let list = app
        .clone()
        .oneshot(Request::builder().method("GET").uri("/collections/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(list.status(), StatusCode::OK);
    let json = body_json(list).await;
    assert_eq!(json[0]["name"], "events");
    assert_eq!(json[0]["count"], 0);

    let size = app
        .clone()
        .oneshot(Request::builder().method("GET").uri("/size/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(size.status(), StatusCode::OK);

    let delete = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/delete/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::OK);
    Ok(())
}
