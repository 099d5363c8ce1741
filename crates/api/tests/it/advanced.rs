use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tower::ServiceExt;

use crate::support::{body_json, test_state};

#[sqlx::test(migrations = "../catalog/migrations")]
async fn advanced_query_rejects_a_span_over_seven_days(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(pool, dir.path(), 64 * 1024 * 1024);
    let app = api::routes::routes(state);

    let body = serde_json::json!({
        "min_timestamp": 0,
        "max_timestamp": 864_000,
        "query": "SELECT count(*) FROM [table]",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/advanced/A/")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Max difference between timestamps is 7 day");
    Ok(())
}
