use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Wires every route in spec.md §6's table onto `state`, the way
/// `control::routes::routes` assembles its `Router` (axum 0.7's state is
/// attached once here via `with_state` rather than the teacher's
/// extension-layer approach).
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/collections/", get(handlers::list_collections))
        .route("/collection/", post(handlers::create_collection))
        .route("/query/:name", get(handlers::query))
        .route("/store/:name/", post(handlers::store))
        .route("/advanced/:name/", post(handlers::advanced_query))
        .route("/flush/:name", post(handlers::flush))
        .route("/delete/:name", delete(handlers::delete_collection))
        .route("/size/:name", get(handlers::collection_size))
        .with_state(state)
}
