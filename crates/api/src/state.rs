use std::sync::Arc;

use engine::Engine;

/// Axum router state (spec.md §6): the one `Engine` instance every handler
/// shares, the same role `control::context::AppContext` plays for its
/// routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}
