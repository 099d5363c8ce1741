mod advanced;
mod collections;
mod delete;
mod flush;
mod query;
mod size;
mod store;

pub use advanced::advanced_query;
pub use collections::{create_collection, list_collections};
pub use delete::delete_collection;
pub use flush::flush;
pub use query::query;
pub use size::collection_size;
pub use store::store;

use serde::Serialize;

/// The `{message}` body shape every mutating route returns on success
/// (spec.md §6).
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        MessageBody { message: message.into() }
    }
}
