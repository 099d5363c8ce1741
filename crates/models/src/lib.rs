pub mod content_type;
pub mod error;
pub mod rows;

pub use content_type::ContentType;
pub use error::{DomainError, Invariant};
pub use rows::{BufferedFragment, Collection, CollectionStats, Fragment, Item};
