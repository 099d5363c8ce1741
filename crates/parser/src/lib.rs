mod csv_parser;
mod error;
mod gtfs_rt;
mod json;
mod raw;
mod registry;

pub use error::ParseError;
pub use registry::ParserRegistry;

use models::ContentType;
use serde_json::Value;

/// Parses a payload of a known `ContentType` into one JSON value per logical
/// record, and serializes a JSON value back to wire bytes of that type
/// (spec.md §4.2). Implementations never guess at a content type other than
/// the one they were constructed for -- mismatched input is a `ParseError`,
/// not a best-effort fallback.
pub trait ContentParser: Send + Sync {
    /// Splits `bytes` into its constituent records. A buffered write always
    /// produces exactly one record; `merge` may reparse the concatenation of
    /// several.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Value>, ParseError>;

    /// The inverse of `parse` for a single record, used by `read` to hand
    /// callers back bytes shaped like what they originally sent.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ParseError>;

    fn content_type(&self) -> ContentType;
}
