/// Error returned by a `ContentParser`. Every variant is a malformed-payload
/// condition -- these are reported back to the caller as
/// `DomainError::Unparseable` (spec.md §4.5), never as a 5xx.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("payload does not match content type {0}: {1}")]
    TypeMismatch(models::ContentType, String),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("could not parse protobuf schema: {0}")]
    ProtoSchema(String),

    #[error("invalid protobuf payload: {0}")]
    Protobuf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
