//! Identity parser for opaque payloads (spec.md §4.2 RAW content type, and
//! the fallback used whenever the caller's declared content type is
//! unknown). Wraps the untouched bytes in a single-field object so they
//! still round-trip through the same `Vec<Value>` shape every other parser
//! produces, which is what lets the columnar bridge treat all content types
//! uniformly.
use crate::{ContentParser, ParseError};
use models::ContentType;
use serde_json::{json, Value};

pub struct RawParser;

const FIELD: &str = "raw";

impl ContentParser for RawParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Value>, ParseError> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(vec![json!({ FIELD: encoded })])
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
        use base64::Engine;
        let encoded = value
            .get(FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::TypeMismatch(ContentType::Raw, "missing 'raw' field".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ParseError::TypeMismatch(ContentType::Raw, e.to_string()))
    }

    fn content_type(&self) -> ContentType {
        ContentType::Raw
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let parser = RawParser;
        let input = b"\x00\x01not-utf8\xff";
        let records = parser.parse(input).unwrap();
        assert_eq!(records.len(), 1);
        let back = parser.serialize(&records[0]).unwrap();
        assert_eq!(back, input);
    }
}
