//! Parser for the JSON content type. Accepts either a single JSON value or a
//! whitespace-separated stream of them -- the latter matters for `merge`,
//! which reparses the concatenation of several buffered single-record blobs.
use crate::{ContentParser, ParseError};
use models::ContentType;
use serde_json::Value;

pub struct JsonParser;

impl ContentParser for JsonParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Value>, ParseError> {
        let deser = serde_json::Deserializer::from_slice(bytes).into_iter::<Value>();
        deser.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
        serde_json::to_vec(value).map_err(Into::into)
    }

    fn content_type(&self) -> ContentType {
        ContentType::Json
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_single_object() {
        let parser = JsonParser;
        let records = parser.parse(br#"{"a":1}"#).unwrap();
        assert_eq!(records, vec![serde_json::json!({"a": 1})]);
    }

    #[test]
    fn parses_concatenated_stream() {
        let parser = JsonParser;
        let records = parser.parse(br#"{"a":1}{"a":2}"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn rejects_malformed_json() {
        let parser = JsonParser;
        assert!(parser.parse(b"{not json").is_err());
    }
}
