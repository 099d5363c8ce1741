//! Parser for the GTFS-realtime content type. Unlike every other parser,
//! this one doesn't know its message schema at compile time: it parses the
//! public `transit_realtime.FeedMessage` `.proto` definition at runtime with
//! `protobuf-parse`'s pure-Rust parser, then decodes payloads dynamically
//! against the resulting descriptor, the same approach the teacher's
//! `parser` crate uses for its configurable protobuf format.
use crate::{ContentParser, ParseError};
use models::ContentType;
use protobuf::reflect::{FileDescriptor, MessageDescriptor};
use protobuf::CodedInputStream;
use protobuf_json_mapping::PrintOptions;
use serde_json::Value;
use std::sync::OnceLock;

const PROTO_SCHEMA: &str = include_str!("../assets/gtfs-realtime.proto");
const MESSAGE_NAME: &str = "FeedMessage";

pub struct GtfsRtParser {
    descriptor: &'static MessageDescriptor,
}

fn feed_message_descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        let dir = tempfile::tempdir().expect("tempdir for gtfs-realtime.proto");
        let proto_path = dir.path().join("gtfs-realtime.proto");
        std::fs::write(&proto_path, PROTO_SCHEMA).expect("write embedded gtfs-realtime.proto");

        let parsed = protobuf_parse::Parser::new()
            .pure()
            .includes(&[dir.path().to_path_buf()])
            .input(&proto_path)
            .parse_and_typecheck()
            .expect("embedded gtfs-realtime.proto is well-formed");

        FileDescriptor::new_dynamic_fds(parsed.file_descriptors, &[])
            .expect("resolve gtfs-realtime.proto descriptors")
            .into_iter()
            .find_map(|fd| fd.message_by_package_relative_name(MESSAGE_NAME))
            .expect("FeedMessage present in embedded schema")
    })
}

impl GtfsRtParser {
    pub fn new() -> Self {
        GtfsRtParser {
            descriptor: feed_message_descriptor(),
        }
    }
}

impl Default for GtfsRtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentParser for GtfsRtParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Value>, ParseError> {
        let mut message = self.descriptor.new_instance();
        let mut stream = CodedInputStream::from_bytes(bytes);
        message
            .merge_from_dyn(&mut stream)
            .map_err(|e| ParseError::Protobuf(e.to_string()))?;

        let print_options = PrintOptions {
            enum_values_int: false,
            proto_field_name: false,
            always_output_default_values: false,
            ..Default::default()
        };
        let json_str =
            protobuf_json_mapping::print_to_string_with_options(&*message, &print_options)
                .map_err(|e| ParseError::Protobuf(format!("{e:?}")))?;
        let value: Value = serde_json::from_str(&json_str)?;
        Ok(vec![value])
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
        let json_str = serde_json::to_string(value)?;
        let mut message = self.descriptor.new_instance();
        protobuf_json_mapping::merge_from_str(&mut *message, &json_str).map_err(|e| {
            ParseError::TypeMismatch(ContentType::GtfsRt, format!("{e:?}"))
        })?;
        message
            .write_to_bytes_dyn()
            .map_err(|e| ParseError::Protobuf(e.to_string()))
    }

    fn content_type(&self) -> ContentType {
        ContentType::GtfsRt
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_non_protobuf_bytes() {
        let parser = GtfsRtParser::new();
        let result = parser.parse(b"not a protobuf feed message at all, hopefully");
        assert!(result.is_err());
    }
}
