use crate::csv_parser::CsvParser;
use crate::gtfs_rt::GtfsRtParser;
use crate::json::JsonParser;
use crate::raw::RawParser;
use crate::ContentParser;
use models::ContentType;
use std::sync::Arc;

/// Maps a `ContentType` to the parser that handles it (spec.md §4.2). There
/// is one registry per process; parsers are stateless aside from the
/// GTFS-realtime descriptor, which is parsed once and shared.
pub struct ParserRegistry {
    json: Arc<dyn ContentParser>,
    raw: Arc<dyn ContentParser>,
    csv: Arc<dyn ContentParser>,
    gtfs: Arc<dyn ContentParser>,
    gtfs_rt: Arc<dyn ContentParser>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry {
            json: Arc::new(JsonParser),
            raw: Arc::new(RawParser),
            csv: Arc::new(CsvParser::new(ContentType::Csv)),
            gtfs: Arc::new(CsvParser::new(ContentType::Gtfs)),
            gtfs_rt: Arc::new(GtfsRtParser::new()),
        }
    }

    /// Returns the parser for `content_type`. There is no "unknown" case:
    /// every `ContentType` variant has an assigned parser, and the RAW
    /// fallback for an unrecognized wire value happens earlier, in
    /// `ContentType::from_wire` returning `None` and the caller defaulting
    /// to `ContentType::Raw` before it ever reaches the registry.
    pub fn get(&self, content_type: ContentType) -> &Arc<dyn ContentParser> {
        match content_type {
            ContentType::Json => &self.json,
            ContentType::Raw => &self.raw,
            ContentType::Csv => &self.csv,
            ContentType::Gtfs => &self.gtfs,
            ContentType::GtfsRt => &self.gtfs_rt,
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_content_type_resolves_to_a_parser() {
        let registry = ParserRegistry::new();
        for content_type in [
            ContentType::Json,
            ContentType::Raw,
            ContentType::GtfsRt,
            ContentType::Csv,
            ContentType::Gtfs,
        ] {
            assert_eq!(registry.get(content_type).content_type(), content_type);
        }
    }
}
