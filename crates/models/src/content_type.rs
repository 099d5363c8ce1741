use serde::{Deserialize, Serialize};

/// Wire-level content type tag (spec.md §6). Selects which parser encodes and
/// decodes a payload, and is stored alongside every Fragment/Item/BufferedFragment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
pub enum ContentType {
    Json = 0,
    Raw = 1,
    GtfsRt = 2,
    Csv = 3,
    Gtfs = 4,
}

impl ContentType {
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(ContentType::Json),
            1 => Some(ContentType::Raw),
            2 => Some(ContentType::GtfsRt),
            3 => Some(ContentType::Csv),
            4 => Some(ContentType::Gtfs),
            _ => None,
        }
    }

    pub fn as_wire(self) -> i32 {
        self as i32
    }
}

impl Default for ContentType {
    // No content-type hint falls back to RAW (spec.md §4.2: "There is no
    // inference -- the caller supplies the content type; if unknown, RAW is
    // used").
    fn default() -> Self {
        ContentType::Raw
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentType::Json => "json",
            ContentType::Raw => "raw",
            ContentType::GtfsRt => "gtfs_rt",
            ContentType::Csv => "csv",
            ContentType::Gtfs => "gtfs",
        };
        f.write_str(name)
    }
}
