mod bridge;
mod decode;
mod encode;
mod error;
mod federated;
mod schema;

pub use bridge::{ColumnarBridge, EncodedFragment};
pub use decode::DecodedRow;
pub use encode::RowMeta;
pub use error::ColumnarError;
pub use federated::advanced_query;

pub use parquet::basic::Compression;
