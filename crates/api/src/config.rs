use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::Arc;

use blob_store::{AzureBlobStore, BlobStore, FileSystemBlobStore};
use columnar::Compression;
use parquet::basic::{GzipLevel, ZstdLevel};

/// Process configuration, loaded once from the environment (spec.md §6's
/// Configuration table). Unlike `control::config::Settings`, there is no
/// `config/base.yaml` layering -- every key here is a plain env var, read
/// through `config::Environment` the same way `control::config` reads
/// `CONTROL_`-prefixed vars, just without a prefix since this service owns
/// the whole process environment.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub db_url: String,
    pub storage_path: Option<String>,
    #[serde(default = "default_io_manager")]
    pub io_manager: String,
    pub azure_storage_connection_string: Option<String>,
    pub azure_storage_container_name: Option<String>,
    #[serde(default = "default_compression")]
    pub compression: String,
    pub compression_level: Option<u32>,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: i64,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_io_manager() -> String {
    "file_system".to_string()
}

fn default_compression() -> String {
    "gzip".to_string()
}

fn default_buffer_size() -> i64 {
    6
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Buffer flush threshold in bytes (§6's `BUFFER_SIZE` is in MB).
    pub fn buffer_size_bytes(&self) -> i64 {
        self.buffer_size * 1024 * 1024
    }

    /// Constructs the configured `BlobStore` backend (§4.1, §6).
    pub fn build_blob_store(&self) -> anyhow::Result<Arc<dyn BlobStore>> {
        match self.io_manager.as_str() {
            "file_system" => {
                let path = self
                    .storage_path
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("STORAGE_PATH is required when IO_MANAGER=file_system"))?;
                Ok(Arc::new(FileSystemBlobStore::new(path)))
            }
            "azure_blob" => {
                let connection_string = self
                    .azure_storage_connection_string
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("AZURE_STORAGE_CONNECTION_STRING is required when IO_MANAGER=azure_blob"))?;
                let container = self
                    .azure_storage_container_name
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("AZURE_STORAGE_CONTAINER_NAME is required when IO_MANAGER=azure_blob"))?;
                Ok(Arc::new(AzureBlobStore::new(connection_string, container)?))
            }
            other => Err(anyhow::anyhow!("unknown IO_MANAGER '{other}'")),
        }
    }

    /// The `ParquetCompression` used for merge output (§4.3.1); single-row
    /// writes are always snappy regardless of this setting.
    pub fn merge_compression(&self) -> Compression {
        match self.compression.to_ascii_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "uncompressed" => Compression::UNCOMPRESSED,
            "lz4" => Compression::LZ4,
            "zstd" => {
                let level = self.compression_level.unwrap_or(3) as i32;
                ZstdLevel::try_new(level)
                    .map(Compression::ZSTD)
                    .unwrap_or_else(|_| Compression::GZIP(GzipLevel::default()))
            }
            _ => Compression::GZIP(GzipLevel::default()),
        }
    }
}

pub fn settings() -> &'static Settings {
    static SETTINGS: OnceCell<Settings> = OnceCell::new();
    SETTINGS.get_or_init(|| load_settings().expect("Failed to load settings"))
}

fn load_settings() -> Result<Settings, config::ConfigError> {
    config::Config::builder()
        .add_source(config::Environment::default())
        .build()?
        .try_deserialize()
}
