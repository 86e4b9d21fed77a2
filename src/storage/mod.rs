// Local filesystem blob storage
mod local;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

pub use local::LocalStorage;

use crate::{config::Config, utils::get_file_extension};

// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String), // Metadata may exist while the blob was removed externally

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Location and length of a freshly written blob.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub key: String,
    pub size: u64,
}

// Async blob storage trait
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `content` under a newly generated key derived from `original_filename`.
    async fn save(&self, content: Bytes, original_filename: &str) -> Result<StoredBlob, StorageError>;

    /// Read back the blob stored under `key`.
    async fn open(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Remove the blob stored under `key`. A missing blob is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to the configured storage backend.
pub type StorageBackend = Arc<dyn Storage>;

/// Generates `<unix-seconds>-<uuid>.<ext>`; the uploaded name itself never
/// reaches the filesystem.
pub fn generate_storage_key(original_filename: &str) -> String {
    let stem = format!("{}-{}", Utc::now().timestamp(), Uuid::new_v4());
    match get_file_extension(original_filename) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// Delete a blob, logging instead of failing. Returns `false` on failure so
/// callers can still drop the metadata record.
pub async fn delete_blob(storage: &dyn Storage, key: &str) -> bool {
    match storage.delete(key).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to delete blob {}: {}", key, e);
            false
        }
    }
}

// Initialize the storage backend based on config
pub async fn init_storage(config: &Config) -> Result<StorageBackend, StorageError> {
    info!("Initializing local storage at {}", config.upload_dir.display());
    let storage = LocalStorage::new(&config.upload_dir).await?;
    Ok(Arc::new(storage))
}
