use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};

use super::{generate_storage_key, Storage, StorageError, StoredBlob};

// Local filesystem storage
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf, // Base directory where blobs are stored
}

impl LocalStorage {
    /// Creates a new LocalStorage instance and ensures the base directory exists
    pub async fn new(base_path: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path).await?;
        Ok(Self {
            base_path: base_path.to_path_buf(),
        })
    }

    /// Returns the full path of a blob; keys are flat names only
    fn get_full_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, content: Bytes, original_filename: &str) -> Result<StoredBlob, StorageError> {
        let key = generate_storage_key(original_filename);
        let full_path = self.get_full_path(&key)?;

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&content).await?;
        file.flush().await?;

        tracing::debug!("Saved blob at {:?}", full_path);

        Ok(StoredBlob {
            key,
            size: content.len() as u64,
        })
    }

    async fn open(&self, key: &str) -> Result<Bytes, StorageError> {
        let full_path = self.get_full_path(key)?;

        let content = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::IoError(e)
            }
        })?;

        Ok(Bytes::from(content))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let full_path = self.get_full_path(key)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_storage() -> (LocalStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(&temp_dir.path().join("uploads")).await.unwrap();
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn save_then_open_returns_same_bytes() {
        let (storage, temp_dir) = create_test_storage().await;

        let blob = storage.save(Bytes::from_static(b"PK\x03\x04data"), "app.zip").await.unwrap();
        assert_eq!(blob.size, 8);
        assert!(blob.key.ends_with(".zip"));
        assert!(temp_dir.path().join("uploads").join(&blob.key).exists());

        let content = storage.open(&blob.key).await.unwrap();
        assert_eq!(&content[..], b"PK\x03\x04data");
    }

    #[tokio::test]
    async fn open_reports_missing_blob() {
        let (storage, _temp_dir) = create_test_storage().await;

        let blob = storage.save(Bytes::from_static(b"x"), "a.rar").await.unwrap();
        std::fs::remove_file(storage.base_path.join(&blob.key)).unwrap();

        assert!(matches!(storage.open(&blob.key).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (storage, _temp_dir) = create_test_storage().await;

        let blob = storage.save(Bytes::from_static(b"x"), "a.7z").await.unwrap();
        storage.delete(&blob.key).await.unwrap();
        storage.delete(&blob.key).await.unwrap();
        assert!(matches!(storage.open(&blob.key).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_base_directory() {
        let (storage, _temp_dir) = create_test_storage().await;

        assert!(matches!(storage.open("../secret").await, Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.delete("a/b.zip").await, Err(StorageError::InvalidKey(_))));
    }
}
