use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use super::{read, write, EntityKind, IdAllocator};
use crate::error::{AppError, Result};
use crate::models::{CategoryId, File, FileId, NewFile};

pub struct FileStore {
    ids: Arc<IdAllocator>,
    files: RwLock<BTreeMap<FileId, File>>,
}

impl FileStore {
    pub fn new(ids: Arc<IdAllocator>) -> Self {
        Self {
            ids,
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Assign an ID and insert the record. The caller has already checked
    /// that `category_id` exists.
    pub fn create(&self, new: NewFile) -> File {
        let file = File {
            id: self.ids.next_id(EntityKind::File),
            name: new.name,
            description: new.description,
            size: new.size,
            storage_key: new.storage_key,
            file_type: new.file_type,
            downloads: 0,
            category_id: new.category_id,
            created_at: Utc::now(),
        };

        write(&self.files).insert(file.id, file.clone());
        file
    }

    pub fn get(&self, id: FileId) -> Option<File> {
        read(&self.files).get(&id).cloned()
    }

    /// All files, or only those of `category_id` when given.
    pub fn list_by(&self, category_id: Option<CategoryId>) -> Vec<File> {
        read(&self.files)
            .values()
            .filter(|f| category_id.is_none_or(|id| f.category_id == id))
            .cloned()
            .collect()
    }

    pub fn count_by(&self, category_id: CategoryId) -> usize {
        read(&self.files)
            .values()
            .filter(|f| f.category_id == category_id)
            .count()
    }

    pub fn increment_downloads(&self, id: FileId) -> Result<File> {
        let mut files = write(&self.files);
        let file = files
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        file.downloads += 1;
        Ok(file.clone())
    }

    /// Remove the metadata record only; blob removal is the catalog's job.
    pub fn delete(&self, id: FileId) -> Result<File> {
        write(&self.files)
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }
}
