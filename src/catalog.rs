//! Catalog orchestration: categories, archive files and their blobs.
//!
//! Blobs are written before metadata is inserted and deleted before metadata
//! is removed. A storage failure can leave an orphan blob, never a record
//! pointing at a blob that was never written.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    auth::AuthContext,
    error::{AppError, Result},
    models::*,
    storage::{delete_blob, StorageBackend, StorageError},
    store::Database,
    utils::parse_id,
};

/// Number of entries in `Stats::popular_files`.
const POPULAR_FILES_LIMIT: usize = 5;

/// Raw upload as received at the HTTP boundary.
#[derive(Debug, Default)]
pub struct Upload {
    pub category_id: Option<String>,
    pub original_filename: Option<String>,
    pub content: Bytes,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A blob ready to be streamed to the client.
#[derive(Debug)]
pub struct Download {
    pub content: Bytes,
    pub filename: String,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    storage: StorageBackend,
    max_upload_size: u64,
}

impl CatalogService {
    pub fn new(db: Database, storage: StorageBackend, max_upload_size: u64) -> Self {
        Self {
            db,
            storage,
            max_upload_size,
        }
    }

    pub fn list_categories(&self) -> Vec<CategoryResponse> {
        self.db
            .categories
            .list()
            .into_iter()
            .map(|category| CategoryResponse {
                file_count: self.db.files.count_by(category.id),
                category,
            })
            .collect()
    }

    pub fn get_category(&self, id: CategoryId) -> Result<CategoryDetail> {
        let category = self
            .db
            .categories
            .get(id)
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let files = self.db.files.list_by(Some(id));
        Ok(CategoryDetail {
            category,
            file_count: files.len(),
            files,
        })
    }

    pub fn create_category(&self, auth: &AuthContext, req: CreateCategoryRequest) -> Result<Category> {
        auth.require_admin()?;

        let category = self
            .db
            .categories
            .create(req.name.as_deref().unwrap_or_default(), req.description)?;

        info!("Category created: {} ({})", category.id, category.name);
        Ok(category)
    }

    pub fn update_category(&self, auth: &AuthContext, id: CategoryId, patch: CategoryPatch) -> Result<Category> {
        auth.require_admin()?;
        self.db.categories.update(id, patch)
    }

    /// Delete a category and every file in it. Blob failures are logged and
    /// skipped; metadata removal always goes through.
    pub async fn delete_category(&self, auth: &AuthContext, id: CategoryId) -> Result<()> {
        auth.require_admin()?;

        if !self.db.categories.contains(id) {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        let files = self.db.files.list_by(Some(id));
        let mut leaked = 0;
        for file in &files {
            if !delete_blob(self.storage.as_ref(), &file.storage_key).await {
                leaked += 1;
            }
            if self.db.files.delete(file.id).is_err() {
                debug!("File {} already removed during cascade", file.id);
            }
        }

        self.db.categories.delete(id)?;

        if leaked > 0 {
            warn!("Category {} deleted with {} orphaned blob(s)", id, leaked);
        }
        info!("Category deleted: {} ({} file(s))", id, files.len());
        Ok(())
    }

    pub fn list_files(&self, category_id: Option<CategoryId>) -> Vec<File> {
        self.db.files.list_by(category_id)
    }

    pub fn get_file(&self, id: FileId) -> Result<File> {
        self.db
            .files
            .get(id)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn upload_file(&self, auth: &AuthContext, upload: Upload) -> Result<File> {
        auth.require_admin()?;

        let original_filename = upload
            .original_filename
            .as_deref()
            .map(base_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

        let file_type = FileType::from_filename(original_filename)
            .ok_or_else(|| AppError::Validation("Invalid file type".to_string()))?;

        let category_id = upload
            .category_id
            .as_deref()
            .map(str::trim)
            .and_then(parse_id)
            .ok_or_else(|| AppError::Validation("Invalid category ID".to_string()))?;

        if !self.db.categories.contains(category_id) {
            return Err(AppError::Validation("Category not found".to_string()));
        }

        let size = upload.content.len() as u64;
        if size > self.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File size {} exceeds maximum limit of {} bytes",
                size, self.max_upload_size
            )));
        }

        let blob = self.storage.save(upload.content, original_filename).await?;

        let file = self.db.files.create(NewFile {
            name: non_empty(upload.name).unwrap_or_else(|| original_filename.to_string()),
            description: non_empty(upload.description),
            size: blob.size,
            storage_key: blob.key,
            file_type,
            category_id,
        });

        info!("File uploaded: {} ({} bytes)", file.id, file.size);
        Ok(file)
    }

    /// Delete a file record and, best-effort, its blob.
    pub async fn delete_file(&self, auth: &AuthContext, id: FileId) -> Result<()> {
        auth.require_admin()?;

        let file = self.get_file(id)?;
        if !delete_blob(self.storage.as_ref(), &file.storage_key).await {
            warn!("File {} deleted but its blob could not be removed", id);
        }
        self.db.files.delete(id)?;

        info!("File deleted: {}", id);
        Ok(())
    }

    /// Fetch a file for download. The counter only moves once the blob has
    /// actually been read.
    pub async fn download_file(&self, id: FileId) -> Result<Download> {
        let file = self.get_file(id)?;

        let content = self.storage.open(&file.storage_key).await.map_err(|e| match e {
            StorageError::NotFound(_) => AppError::NotFound("File not found on server".to_string()),
            other => AppError::Storage(other),
        })?;

        let file = self.db.files.increment_downloads(id)?;

        Ok(Download {
            content,
            filename: file.name,
            content_type: file.file_type.content_type(),
        })
    }

    pub fn compute_stats(&self, auth: &AuthContext) -> Result<Stats> {
        auth.require_admin()?;

        let categories = self.db.categories.list();
        let mut files = self.db.files.list_by(None);

        let category_stats = categories
            .iter()
            .map(|category| {
                let in_category = files.iter().filter(|f| f.category_id == category.id);
                let (file_count, downloads) =
                    in_category.fold((0, 0), |(count, sum), f| (count + 1, sum + f.downloads));
                CategoryStats {
                    id: category.id,
                    name: category.name.clone(),
                    file_count,
                    downloads,
                }
            })
            .collect();

        let total_files = files.len();
        let total_downloads: u64 = files.iter().map(|f| f.downloads).sum();

        // Stable sort keeps creation order among equal counts.
        files.sort_by(|a, b| b.downloads.cmp(&a.downloads));
        let popular_files = files
            .into_iter()
            .take(POPULAR_FILES_LIMIT)
            .map(|f| PopularFile {
                id: f.id,
                name: f.name,
                downloads: f.downloads,
            })
            .collect();

        Ok(Stats {
            total_files,
            total_categories: categories.len(),
            total_downloads,
            category_stats,
            popular_files,
        })
    }
}

// Strips any client-side directory components from an uploaded filename.
fn base_name(filename: &str) -> &str {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
