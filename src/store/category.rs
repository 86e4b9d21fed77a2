use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use super::{read, write, EntityKind, IdAllocator};
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryId, CategoryPatch};

pub struct CategoryStore {
    ids: Arc<IdAllocator>,
    categories: RwLock<BTreeMap<CategoryId, Category>>,
}

impl CategoryStore {
    pub fn new(ids: Arc<IdAllocator>) -> Self {
        Self {
            ids,
            categories: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a category. `name` is trimmed and must not be empty.
    pub fn create(&self, name: &str, description: Option<String>) -> Result<Category> {
        let name = require_name(name)?;

        let category = Category {
            id: self.ids.next_id(EntityKind::Category),
            name,
            description: description.filter(|d| !d.is_empty()),
            created_at: Utc::now(),
        };

        write(&self.categories).insert(category.id, category.clone());
        Ok(category)
    }

    pub fn get(&self, id: CategoryId) -> Option<Category> {
        read(&self.categories).get(&id).cloned()
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        read(&self.categories).contains_key(&id)
    }

    pub fn list(&self) -> Vec<Category> {
        read(&self.categories).values().cloned().collect()
    }

    /// Overwrite only the fields present in `patch`.
    pub fn update(&self, id: CategoryId, patch: CategoryPatch) -> Result<Category> {
        let name = patch.name.as_deref().map(require_name).transpose()?;

        let mut categories = write(&self.categories);
        let category = categories
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        if let Some(name) = name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }

        Ok(category.clone())
    }

    /// Remove the record only. Files are cascaded by the catalog.
    pub fn delete(&self, id: CategoryId) -> Result<Category> {
        write(&self.categories)
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }
}

fn require_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Category name is required".to_string()));
    }
    Ok(name.to_string())
}
