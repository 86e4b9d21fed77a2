//! In-memory metadata stores.
//!
//! Each store keeps its records in a `BTreeMap` behind an `RwLock`, so
//! iteration follows ID (and therefore creation) order. Locks are only held
//! for the map operation itself, never across blob I/O.

mod category;
mod file;
mod ids;
mod user;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use category::CategoryStore;
pub use file::FileStore;
pub use ids::{EntityKind, IdAllocator};
pub use user::UserStore;

/// Metadata repository shared by the catalog and the auth layer.
#[derive(Clone)]
pub struct Database {
    pub categories: Arc<CategoryStore>,
    pub files: Arc<FileStore>,
    pub users: Arc<UserStore>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        let ids = Arc::new(IdAllocator::new());
        Self {
            categories: Arc::new(CategoryStore::new(ids.clone())),
            files: Arc::new(FileStore::new(ids.clone())),
            users: Arc::new(UserStore::new(ids)),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
