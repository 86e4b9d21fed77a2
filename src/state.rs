use crate::auth::SessionStore;
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::database::init_db;
use crate::storage::init_storage;
use crate::store::Database;

/// Central application state shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Catalog orchestration over the metadata stores and blob storage.
    pub catalog: CatalogService,

    /// In-memory metadata repository (users are read by the auth layer).
    pub db: Database,

    /// Logged-in sessions keyed by cookie value.
    pub sessions: SessionStore,

    /// Application configuration loaded from environment variables or `.env`.
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = init_db(&config)?;
        let storage = init_storage(&config).await?;

        Ok(Self {
            catalog: CatalogService::new(db.clone(), storage, config.max_file_size),
            db,
            sessions: SessionStore::new(),
            config,
        })
    }
}
