use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use validator::Validate;

/// Hard ceiling for a single archive upload (50 MB).
pub const MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Validate)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    #[validate(range(min = 1, max = 52428800))] // Max 50MB
    pub max_file_size: u64,
    #[validate(length(min = 1))]
    pub admin_username: String,
    #[validate(length(min = 1))]
    pub admin_password: String,
    pub seed_category: bool,
    #[validate(length(min = 1))]
    pub session_cookie: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_file_size: MAX_UPLOAD_SIZE,
            admin_username: "admin".to_string(),
            admin_password: "adminpassword".to_string(),
            seed_category: true,
            session_cookie: "archivehub_session".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load environment variables from `.env` file (if it exists)
        dotenv().ok();

        let defaults = Config::default();

        let config = Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_file_size),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            seed_category: env::var("SEED_CATEGORY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seed_category),
            session_cookie: env::var("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
        };

        // Validate configuration values (e.g. file size range)
        config.validate()?;
        Ok(config)
    }
}
