use tracing::info;

use crate::{auth::hash_password, config::Config, error::Result, store::Database};

const SEED_CATEGORY_NAME: &str = "Programs";
const SEED_CATEGORY_DESCRIPTION: &str = "Software in archives";

/// Build the in-memory metadata repository and seed its initial records.
pub fn init_db(config: &Config) -> Result<Database> {
    info!("Initializing in-memory database...");

    let db = Database::new();

    let admin = db
        .users
        .create(&config.admin_username, hash_password(&config.admin_password)?, true);
    info!("Seeded admin user {} ({})", admin.username, admin.id);

    if config.seed_category {
        let category = db
            .categories
            .create(SEED_CATEGORY_NAME, Some(SEED_CATEGORY_DESCRIPTION.to_string()))?;
        info!("Seeded category {} ({})", category.name, category.id);
    }

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authenticate;

    #[test]
    fn seeds_admin_and_default_category() {
        let db = init_db(&Config::default()).unwrap();

        let admin = authenticate(&db, "admin", "adminpassword").unwrap();
        assert_eq!(admin.id, 1);
        assert!(admin.is_admin);
        assert_ne!(admin.password_hash, "adminpassword");

        let categories = db.categories.list();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, SEED_CATEGORY_NAME);
    }

    #[test]
    fn category_seed_can_be_disabled() {
        let config = Config { seed_category: false, ..Config::default() };
        let db = init_db(&config).unwrap();
        assert!(db.categories.list().is_empty());
    }
}
