use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::{read, write, EntityKind, IdAllocator};
use crate::models::{User, UserId};

pub struct UserStore {
    ids: Arc<IdAllocator>,
    users: RwLock<BTreeMap<UserId, User>>,
}

impl UserStore {
    pub fn new(ids: Arc<IdAllocator>) -> Self {
        Self {
            ids,
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert a user with an already-hashed password.
    pub fn create(&self, username: &str, password_hash: String, is_admin: bool) -> User {
        let user = User {
            id: self.ids.next_id(EntityKind::User),
            username: username.to_string(),
            password_hash,
            is_admin,
        };

        write(&self.users).insert(user.id, user.clone());
        user
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        read(&self.users).get(&id).cloned()
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        read(&self.users)
            .values()
            .find(|u| u.username == username)
            .cloned()
    }
}
