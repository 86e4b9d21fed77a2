//! Session handling and the admin capability check consumed by the catalog.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{User, UserId},
    state::AppState,
    store::Database,
};

/// Sessions older than this are treated as logged out.
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

/// What the catalog is allowed to know about the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub authenticated: bool,
    pub is_admin: bool,
    pub user_id: Option<UserId>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: &User) -> Self {
        Self {
            authenticated: true,
            is_admin: user.is_admin,
            user_id: Some(user.id),
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.authenticated && self.is_admin {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub fn require_user(&self) -> Result<UserId> {
        self.user_id
            .filter(|_| self.authenticated)
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// In-memory session table keyed by an opaque random id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user_id: UserId) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = Session {
            user_id,
            created_at: Utc::now(),
        };

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), session);

        session_id
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    pub fn remove(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
    }

    /// Resolve a session id to the caller's capabilities. A session whose
    /// user no longer exists is dropped.
    pub fn resolve(&self, db: &Database, session_id: Option<&str>) -> AuthContext {
        let Some(session_id) = session_id else {
            return AuthContext::anonymous();
        };
        let Some(session) = self.get(session_id) else {
            return AuthContext::anonymous();
        };

        if session.created_at + Duration::hours(SESSION_MAX_AGE_HOURS) < Utc::now() {
            info!("Session for user {} expired", session.user_id);
            self.remove(session_id);
            return AuthContext::anonymous();
        }

        match db.users.get(session.user_id) {
            Some(user) => AuthContext::for_user(&user),
            None => {
                warn!("Clearing stale session for missing user {}", session.user_id);
                self.remove(session_id);
                AuthContext::anonymous()
            }
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar.get(&state.config.session_cookie).map(|c| c.value());
        Ok(state.sessions.resolve(&state.db, session_id))
    }
}

/// Hash password using Argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify password against hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Check credentials. Unknown users and wrong passwords fail the same way.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<User> {
    let user = db
        .users
        .find_by_username(username)
        .filter(|user| verify_password(password, &user.password_hash));

    match user {
        Some(user) => {
            info!("User {} logged in", user.username);
            Ok(user)
        }
        None => {
            warn!("Failed login attempt for {:?}", username);
            Err(AppError::Unauthenticated("Invalid username or password".to_string()))
        }
    }
}
