//! Shared types for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::auth::AuthConfig;
use crate::models::enums::UserRole;

/// Shared context for all API routes and middleware.
///
/// The connection sits behind a mutex: SQLite serializes writers anyway,
/// and handler work per request is short.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub auth: Arc<AuthConfig>,
}

impl ApiContext {
    pub fn new(conn: Connection, auth: AuthConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            auth: Arc::new(auth),
        }
    }

    /// Lock the database connection for the duration of a handler.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}

/// Authenticated user context, injected into request extensions by the
/// auth middleware after token validation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}
