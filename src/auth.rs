//! Username/password authentication and bearer tokens.
//!
//! Passwords are hashed with bcrypt; tokens are HS256-signed JWTs
//! carrying {user id, username, role} with a 24-hour expiry. Login
//! failures are deliberately indistinguishable between an unknown
//! username and a wrong password.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{repository, DatabaseError};
use crate::models::enums::UserRole;
use crate::models::{LoginInput, LoginResponse, RegisterInput, User, UserRecord};

/// Token lifetime: 24 hours.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AuthConfig {
    pub token_secret: String,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(token_secret: String) -> Self {
        Self {
            token_secret,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Minimum-cost hashing keeps the test suite fast.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            token_secret: "test-secret".into(),
            bcrypt_cost: 4,
        }
    }
}

/// Signed token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub username: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    UserExists,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token signing failed: {0}")]
    Token(String),
}

/// Create a new account. Fails with [`AuthError::UserExists`] on a
/// duplicate username.
pub fn register(
    conn: &Connection,
    cfg: &AuthConfig,
    input: &RegisterInput,
) -> Result<User, AuthError> {
    if input.username.trim().is_empty() {
        return Err(AuthError::Validation("username must not be empty".into()));
    }
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    create_user(conn, cfg, &input.username, &input.password, input.role)
}

/// Insert a user without the registration-surface validation. Shared by
/// `register` and the startup admin seed.
fn create_user(
    conn: &Connection,
    cfg: &AuthConfig,
    username: &str,
    password: &str,
    role: UserRole,
) -> Result<User, AuthError> {
    if repository::get_user_by_username(conn, username)?.is_some() {
        return Err(AuthError::UserExists);
    }

    let hash = bcrypt::hash(password, cfg.bcrypt_cost).map_err(|e| AuthError::Hash(e.to_string()))?;

    match repository::insert_user(conn, username, &hash, role, Utc::now()) {
        Ok(rec) => Ok(rec.into()),
        // Lost a race on the unique index between the check and the insert
        Err(e) if e.is_constraint_violation() => Err(AuthError::UserExists),
        Err(e) => Err(e.into()),
    }
}

/// Authenticate and issue a signed token. Unknown username and wrong
/// password produce the same error.
pub fn login(
    conn: &Connection,
    cfg: &AuthConfig,
    input: &LoginInput,
) -> Result<LoginResponse, AuthError> {
    let rec = repository::get_user_by_username(conn, &input.username)?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = bcrypt::verify(&input.password, &rec.password_hash).unwrap_or(false);
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    let token = issue_token(cfg, &rec)?;
    Ok(LoginResponse {
        token,
        user: rec.into(),
    })
}

pub fn issue_token(cfg: &AuthConfig, user: &UserRecord) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.token_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Token(e.to_string()))
}

/// Decode and validate a bearer token. Total: malformed, mis-signed or
/// expired tokens yield `None`, never an error.
pub fn verify_token(token_secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(token_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Ensure the bootstrap admin/admin account exists. Idempotent.
pub fn seed_admin(conn: &Connection, cfg: &AuthConfig) -> Result<(), AuthError> {
    if repository::get_user_by_username(conn, "admin")?.is_some() {
        tracing::debug!("admin user already present, skipping seed");
        return Ok(());
    }

    create_user(conn, cfg, "admin", "admin", UserRole::Admin)?;
    tracing::info!("seeded bootstrap admin user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn register_input(username: &str, password: &str) -> RegisterInput {
        RegisterInput {
            username: username.into(),
            password: password.into(),
            role: UserRole::Doctor,
        }
    }

    #[test]
    fn register_then_login() {
        let conn = open_memory_database().unwrap();
        let cfg = AuthConfig::for_tests();

        let user = register(&conn, &cfg, &register_input("drsmith", "secret1")).unwrap();
        assert_eq!(user.username, "drsmith");
        assert_eq!(user.role, UserRole::Doctor);

        let resp = login(
            &conn,
            &cfg,
            &LoginInput {
                username: "drsmith".into(),
                password: "secret1".into(),
            },
        )
        .unwrap();
        assert!(!resp.token.is_empty());
        assert_eq!(resp.user.id, user.id);
    }

    #[test]
    fn duplicate_username_conflicts() {
        let conn = open_memory_database().unwrap();
        let cfg = AuthConfig::for_tests();
        register(&conn, &cfg, &register_input("dup", "secret1")).unwrap();
        let err = register(&conn, &cfg, &register_input("dup", "secret2")).unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
    }

    #[test]
    fn short_password_rejected_before_any_write() {
        let conn = open_memory_database().unwrap();
        let cfg = AuthConfig::for_tests();
        let err = register(&conn, &cfg, &register_input("shorty", "abc")).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(repository::get_user_by_username(&conn, "shorty")
            .unwrap()
            .is_none());
    }

    #[test]
    fn wrong_password_and_unknown_user_fail_identically() {
        let conn = open_memory_database().unwrap();
        let cfg = AuthConfig::for_tests();
        register(&conn, &cfg, &register_input("drsmith", "secret1")).unwrap();

        let wrong_password = login(
            &conn,
            &cfg,
            &LoginInput {
                username: "drsmith".into(),
                password: "wrong".into(),
            },
        )
        .unwrap_err();
        let unknown_user = login(
            &conn,
            &cfg,
            &LoginInput {
                username: "nobody".into(),
                password: "secret1".into(),
            },
        )
        .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    }

    #[test]
    fn verify_round_trips_claims() {
        let conn = open_memory_database().unwrap();
        let cfg = AuthConfig::for_tests();
        register(&conn, &cfg, &register_input("drsmith", "secret1")).unwrap();
        let resp = login(
            &conn,
            &cfg,
            &LoginInput {
                username: "drsmith".into(),
                password: "secret1".into(),
            },
        )
        .unwrap();

        let claims = verify_token(&cfg.token_secret, &resp.token).unwrap();
        assert_eq!(claims.sub, resp.user.id);
        assert_eq!(claims.username, "drsmith");
        assert_eq!(claims.role, UserRole::Doctor);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn verify_returns_none_for_garbage() {
        assert!(verify_token("test-secret", "not-a-token").is_none());
        assert!(verify_token("test-secret", "").is_none());
    }

    #[test]
    fn verify_returns_none_for_wrong_secret() {
        let rec = UserRecord {
            id: 1,
            username: "drsmith".into(),
            password_hash: String::new(),
            role: UserRole::Doctor,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let cfg = AuthConfig::for_tests();
        let token = issue_token(&cfg, &rec).unwrap();
        assert!(verify_token("other-secret", &token).is_none());
    }

    #[test]
    fn verify_returns_none_for_expired_token() {
        let cfg = AuthConfig::for_tests();
        let now = Utc::now().timestamp();
        // Expired well past the default validation leeway
        let claims = Claims {
            sub: 1,
            username: "drsmith".into(),
            role: UserRole::Doctor,
            iat: now - TOKEN_TTL_SECS,
            exp: now - 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.token_secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&cfg.token_secret, &token).is_none());
    }

    #[test]
    fn seed_admin_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let cfg = AuthConfig::for_tests();
        seed_admin(&conn, &cfg).unwrap();
        seed_admin(&conn, &cfg).unwrap();

        let admin = repository::get_user_by_username(&conn, "admin")
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);

        // Seeded credentials are admin/admin
        let resp = login(
            &conn,
            &cfg,
            &LoginInput {
                username: "admin".into(),
                password: "admin".into(),
            },
        );
        assert!(resp.is_ok());
    }
}
