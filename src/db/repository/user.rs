use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::repository::parse_timestamp;
use crate::db::DatabaseError;
use crate::models::enums::UserRole;
use crate::models::UserRecord;

pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: UserRole,
    now: DateTime<Utc>,
) -> Result<UserRecord, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            username,
            password_hash,
            role.as_str(),
            now.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_user_by_id(conn, id)?.ok_or(DatabaseError::NotFound {
        entity_type: "user".into(),
        id: id.to_string(),
    })
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, username, password_hash, role, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id],
            user_row,
        )
        .optional()?;

    row.map(user_from_row).transpose()
}

pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, username, password_hash, role, created_at, updated_at
             FROM users WHERE username = ?1",
            params![username],
            user_row,
        )
        .optional()?;

    row.map(user_from_row).transpose()
}

// Internal row type for User mapping
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    created_at: String,
    updated_at: String,
}

fn user_row(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn user_from_row(row: UserRow) -> Result<UserRecord, DatabaseError> {
    Ok(UserRecord {
        id: row.id,
        username: row.username,
        password_hash: row.password_hash,
        role: UserRole::from_str(&row.role)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn insert_and_fetch_by_username() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now();
        let rec = insert_user(&conn, "drsmith", "hash", UserRole::Doctor, now).unwrap();
        assert_eq!(rec.username, "drsmith");
        assert_eq!(rec.role, UserRole::Doctor);

        let fetched = get_user_by_username(&conn, "drsmith").unwrap().unwrap();
        assert_eq!(fetched.id, rec.id);
        assert_eq!(fetched.password_hash, "hash");
    }

    #[test]
    fn unknown_username_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_user_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_violates_constraint() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now();
        insert_user(&conn, "dup", "h1", UserRole::Admin, now).unwrap();
        let err = insert_user(&conn, "dup", "h2", UserRole::Doctor, now).unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
