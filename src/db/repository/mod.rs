//! Repository layer — entity-scoped database operations.
//!
//! Free functions over a `rusqlite::Connection`. Multi-row writes
//! (prescription + medications, invoice + line items) go through a
//! transaction owned by the calling business module.

mod invoice;
mod patient;
mod prescription;
mod user;

pub use invoice::*;
pub use patient::*;
pub use prescription::*;
pub use user::*;

use chrono::{DateTime, NaiveDate, Utc};

use super::DatabaseError;

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s:?}: {e}")))
}

/// Parse a date-only column (YYYY-MM-DD).
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {s:?}: {e}")))
}
