//! Audit-trailed record store for disasters, resources and reports.
//!
//! Every mutating function takes the acting [`Identity`], runs inside an
//! `IMMEDIATE` SQLite transaction, and follows the same sequence:
//!
//! 1. load the target (or verify its parent exists),
//! 2. ask the authorization gate,
//! 3. apply the change and append an [`AuditEntry`],
//! 4. commit.
//!
//! A denied or failed mutation rolls back, so it leaves neither a partial
//! record nor an audit entry behind. Deletes append their audit entry to
//! the stored row before removing it and return that final state (the
//! tombstone) to the caller.
//!
//! Functions are synchronous and operate on a borrowed `rusqlite`
//! connection; callers on an async runtime run them on a blocking task.

pub mod disasters;
pub mod reports;
pub mod resources;

use chrono::{SecondsFormat, Utc};
use relief_identity::AuthzError;
use relief_types::{AuditAction, AuditEntry, Coordinates, Identity};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The authorization gate denied the mutation.
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A required field is absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The backing database failed. Not retried.
    #[error("store unavailable: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecordError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn audit_entry(action: AuditAction, actor: &Identity) -> AuditEntry {
    AuditEntry {
        action,
        actor: actor.handle.clone(),
        timestamp: timestamp(),
    }
}

/// Rejects blank values for required text fields.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        Err(RecordError::MissingField(field))
    } else {
        Ok(())
    }
}

pub(crate) fn require_patch(field: &'static str, value: Option<&String>) -> Result<(), RecordError> {
    match value {
        Some(v) => require(field, v),
        None => Ok(()),
    }
}

/// Reads a JSON-encoded text column.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Reads a nullable `lat`, `lon` column pair.
pub(crate) fn coordinates_columns(
    row: &Row,
    lat_idx: usize,
    lon_idx: usize,
) -> rusqlite::Result<Option<Coordinates>> {
    let lat: Option<f64> = row.get(lat_idx)?;
    let lon: Option<f64> = row.get(lon_idx)?;
    Ok(lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon)))
}

/// Accumulates `column = ?N` assignments for a single-row UPDATE.
pub(crate) struct Assignments {
    parts: Vec<String>,
    values: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    pub(crate) fn new() -> Self {
        Self {
            parts: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn set<T: ToSql + 'static>(&mut self, column: &str, value: T) {
        self.values.push(Box::new(value));
        self.parts.push(format!("{} = ?{}", column, self.values.len()));
    }

    /// Runs `UPDATE <table> SET ... WHERE id = ?`, returning rows changed.
    pub(crate) fn execute(
        mut self,
        conn: &Connection,
        table: &str,
        id: &str,
    ) -> rusqlite::Result<usize> {
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            self.parts.join(", "),
            self.values.len() + 1
        );
        self.values.push(Box::new(id.to_string()));
        let params: Vec<&dyn ToSql> = self.values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, params.as_slice())
    }
}
