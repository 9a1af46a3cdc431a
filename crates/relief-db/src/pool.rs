//! SQLite connection pool.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use thiserror::Error;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Pool and per-connection limits, taken from the `[database]` config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// SQLite `busy_timeout` for every connection, in milliseconds.
    pub busy_timeout_ms: u64,
    pub pool_max_size: u32,
    /// Longest wait for a free pooled connection, in milliseconds.
    pub checkout_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
            checkout_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("could not open record database: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Opens a pool over the database at `db_path`.
///
/// Each connection is switched to WAL with foreign keys on and the
/// configured busy timeout. `:memory:` works, but gives every pooled
/// connection its own empty database.
///
/// # Errors
///
/// [`PoolError::PoolInit`] when the first connections cannot be opened or
/// prepared.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(move |conn| prepare_connection(conn, settings.busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .connection_timeout(Duration::from_millis(settings.checkout_timeout_ms))
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "sqlite pool ready"
    );
    Ok(pool)
}

fn prepare_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    // In-memory databases cannot use WAL and report "memory".
    if !matches!(mode.as_str(), "wal" | "memory") {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal_mode stayed {mode}, expected wal")),
        ));
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pragma<T: rusqlite::types::FromSql>(conn: &Connection, name: &str) -> T {
        conn.query_row(&format!("PRAGMA {name};"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn file_connections_are_prepared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.db");
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 2_500,
            pool_max_size: 3,
            checkout_timeout_ms: 1_000,
        };
        let pool = create_pool(path.to_str().unwrap(), settings).unwrap();
        assert_eq!(pool.max_size(), 3);

        let conn = pool.get().unwrap();
        assert_eq!(pragma::<String>(&conn, "journal_mode"), "wal");
        assert_eq!(pragma::<i64>(&conn, "foreign_keys"), 1);
        assert_eq!(pragma::<i64>(&conn, "busy_timeout"), 2_500);
    }

    #[test]
    fn memory_database_is_accepted() {
        let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
        let conn = pool.get().unwrap();
        assert_eq!(pragma::<String>(&conn, "journal_mode"), "memory");
    }

    #[test]
    fn exhausted_pool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.db");
        let settings = DbRuntimeSettings {
            pool_max_size: 1,
            checkout_timeout_ms: 50,
            ..Default::default()
        };
        let pool = create_pool(path.to_str().unwrap(), settings).unwrap();

        let _held = pool.get().unwrap();
        assert!(pool.get().is_err());
    }
}
