//! Storage layer for the Relief coordination engine.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations for the `disasters`, `resources` and
//! `reports` collections.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: concurrent readers with a single writer. The
//!   record store relies on the single-writer property: an `IMMEDIATE`
//!   transaction takes the write lock up front, so two mutations never
//!   interleave their read-modify-write of an audit trail.
//! - **Bounded waits**: every connection carries a `busy_timeout`, and pool
//!   checkout has its own timeout, so storage I/O never blocks indefinitely.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` and tracked in `_relief_migrations`.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
