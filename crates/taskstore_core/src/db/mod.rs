//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the task store.
//! - Apply named schema migrations exactly once, in deterministic order.
//!
//! # Invariants
//! - Applied migrations are tracked by name in `schema_migrations`.
//! - Repositories must not read/write task data before migrations succeed.

use std::path::PathBuf;
use thiserror::Error;

pub mod migrations;
mod open;

pub use migrations::{
    applied_migrations, apply_migrations, DirectoryMigrations, EmbeddedMigrations, Migration,
    MigrationRecord, MigrationReport, MigrationSource,
};
pub use open::{open_db, open_db_in_memory, open_db_with};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure. Every variant is fatal for the calling operation.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to read migrations from `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("migration file name is not valid UTF-8: `{}`", .0.display())]
    InvalidMigrationName(PathBuf),
    #[error("migration `{0}` is defined more than once")]
    DuplicateMigration(String),
    #[error("migration `{name}` failed and was rolled back: {source}")]
    MigrationFailed {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
}
