//! Named SQLite migration runner.
//!
//! # Responsibility
//! - Ensure the `schema_migrations` tracking table exists.
//! - Apply every not-yet-recorded migration in lexicographic name order.
//!
//! # Invariants
//! - A name recorded in `schema_migrations` is never executed again, even if
//!   its script changes or disappears from the source.
//! - A script and its tracking row commit in one transaction; a failing
//!   script leaves neither behind.
//! - Scripts must not issue their own `BEGIN`/`COMMIT`.

use crate::db::{DbError, DbResult};
use crate::model::task::{format_timestamp, now_timestamp};
use log::{info, warn};
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::time::Instant;

mod source;

pub use source::{DirectoryMigrations, EmbeddedMigrations, MigrationSource};

const TRACKING_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    applied_at TEXT NOT NULL
);";

/// One named schema-change script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub name: String,
    pub sql: String,
}

impl Migration {
    /// Creates a migration from its name and store-native script.
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Row of the `schema_migrations` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub name: String,
    pub applied_at: String,
}

/// Outcome of one runner invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Names executed by this run, in execution order.
    pub applied: Vec<String>,
    /// Names from the source that were already recorded.
    pub already_applied: Vec<String>,
}

impl MigrationReport {
    /// Returns whether this run executed nothing.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Brings `conn` up to date with every migration in `source`.
///
/// # Errors
/// - `DuplicateMigration` when the source yields the same name twice.
/// - `MigrationFailed` when a script (or its tracking insert) fails; earlier
///   migrations from the same run stay committed.
/// - `Sqlite`/`Io` for tracking-table and source read failures.
pub fn apply_migrations(
    conn: &mut Connection,
    source: &dyn MigrationSource,
) -> DbResult<MigrationReport> {
    let started_at = Instant::now();
    conn.execute_batch(TRACKING_TABLE_SQL)?;

    let applied = applied_names(conn)?;
    let migrations = ordered(source.migrations()?)?;

    let known: BTreeSet<&str> = migrations.iter().map(|m| m.name.as_str()).collect();
    for name in applied.iter().filter(|name| !known.contains(name.as_str())) {
        warn!("event=migration_unknown module=db status=skip name={name}");
    }

    let mut report = MigrationReport::default();
    for migration in migrations {
        if applied.contains(&migration.name) {
            report.already_applied.push(migration.name);
            continue;
        }

        apply_one(conn, &migration).map_err(|source| {
            warn!(
                "event=migration_apply module=db status=error name={} error={}",
                migration.name, source
            );
            DbError::MigrationFailed {
                name: migration.name.clone(),
                source,
            }
        })?;
        info!(
            "event=migration_apply module=db status=ok name={}",
            migration.name
        );
        report.applied.push(migration.name);
    }

    info!(
        "event=migrations_run module=db status=ok applied={} already_applied={} duration_ms={}",
        report.applied.len(),
        report.already_applied.len(),
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

/// Lists recorded migrations in the order they were applied.
pub fn applied_migrations(conn: &Connection) -> DbResult<Vec<MigrationRecord>> {
    conn.execute_batch(TRACKING_TABLE_SQL)?;
    let mut stmt = conn.prepare("SELECT name, applied_at FROM schema_migrations ORDER BY id ASC;")?;
    let records = stmt
        .query_map([], |row| {
            Ok(MigrationRecord {
                name: row.get(0)?,
                applied_at: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(&migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, ?2);",
        params![migration.name, format_timestamp(now_timestamp())],
    )?;
    tx.commit()
}

fn applied_names(conn: &Connection) -> DbResult<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations;")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(names)
}

fn ordered(mut migrations: Vec<Migration>) -> DbResult<Vec<Migration>> {
    migrations.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(pair) = migrations.windows(2).find(|pair| pair[0].name == pair[1].name) {
        return Err(DbError::DuplicateMigration(pair[0].name.clone()));
    }
    Ok(migrations)
}
