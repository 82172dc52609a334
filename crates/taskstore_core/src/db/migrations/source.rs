//! Migration sources: compiled-in scripts and on-disk directories.

use super::Migration;
use crate::db::{DbError, DbResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Scripts shipped with this crate, in execution order.
const BUNDLED: &[(&str, &str)] = &[
    (
        "0001_create_tasks.sql",
        include_str!("0001_create_tasks.sql"),
    ),
    (
        "0002_add_tenant_column.sql",
        include_str!("0002_add_tenant_column.sql"),
    ),
];

/// Ordered, named collection of schema-change scripts.
///
/// Implementations only enumerate; ordering and de-duplication checks are
/// done by the runner.
pub trait MigrationSource {
    fn migrations(&self) -> DbResult<Vec<Migration>>;
}

impl MigrationSource for [Migration] {
    fn migrations(&self) -> DbResult<Vec<Migration>> {
        Ok(self.to_vec())
    }
}

impl MigrationSource for Vec<Migration> {
    fn migrations(&self) -> DbResult<Vec<Migration>> {
        Ok(self.clone())
    }
}

/// Migrations compiled into the binary via `include_str!`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedMigrations {
    scripts: &'static [(&'static str, &'static str)],
}

impl EmbeddedMigrations {
    /// Uses a caller-provided `(name, sql)` table.
    pub const fn new(scripts: &'static [(&'static str, &'static str)]) -> Self {
        Self { scripts }
    }

    /// The task schema shipped with this crate.
    pub const fn bundled() -> Self {
        Self::new(BUNDLED)
    }
}

impl Default for EmbeddedMigrations {
    fn default() -> Self {
        Self::bundled()
    }
}

impl MigrationSource for EmbeddedMigrations {
    fn migrations(&self) -> DbResult<Vec<Migration>> {
        Ok(self
            .scripts
            .iter()
            .map(|(name, sql)| Migration::new(*name, *sql))
            .collect())
    }
}

/// Migrations read from `*.sql` files in one directory.
///
/// The file name (including extension) is the migration name. Entries
/// without a `.sql` extension and sub-directories are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryMigrations {
    dir: PathBuf,
}

impl DirectoryMigrations {
    /// Reads migrations from `dir` each time the runner asks.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MigrationSource for DirectoryMigrations {
    fn migrations(&self) -> DbResult<Vec<Migration>> {
        let mut migrations = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error(&self.dir))? {
            let path = entry.map_err(io_error(&self.dir))?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("sql") {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| DbError::InvalidMigrationName(path.clone()))?
                .to_string();
            let sql = fs::read_to_string(&path).map_err(io_error(&path))?;
            migrations.push(Migration { name, sql });
        }

        Ok(migrations)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DbError {
    let path = path.to_path_buf();
    move |source| DbError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::{DirectoryMigrations, EmbeddedMigrations, MigrationSource};
    use crate::db::DbError;
    use std::fs;

    #[test]
    fn bundled_scripts_are_named_in_execution_order() {
        let names: Vec<String> = EmbeddedMigrations::bundled()
            .migrations()
            .unwrap()
            .into_iter()
            .map(|migration| migration.name)
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(!names.is_empty());
    }

    #[test]
    fn directory_source_reads_only_sql_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0002_b.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("0001_a.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();
        fs::create_dir(dir.path().join("0003_dir.sql")).unwrap();

        let mut migrations = DirectoryMigrations::new(dir.path()).migrations().unwrap();
        migrations.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<&str> = migrations.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["0001_a.sql", "0002_b.sql"]);
        assert_eq!(migrations[0].sql, "SELECT 1;");
    }

    #[test]
    fn directory_source_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = DirectoryMigrations::new(&missing).migrations().unwrap_err();
        assert!(matches!(err, DbError::Io { path, .. } if path == missing));
    }
}
