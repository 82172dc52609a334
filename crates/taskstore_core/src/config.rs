//! Process-level store configuration.
//!
//! # Responsibility
//! - Resolve database location, migration source and logging settings.
//! - Open the configured store with migrations applied.
//!
//! Environment variables:
//! - `TASKSTORE_DB_PATH` (default `data/tasks.db`, `:memory:` for a
//!   throwaway store)
//! - `TASKSTORE_MIGRATIONS_DIR` (unset: bundled migrations)
//! - `TASKSTORE_LOG_LEVEL` (default per build mode)
//! - `TASKSTORE_LOG_DIR` (unset: file logging stays off)

use crate::db::{open_db, open_db_in_memory, open_db_with, DbResult, DirectoryMigrations};
use crate::logging::default_log_level;
use rusqlite::Connection;
use std::path::PathBuf;
use thiserror::Error;

pub const DB_PATH_VAR: &str = "TASKSTORE_DB_PATH";
pub const MIGRATIONS_DIR_VAR: &str = "TASKSTORE_MIGRATIONS_DIR";
pub const LOG_LEVEL_VAR: &str = "TASKSTORE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "TASKSTORE_LOG_DIR";

const DEFAULT_DB_PATH: &str = "data/tasks.db";
const IN_MEMORY_DB_PATH: &str = ":memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is set but empty")]
    Empty(&'static str),
    #[error("environment variable `{0}` is not valid UTF-8")]
    NotUnicode(&'static str),
    #[error("failed to create database directory `{}`: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolved store settings; see the module docs for the variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub migrations_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            migrations_dir: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Reads configuration through `lookup`, which mirrors `std::env::var`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Result<String, std::env::VarError>,
    ) -> Result<Self, ConfigError> {
        let read = |key: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(key) {
                Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
                Ok(value) => Ok(Some(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Ok(None),
                Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key)),
            }
        };

        let defaults = Self::default();
        Ok(Self {
            db_path: read(DB_PATH_VAR)?.map_or(defaults.db_path, PathBuf::from),
            migrations_dir: read(MIGRATIONS_DIR_VAR)?.map(PathBuf::from),
            log_level: read(LOG_LEVEL_VAR)?.unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_VAR)?.map(PathBuf::from),
        })
    }

    /// Returns whether `db_path` names SQLite's throwaway in-memory store.
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_DB_PATH
    }

    /// Opens the configured store and applies pending migrations.
    ///
    /// Creates the database's parent directory when missing.
    pub fn open(&self) -> Result<Connection, OpenError> {
        if self.is_in_memory() && self.migrations_dir.is_none() {
            return Ok(open_db_in_memory()?);
        }

        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn: DbResult<Connection> = match &self.migrations_dir {
            Some(dir) => open_db_with(&self.db_path, &DirectoryMigrations::new(dir)),
            None => open_db(&self.db_path),
        };
        Ok(conn?)
    }
}

/// Failure to open the configured store.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] crate::db::DbError),
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DB_PATH_VAR, LOG_DIR_VAR, MIGRATIONS_DIR_VAR};
    use std::collections::HashMap;
    use std::env::VarError;
    use std::path::PathBuf;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.db_path, PathBuf::from("data/tasks.db"));
        assert!(config.migrations_dir.is_none());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_VAR, " /var/lib/tasks.db "),
            (MIGRATIONS_DIR_VAR, "/etc/tasks/migrations"),
            (LOG_DIR_VAR, "/var/log/tasks"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/tasks.db"));
        assert_eq!(
            config.migrations_dir,
            Some(PathBuf::from("/etc/tasks/migrations"))
        );
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/tasks")));
    }

    #[test]
    fn empty_values_are_rejected() {
        let err = StoreConfig::from_lookup(lookup_from(&[(DB_PATH_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(key) if key == DB_PATH_VAR));
    }

    #[test]
    fn open_creates_parent_directory_and_migrates() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            db_path: dir.path().join("nested/tasks.db"),
            ..StoreConfig::default()
        };

        let conn = config.open().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert!(dir.path().join("nested/tasks.db").exists());
    }

    #[test]
    fn in_memory_path_opens_without_touching_disk() {
        let config = StoreConfig {
            db_path: PathBuf::from(":memory:"),
            ..StoreConfig::default()
        };
        assert!(config.is_in_memory());
        assert!(config.open().is_ok());
    }
}
