//! Core persistence and domain-integrity layer for the task store.
//! Every read and write is scoped to one tenant; the SQLite and in-memory
//! repositories are interchangeable behind `TaskRepository`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, OpenError, StoreConfig};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{EmptyTenantId, NewTask, Task, TaskId, TaskPatch, TenantId};
pub use repo::memory_task_repo::InMemoryTaskRepository;
pub use repo::sqlite_task_repo::SqliteTaskRepository;
pub use repo::task_repo::{RepoError, RepoResult, TaskRepository};
pub use service::task_service::{
    CreateTask, DeleteTask, GetTask, ListTasks, TaskService, UpdateTask,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
