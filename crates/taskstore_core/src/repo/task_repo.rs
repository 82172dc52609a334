//! Task repository contract and its error type.

use crate::db::DbError;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TenantId};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Fatal repository failure.
///
/// Absence is not an error; see [`TaskRepository`].
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    /// A row written by this call could not be read back immediately.
    #[error("task {0} was written but could not be read back")]
    ReadBackMissing(TaskId),
    #[error("invalid persisted task data: {0}")]
    InvalidData(String),
    #[error("required table `{0}` is missing; apply migrations first")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing; apply migrations first")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tenant-scoped task persistence.
///
/// # Contract
/// - `find_all` returns the tenant's tasks newest first; empty when none.
/// - `find_by_id`/`update` return `None` for unknown ids and for ids owned
///   by another tenant alike.
/// - `update` leaves fields absent from the patch unchanged and refreshes
///   `updated_at`.
/// - `delete` returns `true` only when a row owned by `tenant` was removed.
pub trait TaskRepository {
    fn find_all(&self, tenant: &TenantId) -> RepoResult<Vec<Task>>;
    fn find_by_id(&self, id: TaskId, tenant: &TenantId) -> RepoResult<Option<Task>>;
    fn create(&self, input: &NewTask, tenant: &TenantId) -> RepoResult<Task>;
    fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        tenant: &TenantId,
    ) -> RepoResult<Option<Task>>;
    fn delete(&self, id: TaskId, tenant: &TenantId) -> RepoResult<bool>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn find_all(&self, tenant: &TenantId) -> RepoResult<Vec<Task>> {
        (**self).find_all(tenant)
    }

    fn find_by_id(&self, id: TaskId, tenant: &TenantId) -> RepoResult<Option<Task>> {
        (**self).find_by_id(id, tenant)
    }

    fn create(&self, input: &NewTask, tenant: &TenantId) -> RepoResult<Task> {
        (**self).create(input, tenant)
    }

    fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        tenant: &TenantId,
    ) -> RepoResult<Option<Task>> {
        (**self).update(id, patch, tenant)
    }

    fn delete(&self, id: TaskId, tenant: &TenantId) -> RepoResult<bool> {
        (**self).delete(id, tenant)
    }
}
