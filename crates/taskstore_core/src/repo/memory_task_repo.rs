//! In-memory implementation of the task repository contract.
//!
//! Reference double for the SQLite repository: linear scans over an
//! append-only list, no indexes, nothing persisted.

use crate::model::task::{now_timestamp, NewTask, Task, TaskId, TaskPatch, TenantId};
use chrono::{DateTime, Utc};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-local task repository.
///
/// Ids start at 1, grow by one per create and are never reused, even after
/// deletes, matching SQLite `AUTOINCREMENT`.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    state: RwLock<MemoryState>,
}

#[derive(Debug)]
struct MemoryState {
    tasks: Vec<Task>,
    next_id: TaskId,
    last_created_at: Option<DateTime<Utc>>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            last_created_at: None,
        }
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty repository whose first id is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every task and restarts ids at 1. Test utility.
    pub fn clear(&self) -> RepoResult<()> {
        *self.write()? = MemoryState::default();
        Ok(())
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| RepoError::Unavailable(err.to_string()))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| RepoError::Unavailable(err.to_string()))
    }
}

impl MemoryState {
    /// Creation time for the next task, never earlier than the previous one.
    ///
    /// Keeps append order equal to `created_at DESC, id DESC` order even if
    /// the wall clock steps backwards.
    fn next_created_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let created_at = self.last_created_at.map_or(now, |last| now.max(last));
        self.last_created_at = Some(created_at);
        created_at
    }

    fn position(&self, id: TaskId, tenant: &TenantId) -> Option<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id && &task.tenant_id == tenant)
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn find_all(&self, tenant: &TenantId) -> RepoResult<Vec<Task>> {
        // Append order is creation order; newest first means walking backwards.
        Ok(self
            .read()?
            .tasks
            .iter()
            .rev()
            .filter(|task| &task.tenant_id == tenant)
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: TaskId, tenant: &TenantId) -> RepoResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .position(id, tenant)
            .map(|index| state.tasks[index].clone()))
    }

    fn create(&self, input: &NewTask, tenant: &TenantId) -> RepoResult<Task> {
        let mut state = self.write()?;
        let now = state.next_created_at(now_timestamp());
        let task = Task {
            id: state.next_id,
            title: input.title.clone(),
            description: input.description.clone(),
            completed: false,
            tenant_id: tenant.clone(),
            created_at: now,
            updated_at: now,
        };
        state.next_id += 1;
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        tenant: &TenantId,
    ) -> RepoResult<Option<Task>> {
        let mut state = self.write()?;
        let Some(index) = state.position(id, tenant) else {
            return Ok(None);
        };

        let task = &mut state.tasks[index];
        task.apply_patch(patch, now_timestamp());
        Ok(Some(task.clone()))
    }

    fn delete(&self, id: TaskId, tenant: &TenantId) -> RepoResult<bool> {
        let mut state = self.write()?;
        match state.position(id, tenant) {
            Some(index) => {
                state.tasks.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
