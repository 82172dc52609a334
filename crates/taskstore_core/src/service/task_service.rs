//! Task use cases.
//!
//! # Responsibility
//! - Provide per-operation entry points for callers that have already
//!   resolved an authenticated tenant.
//! - Delegate persistence to whichever `TaskRepository` was injected.
//!
//! # Invariants
//! - Every use case forwards the caller's tenant unchanged; tenant scoping
//!   is identical across repository implementations.
//! - Absence stays `None`/`false`; only storage faults become errors.

use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TenantId};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use log::debug;

/// Lists a tenant's tasks, newest first.
pub struct ListTasks<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> ListTasks<R> {
    /// Creates the use case over the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the tenant's tasks; empty when the tenant has none.
    pub fn execute(&self, tenant: &TenantId) -> RepoResult<Vec<Task>> {
        let tasks = self.repo.find_all(tenant)?;
        debug!(
            "event=task_list module=service status=ok tenant={tenant} count={}",
            tasks.len()
        );
        Ok(tasks)
    }
}

/// Fetches one task owned by the tenant.
pub struct GetTask<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> GetTask<R> {
    /// Creates the use case over the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns `None` when the id is unknown or owned by another tenant.
    pub fn execute(&self, id: TaskId, tenant: &TenantId) -> RepoResult<Option<Task>> {
        let task = self.repo.find_by_id(id, tenant)?;
        debug!(
            "event=task_get module=service status={} tenant={tenant} id={id}",
            found_status(task.is_some())
        );
        Ok(task)
    }
}

/// Creates a task for the tenant.
pub struct CreateTask<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> CreateTask<R> {
    /// Creates the use case over the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new, not yet completed task owned by `tenant`.
    pub fn execute(&self, input: &NewTask, tenant: &TenantId) -> RepoResult<Task> {
        let task = self.repo.create(input, tenant)?;
        debug!(
            "event=task_create module=service status=ok tenant={tenant} id={}",
            task.id
        );
        Ok(task)
    }
}

/// Applies a partial update to a task owned by the tenant.
pub struct UpdateTask<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> UpdateTask<R> {
    /// Creates the use case over the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Merges `patch` over the stored task and returns the new state.
    ///
    /// Returns `None` under the same rule as [`GetTask::execute`].
    pub fn execute(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        tenant: &TenantId,
    ) -> RepoResult<Option<Task>> {
        let task = self.repo.update(id, patch, tenant)?;
        debug!(
            "event=task_update module=service status={} tenant={tenant} id={id}",
            found_status(task.is_some())
        );
        Ok(task)
    }
}

/// Hard-deletes a task owned by the tenant.
pub struct DeleteTask<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> DeleteTask<R> {
    /// Creates the use case over the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns `true` only when a task owned by `tenant` was removed.
    pub fn execute(&self, id: TaskId, tenant: &TenantId) -> RepoResult<bool> {
        let deleted = self.repo.delete(id, tenant)?;
        debug!(
            "event=task_delete module=service status={} tenant={tenant} id={id}",
            found_status(deleted)
        );
        Ok(deleted)
    }
}

/// All task use cases sharing one borrowed repository.
pub struct TaskService<'r, R: TaskRepository + ?Sized> {
    pub list: ListTasks<&'r R>,
    pub get: GetTask<&'r R>,
    pub create: CreateTask<&'r R>,
    pub update: UpdateTask<&'r R>,
    pub delete: DeleteTask<&'r R>,
}

impl<'r, R: TaskRepository + ?Sized> TaskService<'r, R> {
    /// Builds every use case over one shared repository.
    pub fn new(repo: &'r R) -> Self {
        Self {
            list: ListTasks::new(repo),
            get: GetTask::new(repo),
            create: CreateTask::new(repo),
            update: UpdateTask::new(repo),
            delete: DeleteTask::new(repo),
        }
    }
}

fn found_status(found: bool) -> &'static str {
    if found {
        "ok"
    } else {
        "not_found"
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateTask, DeleteTask, GetTask, ListTasks, TaskService, UpdateTask};
    use crate::model::task::{NewTask, TaskPatch, TenantId};
    use crate::repo::memory_task_repo::InMemoryTaskRepository;

    #[test]
    fn use_cases_share_one_repository() {
        let repo = InMemoryTaskRepository::new();
        let tenant = TenantId::new("test-user-123");
        let create = CreateTask::new(&repo);
        let list = ListTasks::new(&repo);

        let input = NewTask::new("Courses").with_description("Pain, lait, oeufs");
        let task = create.execute(&input, &tenant).unwrap();

        assert_eq!(task.id, 1);
        assert_eq!(task.description.as_deref(), Some("Pain, lait, oeufs"));
        assert_eq!(list.execute(&tenant).unwrap(), vec![task]);
    }

    #[test]
    fn bread_scenario_through_use_cases() {
        let repo = InMemoryTaskRepository::new();
        let owner = TenantId::new("u1");
        let stranger = TenantId::new("u2");

        let created = CreateTask::new(&repo)
            .execute(&NewTask::new("Buy bread"), &owner)
            .unwrap();
        assert_eq!(created.id, 1);
        assert!(!created.completed);
        assert_eq!(created.description, None);

        let updated = UpdateTask::new(&repo)
            .execute(1, &TaskPatch::default().completed(true), &owner)
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Buy bread");
        assert!(updated.completed);

        let get = GetTask::new(&repo);
        assert_eq!(get.execute(1, &stranger).unwrap(), None);

        let delete = DeleteTask::new(&repo);
        assert!(delete.execute(1, &owner).unwrap());
        assert_eq!(get.execute(1, &owner).unwrap(), None);
    }

    #[test]
    fn task_service_bundles_every_operation() {
        let repo = InMemoryTaskRepository::new();
        let service = TaskService::new(&repo);
        let tenant = TenantId::new("u1");

        let created = service.create.execute(&NewTask::new("a"), &tenant).unwrap();
        assert!(service.get.execute(created.id, &tenant).unwrap().is_some());
        assert!(service
            .update
            .execute(created.id, &TaskPatch::default().title("b"), &tenant)
            .unwrap()
            .is_some());
        assert!(service.delete.execute(created.id, &tenant).unwrap());
        assert!(service.list.execute(&tenant).unwrap().is_empty());
    }
}
