//! SQLite implementation of the task repository contract.
//!
//! # Responsibility
//! - Translate contract calls into parameterized statements on `tasks`.
//! - Map rows to `Task` with explicit, per-column checks.
//!
//! # Invariants
//! - Every statement carries `user_id = ?` so tenant scoping happens in SQL.
//! - Values are always bound, never interpolated into SQL text.
//! - `completed` is stored as 0/1; timestamps as fixed-width RFC 3339 text.

use crate::model::task::{
    format_timestamp, now_timestamp, parse_timestamp, NewTask, Task, TaskId, TaskPatch, TenantId,
};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use log::error;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    completed,
    user_id,
    created_at,
    updated_at
FROM tasks";

const REQUIRED_TASK_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "completed",
    "user_id",
    "created_at",
    "updated_at",
];

/// SQLite-backed task repository borrowing a caller-owned connection.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when `tasks` does not exist.
    /// - `MissingRequiredColumn` when the schema predates the tenant column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tasks_schema(conn)?;
        Ok(Self { conn })
    }

    fn select_one(&self, id: TaskId, tenant: &TenantId) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{TASK_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id, tenant.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn find_all(&self, tenant: &TenantId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{TASK_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC;"
        ))?;

        let mut rows = stmt.query([tenant.as_str()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn find_by_id(&self, id: TaskId, tenant: &TenantId) -> RepoResult<Option<Task>> {
        self.select_one(id, tenant)
    }

    fn create(&self, input: &NewTask, tenant: &TenantId) -> RepoResult<Task> {
        let now = format_timestamp(now_timestamp());
        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                completed,
                user_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, 0, ?3, ?4, ?4);",
            params![
                input.title.as_str(),
                input.description.as_deref(),
                tenant.as_str(),
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.select_one(id, tenant)?.ok_or_else(|| {
            error!("event=task_create module=repo status=error error_code=read_back_missing id={id}");
            RepoError::ReadBackMissing(id)
        })
    }

    fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        tenant: &TenantId,
    ) -> RepoResult<Option<Task>> {
        let (replace_description, description) = match &patch.description {
            Some(value) => (true, value.as_deref()),
            None => (false, None),
        };

        // One statement both checks ownership and returns the merged row, so
        // it nests inside any transaction the caller has open.
        let mut stmt = self.conn.prepare_cached(
            "UPDATE tasks
             SET
                title = COALESCE(?1, title),
                description = CASE WHEN ?2 = 1 THEN ?3 ELSE description END,
                completed = COALESCE(?4, completed),
                updated_at = MAX(?5, created_at)
             WHERE id = ?6
               AND user_id = ?7
             RETURNING
                id,
                title,
                description,
                completed,
                user_id,
                created_at,
                updated_at;",
        )?;

        let mut rows = stmt.query(params![
            patch.title.as_deref(),
            bool_to_int(replace_description),
            description,
            patch.completed.map(bool_to_int),
            format_timestamp(now_timestamp()),
            id,
            tenant.as_str(),
        ])?;
        let updated = match rows.next()? {
            Some(row) => Some(parse_task_row(row)?),
            None => None,
        };
        Ok(updated)
    }

    fn delete(&self, id: TaskId, tenant: &TenantId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM tasks
             WHERE id = ?1
               AND user_id = ?2;",
            params![id, tenant.as_str()],
        )?;

        Ok(changed > 0)
    }
}

fn ensure_tasks_schema(conn: &Connection) -> RepoResult<()> {
    let table_exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks';",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !table_exists {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(tasks);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;

    for &required in REQUIRED_TASK_COLUMNS {
        if !columns.iter().any(|column| column == required) {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column: required,
            });
        }
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed for id {id}"
            )));
        }
    };

    let created_at = parse_timestamp_column(row, "created_at", id)?;
    let updated_at = parse_timestamp_column(row, "updated_at", id)?;

    Ok(Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        completed,
        tenant_id: TenantId::new(row.get::<_, String>("user_id")?),
        created_at,
        updated_at,
    })
}

fn parse_timestamp_column(
    row: &Row<'_>,
    column: &'static str,
    id: TaskId,
) -> RepoResult<chrono::DateTime<chrono::Utc>> {
    let text: String = row.get(column)?;
    parse_timestamp(&text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{text}` in tasks.{column} for id {id}"
        ))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
