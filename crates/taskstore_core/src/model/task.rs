//! Task entity, tenant identity and input types.
//!
//! # Responsibility
//! - Define the canonical `Task` record returned by repositories.
//! - Provide the partial-update merge shared by SQL and in-memory stores.
//! - Own the sortable timestamp text format used in persisted rows.
//!
//! # Invariants
//! - `tenant_id` never changes after creation.
//! - `updated_at >= created_at`; both are equal at creation.
//! - `id` is unique store-wide and never reused.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier.
pub type TaskId = i64;

/// Opaque identifier of the authenticated owner of a task.
///
/// Repositories treat it as an exact-match key and never interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

/// Rejected tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tenant id must not be empty")]
pub struct EmptyTenantId;

impl TenantId {
    /// Wraps an identifier taken from an authenticated session as is.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Wraps an identifier from an untrusted boundary.
    ///
    /// Rejects empty or whitespace-only values; the empty tenant owns rows
    /// that predate the tenant column.
    pub fn try_new(value: impl Into<String>) -> Result<Self, EmptyTenantId> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(EmptyTenantId);
        }
        Ok(Self(value))
    }

    /// Raw identifier, as bound into tenant-scoped statements.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// `None` is distinct from an empty description.
    pub description: Option<String>,
    pub completed: bool,
    /// Serialized as `userId` to match the external JSON shape.
    #[serde(rename = "userId")]
    pub tenant_id: TenantId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Merges `patch` over this task and refreshes `updated_at`.
    ///
    /// Fields absent from the patch keep their current value. `updated_at`
    /// never moves behind `created_at`, even if the clock steps backwards.
    pub fn apply_patch(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now.max(self.created_at);
    }
}

/// Input for creating a task.
///
/// `title` is validated at the request boundary; an empty title is stored
/// as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTask {
    /// Input with a title and no description.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Sets the optional description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update input.
///
/// `description` is doubly optional: `None` leaves the stored value alone,
/// `Some(None)` clears it and `Some(Some(text))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Replaces the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces (`Some`) or clears (`None`) the description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Sets the completion flag.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Returns whether no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Formats a timestamp as fixed-width RFC 3339 UTC text.
///
/// Fixed width keeps lexical order equal to chronological order, which the
/// SQL store relies on for `ORDER BY created_at DESC`.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses text produced by [`format_timestamp`] (or any RFC 3339 value).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Current time truncated to the precision persisted by [`format_timestamp`].
///
/// Both repositories use this so a value read back from SQL compares equal
/// to the one produced in memory.
pub fn now_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    parse_timestamp(&format_timestamp(now)).unwrap_or(now)
}
