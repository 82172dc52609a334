//! Task domain model shared by every layer.
//!
//! # Responsibility
//! - Define the persisted `Task` record and its create/patch inputs.
//! - Own the merge rule used by every repository implementation.
//!
//! # Invariants
//! - A task's tenant is fixed at creation.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod task;
