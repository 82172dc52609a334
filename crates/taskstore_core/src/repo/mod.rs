//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the tenant-scoped task contract consumed by use cases.
//! - Provide a SQLite implementation and an in-memory reference double.
//!
//! # Invariants
//! - Every operation takes the tenant explicitly; no call can reach
//!   another tenant's rows.
//! - "Not found" and "owned by someone else" are indistinguishable and are
//!   reported as `None`/`false`, never as errors.
//! - Both implementations produce identical observable results.

pub mod memory_task_repo;
pub mod sqlite_task_repo;
pub mod task_repo;
