//! Core use-case services.
//!
//! # Responsibility
//! - Expose one service per task operation, each bound to a repository.
//! - Require an authenticated tenant on every call.
//!
//! # Invariants
//! - Services never bypass the repository contract.
//! - Service layer remains storage-agnostic.

pub mod task_service;
