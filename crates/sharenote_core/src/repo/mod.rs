//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define record-store contracts for notes, grants and principals.
//! - Isolate SQLite query details from access evaluation and services.
//!
//! # Invariants
//! - Repositories never make authorization decisions.
//! - Note deletion removes every grant on the note in the same unit of work.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateGrant`)
//!   in addition to DB transport errors.

pub mod memory_repo;
pub mod note_repo;
pub mod principal_repo;
pub mod share_repo;
