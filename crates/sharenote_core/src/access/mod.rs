//! Access-control decisions for notes.
//!
//! # Responsibility
//! - Decide read/mutate/share authorization for one principal and one note.
//! - Enumerate the visible set (owned ∪ shared) with provenance tags.
//!
//! # Invariants
//! - Ownership is always checked before any grant lookup.
//! - Grants confer read access only; never mutate, delete or re-share.
//! - Grants that reference missing notes fail closed (skipped, not raised).

pub mod evaluator;
