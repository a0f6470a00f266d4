//! Domain model for notes, share grants and derived visibility.
//!
//! # Responsibility
//! - Define canonical data structures used by core access-control logic.
//! - Keep stored records (`Note`, `ShareGrant`) apart from derived views
//!   (`VisibleNote`, `Provenance`).
//!
//! # Invariants
//! - Every note has exactly one owner, fixed at creation.
//! - `VisibleNote` is produced transiently and never persisted.

pub mod note;
pub mod share;
