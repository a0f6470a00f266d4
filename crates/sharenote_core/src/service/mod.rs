//! Core use-case services.
//!
//! # Responsibility
//! - Expose the note operations the request layer calls, per principal.
//! - Route every read and mutation through the access evaluator.
//! - Keep request layers decoupled from storage details.

pub mod note_service;
