//! Keyword search scoped to a principal's visible set.
//!
//! # Responsibility
//! - Compose visibility (from the access evaluator) with text matching.
//! - Keep tokenization rules in one place.

pub mod keyword;
