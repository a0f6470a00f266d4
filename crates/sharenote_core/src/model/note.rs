//! Note domain model.
//!
//! # Responsibility
//! - Define the stored note record and its identity types.
//! - Validate user-supplied note fields before persistence.
//!
//! # Invariants
//! - `title` and `body` are non-blank for every persisted note.
//! - `owner` never changes after creation.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a note.
pub type NoteId = Uuid;

/// Opaque identity of an authenticated principal.
///
/// The core trusts this value completely; credential checks happen upstream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wraps an upstream identity value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PrincipalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Field-level validation failures for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyBody,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyBody => write!(f, "note body must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Stored note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Creator of the note and sole holder of mutate/delete/share rights.
    pub owner: PrincipalId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Returns whether `principal` owns this note.
    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        &self.owner == principal
    }
}

/// Validated title/body pair accepted by store write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent {
    title: String,
    body: String,
}

impl NoteContent {
    /// Validates raw input. Surrounding whitespace is kept as written.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        let title = title.into();
        let body = body.into();
        if title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if body.trim().is_empty() {
            return Err(NoteValidationError::EmptyBody);
        }
        Ok(Self { title, body })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
