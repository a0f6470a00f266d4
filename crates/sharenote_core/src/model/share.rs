//! Share grants and derived visibility views.
//!
//! # Responsibility
//! - Define the stored `(note, grantee)` grant record.
//! - Define provenance tagging for notes visible to a principal.
//!
//! # Invariants
//! - At most one grant exists per `(note_id, grantee)` pair.
//! - `VisibleNote::provenance` is never `Provenance::None`.

use crate::model::note::{Note, NoteId, PrincipalId};
use serde::{Deserialize, Serialize};

/// Read permission on one note for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub note_id: NoteId,
    pub grantee: PrincipalId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Why a note is visible to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Principal owns the note.
    Owned,
    /// Principal holds a grant for the note.
    Shared,
    /// Principal has no visibility.
    None,
}

impl Provenance {
    /// Returns whether this provenance confers read access.
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::Shared => "shared",
            Self::None => "none",
        }
    }
}

/// Note decorated with the reason it is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleNote {
    #[serde(flatten)]
    pub note: Note,
    pub provenance: Provenance,
}

/// Known principal in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
}
