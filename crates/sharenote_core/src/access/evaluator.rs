//! Access evaluator over injected note/grant/principal stores.
//!
//! # Responsibility
//! - Implement `can_read`, `can_mutate`, `resolve_provenance`,
//!   `list_visible` and `authorize_share`.
//!
//! # Invariants
//! - `can_read(p, n)` holds iff `p` owns `n` or a grant `(n, p)` exists.
//! - `can_mutate(p, n)` holds iff `p` owns `n`.
//! - `list_visible(p)` returns owned notes (store order) then shared notes
//!   (grant order), each note exactly once.
//! - Store errors propagate unchanged; nothing here retries.

use crate::model::note::{Note, NoteId, PrincipalId};
use crate::model::share::{Provenance, ShareGrant, VisibleNote};
use crate::repo::note_repo::{NoteStore, RepoError};
use crate::repo::principal_repo::PrincipalDirectory;
use crate::repo::share_repo::ShareRegistry;
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccessResult<T> = Result<T, AccessError>;

/// Authorization failure or store failure raised during evaluation.
#[derive(Debug)]
pub enum AccessError {
    /// Note does not exist (or vanished while granting).
    NoteNotFound(NoteId),
    /// Grantee id does not resolve in the principal directory.
    PrincipalNotFound(PrincipalId),
    /// Note exists but the principal is not allowed the action.
    Forbidden {
        principal: PrincipalId,
        note_id: NoteId,
    },
    /// Grant for this pair already exists.
    AlreadyShared {
        note_id: NoteId,
        grantee: PrincipalId,
    },
    Repo(RepoError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::PrincipalNotFound(id) => write!(f, "principal not found: {id}"),
            Self::Forbidden { principal, note_id } => {
                write!(f, "principal {principal} is not authorized for note {note_id}")
            }
            Self::AlreadyShared { note_id, grantee } => {
                write!(f, "note {note_id} is already shared with {grantee}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::DuplicateGrant { note_id, grantee } => {
                Self::AlreadyShared { note_id, grantee }
            }
            other => Self::Repo(other),
        }
    }
}

/// Action names used in denial log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
    Share,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Share => "share",
        }
    }
}

/// Decision engine borrowing the stores it consults.
pub struct AccessEvaluator<'a, N: ?Sized, S: ?Sized, P: ?Sized> {
    notes: &'a N,
    shares: &'a S,
    principals: &'a P,
}

impl<'a, N, S, P> AccessEvaluator<'a, N, S, P>
where
    N: NoteStore + ?Sized,
    S: ShareRegistry + ?Sized,
    P: PrincipalDirectory + ?Sized,
{
    pub fn new(notes: &'a N, shares: &'a S, principals: &'a P) -> Self {
        Self {
            notes,
            shares,
            principals,
        }
    }

    /// Returns whether `principal` may read `note`.
    pub fn can_read(&self, principal: &PrincipalId, note: &Note) -> AccessResult<bool> {
        Ok(self.resolve_provenance(principal, note)?.is_visible())
    }

    /// Returns whether `principal` may update, delete or share `note`.
    pub fn can_mutate(&self, principal: &PrincipalId, note: &Note) -> bool {
        note.is_owned_by(principal)
    }

    /// Resolves why `note` is visible to `principal`.
    ///
    /// Ownership wins over a self-grant.
    pub fn resolve_provenance(
        &self,
        principal: &PrincipalId,
        note: &Note,
    ) -> AccessResult<Provenance> {
        if note.is_owned_by(principal) {
            return Ok(Provenance::Owned);
        }
        let provenance = match self.shares.find_grant(note.id, principal)? {
            Some(_) => Provenance::Shared,
            None => Provenance::None,
        };
        Ok(provenance)
    }

    /// Fails with `Forbidden` unless `principal` may read `note`.
    pub fn authorize_read(&self, principal: &PrincipalId, note: &Note) -> AccessResult<Provenance> {
        match self.resolve_provenance(principal, note)? {
            Provenance::None => Err(self.deny(Action::Read, principal, note)),
            visible => Ok(visible),
        }
    }

    /// Fails with `Forbidden` unless `principal` owns `note`.
    pub fn authorize_mutation(
        &self,
        action: Action,
        principal: &PrincipalId,
        note: &Note,
    ) -> AccessResult<()> {
        if self.can_mutate(principal, note) {
            Ok(())
        } else {
            Err(self.deny(action, principal, note))
        }
    }

    /// Lists every note visible to `principal`, tagged with provenance.
    pub fn list_visible(&self, principal: &PrincipalId) -> AccessResult<Vec<VisibleNote>> {
        let owned = self.notes.list_notes_by_owner(principal)?;
        let mut seen: HashSet<NoteId> = owned.iter().map(|note| note.id).collect();
        let mut visible: Vec<VisibleNote> = owned
            .into_iter()
            .map(|note| VisibleNote {
                note,
                provenance: Provenance::Owned,
            })
            .collect();

        for grant in self.shares.list_grants_for_grantee(principal)? {
            if seen.contains(&grant.note_id) {
                continue;
            }
            match self.notes.get_note(grant.note_id)? {
                Some(note) => {
                    seen.insert(note.id);
                    visible.push(VisibleNote {
                        note,
                        provenance: Provenance::Shared,
                    });
                }
                None => debug!(
                    "event=dangling_grant_skipped module=access status=ok principal={} note_id={}",
                    principal, grant.note_id
                ),
            }
        }

        Ok(visible)
    }

    /// Creates a grant for `grantee` on `note` on behalf of `acting`.
    ///
    /// Checks run in order: ownership, grantee existence, existing grant.
    pub fn authorize_share(
        &self,
        acting: &PrincipalId,
        note: &Note,
        grantee: &PrincipalId,
    ) -> AccessResult<ShareGrant> {
        self.authorize_mutation(Action::Share, acting, note)?;

        if !self.principals.resolve(grantee)? {
            warn!(
                "event=share module=access status=denied reason=grantee_not_found principal={} note_id={} grantee={}",
                acting, note.id, grantee
            );
            return Err(AccessError::PrincipalNotFound(grantee.clone()));
        }

        if self.shares.find_grant(note.id, grantee)?.is_some() {
            warn!(
                "event=share module=access status=denied reason=already_shared principal={} note_id={} grantee={}",
                acting, note.id, grantee
            );
            return Err(AccessError::AlreadyShared {
                note_id: note.id,
                grantee: grantee.clone(),
            });
        }

        // The store re-checks uniqueness and note existence on insert, so a
        // racing grant or delete still surfaces as AlreadyShared / NotFound.
        let grant = self.shares.grant(note.id, grantee)?;
        debug!(
            "event=share module=access status=ok principal={} note_id={} grantee={}",
            acting, note.id, grantee
        );
        Ok(grant)
    }

    fn deny(&self, action: Action, principal: &PrincipalId, note: &Note) -> AccessError {
        warn!(
            "event={} module=access status=denied reason=forbidden principal={} note_id={}",
            action.as_str(),
            principal,
            note.id
        );
        AccessError::Forbidden {
            principal: principal.clone(),
            note_id: note.id,
        }
    }
}
