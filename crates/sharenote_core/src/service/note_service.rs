//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/read/update/delete/list/share/search entry points for an
//!   already-authenticated principal.
//! - Map evaluator and store failures to request-facing error kinds.
//!
//! # Invariants
//! - Every read path is authorized through `resolve_provenance`.
//! - Every mutation and share is authorized through ownership.
//! - Missing notes fail `NotFound` before any ownership check, so `NotFound`
//!   and `Forbidden` stay distinguishable.

use crate::access::evaluator::{AccessError, AccessEvaluator, Action};
use crate::model::note::{Note, NoteId, NoteValidationError, PrincipalId};
use crate::model::share::{Principal, ShareGrant, VisibleNote};
use crate::repo::note_repo::{NoteStore, RepoError, RepoResult, SqliteNoteStore};
use crate::repo::principal_repo::{PrincipalDirectory, SqlitePrincipalDirectory};
use crate::repo::share_repo::{ShareRegistry, SqliteShareRegistry};
use crate::search::keyword::{SearchEngine, SearchQuery};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse error classes the request layer maps to transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    AlreadyShared,
    Infrastructure,
}

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title or body is empty.
    Validation(NoteValidationError),
    NoteNotFound(NoteId),
    /// Grantee does not resolve in the principal directory.
    PrincipalNotFound(PrincipalId),
    /// Note exists but the caller lacks the required right.
    Forbidden {
        principal: PrincipalId,
        note_id: NoteId,
    },
    AlreadyShared {
        note_id: NoteId,
        grantee: PrincipalId,
    },
    /// Store failure, propagated unmodified.
    Repo(RepoError),
}

impl NoteServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Repo(RepoError::BlankPrincipal) => ErrorKind::Validation,
            Self::NoteNotFound(_) | Self::PrincipalNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::AlreadyShared { .. } => ErrorKind::AlreadyShared,
            Self::Repo(_) => ErrorKind::Infrastructure,
        }
    }

    /// HTTP-style status the request layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::AlreadyShared => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Infrastructure => 500,
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::PrincipalNotFound(id) => write!(f, "user not found: {id}"),
            Self::Forbidden { note_id, .. } => {
                write!(f, "not authorized to access note {note_id}")
            }
            Self::AlreadyShared { grantee, .. } => {
                write!(f, "note already shared with {grantee}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::DuplicateGrant { note_id, grantee } => {
                Self::AlreadyShared { note_id, grantee }
            }
            other => Self::Repo(other),
        }
    }
}

impl From<AccessError> for NoteServiceError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::NoteNotFound(id) => Self::NoteNotFound(id),
            AccessError::PrincipalNotFound(id) => Self::PrincipalNotFound(id),
            AccessError::Forbidden { principal, note_id } => {
                Self::Forbidden { principal, note_id }
            }
            AccessError::AlreadyShared { note_id, grantee } => {
                Self::AlreadyShared { note_id, grantee }
            }
            AccessError::Repo(err) => Self::from(err),
        }
    }
}

pub type ServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over injected stores.
pub struct NoteService<N, S, P> {
    notes: N,
    shares: S,
    principals: P,
}

/// Note service backed by one SQLite connection.
pub type SqliteNoteService<'conn> = NoteService<
    SqliteNoteStore<'conn>,
    SqliteShareRegistry<'conn>,
    SqlitePrincipalDirectory<'conn>,
>;

impl<'conn> SqliteNoteService<'conn> {
    /// Builds all three SQLite stores over a migrated connection.
    pub fn try_from_connection(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteNoteStore::try_new(conn)?,
            SqliteShareRegistry::try_new(conn)?,
            SqlitePrincipalDirectory::try_new(conn)?,
        ))
    }
}

impl<N, S, P> NoteService<N, S, P>
where
    N: NoteStore,
    S: ShareRegistry,
    P: PrincipalDirectory,
{
    pub fn new(notes: N, shares: S, principals: P) -> Self {
        Self {
            notes,
            shares,
            principals,
        }
    }

    /// Returns an evaluator over this service's stores.
    pub fn evaluator(&self) -> AccessEvaluator<'_, N, S, P> {
        AccessEvaluator::new(&self.notes, &self.shares, &self.principals)
    }

    /// Creates a note owned by `principal`.
    pub fn create_note(
        &self,
        principal: &PrincipalId,
        title: &str,
        body: &str,
    ) -> ServiceResult<Note> {
        let note = self.notes.create_note(principal, title, body)?;
        info!(
            "event=note_create module=service status=ok principal={} note_id={}",
            principal, note.id
        );
        Ok(note)
    }

    /// Reads one note decorated with the caller's provenance.
    pub fn read_note(&self, principal: &PrincipalId, id: NoteId) -> ServiceResult<VisibleNote> {
        let note = self.load(id)?;
        let provenance = self.evaluator().authorize_read(principal, &note)?;
        Ok(VisibleNote { note, provenance })
    }

    /// Replaces title and body. Owner only.
    pub fn update_note(
        &self,
        principal: &PrincipalId,
        id: NoteId,
        title: &str,
        body: &str,
    ) -> ServiceResult<Note> {
        let note = self.load(id)?;
        self.evaluator()
            .authorize_mutation(Action::Update, principal, &note)?;
        let updated = self.notes.update_note(id, title, body)?;
        info!(
            "event=note_update module=service status=ok principal={} note_id={}",
            principal, id
        );
        Ok(updated)
    }

    /// Deletes a note and all of its grants. Owner only.
    pub fn delete_note(&self, principal: &PrincipalId, id: NoteId) -> ServiceResult<()> {
        let note = self.load(id)?;
        self.evaluator()
            .authorize_mutation(Action::Delete, principal, &note)?;
        self.notes.delete_note(id)?;
        info!(
            "event=note_delete module=service status=ok principal={} note_id={}",
            principal, id
        );
        Ok(())
    }

    /// Lists owned and shared notes.
    pub fn list_visible(&self, principal: &PrincipalId) -> ServiceResult<Vec<VisibleNote>> {
        Ok(self.evaluator().list_visible(principal)?)
    }

    /// Grants `grantee` read access to note `id`. Owner only.
    pub fn share_note(
        &self,
        principal: &PrincipalId,
        id: NoteId,
        grantee: &PrincipalId,
    ) -> ServiceResult<ShareGrant> {
        let note = self.load(id)?;
        let grant = self.evaluator().authorize_share(principal, &note, grantee)?;
        info!(
            "event=note_share module=service status=ok principal={} note_id={} grantee={}",
            principal, id, grantee
        );
        Ok(grant)
    }

    /// Lists grants on note `id`. Owner only.
    pub fn list_grants(
        &self,
        principal: &PrincipalId,
        id: NoteId,
    ) -> ServiceResult<Vec<ShareGrant>> {
        let note = self.load(id)?;
        self.evaluator()
            .authorize_mutation(Action::Share, principal, &note)?;
        Ok(self.shares.list_grants_for_note(id)?)
    }

    /// Searches notes visible to `principal`.
    pub fn search(&self, principal: &PrincipalId, query: &SearchQuery) -> ServiceResult<Vec<Note>> {
        let evaluator = self.evaluator();
        Ok(SearchEngine::new(&evaluator).search(principal, query)?)
    }

    /// Lists candidate grantees: every known principal except the caller.
    pub fn list_principals(&self, principal: &PrincipalId) -> ServiceResult<Vec<Principal>> {
        Ok(self.principals.list_principals_except(principal)?)
    }

    fn load(&self, id: NoteId) -> ServiceResult<Note> {
        self.notes
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }
}
