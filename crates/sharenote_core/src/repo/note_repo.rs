//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/update/delete/list-by-owner over `notes`.
//! - Cascade grant removal when a note is deleted.
//!
//! # Invariants
//! - Write paths validate title/body before SQL mutations.
//! - `owner` is written once at creation and never updated.
//! - Owner listings are ordered by creation (`created_at ASC, rowid ASC`).

use crate::db::DbError;
use crate::model::note::{Note, NoteContent, NoteId, NoteValidationError, PrincipalId};
use crate::repo::share_repo::delete_grants_for_note;
use log::debug;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    body,
    owner,
    created_at,
    updated_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error shared by note, grant and principal repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    /// Referenced note does not exist.
    NotFound(NoteId),
    /// A grant for this `(note, grantee)` pair already exists.
    DuplicateGrant {
        note_id: NoteId,
        grantee: PrincipalId,
    },
    /// Principal ids must be non-blank.
    BlankPrincipal,
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateGrant { note_id, grantee } => {
                write!(f, "note {note_id} is already shared with {grantee}")
            }
            Self::BlankPrincipal => write!(f, "principal id must not be blank"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record-store interface for notes. Performs no authorization.
pub trait NoteStore {
    /// Creates a note owned by `owner`. Fails with `Validation` on blank fields.
    fn create_note(&self, owner: &PrincipalId, title: &str, body: &str) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Replaces title and body. Fails with `NotFound` when the note is gone.
    fn update_note(&self, id: NoteId, title: &str, body: &str) -> RepoResult<Note>;
    /// Deletes a note and every grant that references it.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Lists notes owned by `owner` in creation order.
    fn list_notes_by_owner(&self, owner: &PrincipalId) -> RepoResult<Vec<Note>>;
}

impl<T: NoteStore + ?Sized> NoteStore for &T {
    fn create_note(&self, owner: &PrincipalId, title: &str, body: &str) -> RepoResult<Note> {
        (**self).create_note(owner, title, body)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get_note(id)
    }

    fn update_note(&self, id: NoteId, title: &str, body: &str) -> RepoResult<Note> {
        (**self).update_note(id, title, body)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        (**self).delete_note(id)
    }

    fn list_notes_by_owner(&self, owner: &PrincipalId) -> RepoResult<Vec<Note>> {
        (**self).list_notes_by_owner(owner)
    }
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes", "share_grants"])?;
        Ok(Self { conn })
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn create_note(&self, owner: &PrincipalId, title: &str, body: &str) -> RepoResult<Note> {
        let content = NoteContent::new(title, body)?;
        if owner.as_str().trim().is_empty() {
            return Err(RepoError::BlankPrincipal);
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO notes (uuid, title, body, owner) VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                content.title(),
                content.body(),
                owner.as_str()
            ],
        )?;

        self.get_note(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created note {id} missing on read-back"))
        })
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        select_note(self.conn, id)
    }

    fn update_note(&self, id: NoteId, title: &str, body: &str) -> RepoResult<Note> {
        let content = NoteContent::new(title, body)?;
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                body = ?3,
                updated_at = max(updated_at, strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), content.title(), content.body()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.get_note(id)?.ok_or(RepoError::NotFound(id))
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed_grants = delete_grants_for_note(&tx, id)?;
        let changed = tx.execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;

        debug!(
            "event=note_delete module=repo status=ok note_id={} removed_grants={}",
            id, removed_grants
        );
        Ok(())
    }

    fn list_notes_by_owner(&self, owner: &PrincipalId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE owner = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([owner.as_str()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

pub(crate) fn select_note(conn: &Connection, id: NoteId) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(row)?));
    }
    Ok(None)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let owner: String = row.get("owner")?;
    Ok(Note {
        id: parse_uuid(&uuid_text, "notes.uuid")?,
        title: row.get("title")?,
        body: row.get("body")?,
        owner: PrincipalId::new(owner),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
