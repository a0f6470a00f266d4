//! Share registry contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist `(note, grantee)` read grants.
//! - Enforce pair uniqueness and note existence inside the store.
//!
//! # Invariants
//! - `share_grants(note_uuid, grantee)` is `UNIQUE`; duplicates surface as
//!   `RepoError::DuplicateGrant`, never as a silent merge.
//! - `note_uuid` references `notes(uuid) ON DELETE CASCADE`; inserting a grant
//!   for a vanished note surfaces as `RepoError::NotFound`.
//! - Grantee listings are ordered by grant creation.

use crate::model::note::{NoteId, PrincipalId};
use crate::model::share::ShareGrant;
use crate::repo::note_repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::ffi;
use rusqlite::{params, Connection, Row};

const GRANT_SELECT_SQL: &str = "SELECT
    note_uuid,
    grantee,
    created_at
FROM share_grants";

/// Record-store interface for share grants. Performs no authorization.
pub trait ShareRegistry {
    /// Creates one grant. Fails with `DuplicateGrant` if the pair exists.
    fn grant(&self, note_id: NoteId, grantee: &PrincipalId) -> RepoResult<ShareGrant>;
    /// Finds the grant for one `(note, grantee)` pair.
    fn find_grant(&self, note_id: NoteId, grantee: &PrincipalId)
        -> RepoResult<Option<ShareGrant>>;
    /// Lists grants addressed to `grantee` in grant order.
    fn list_grants_for_grantee(&self, grantee: &PrincipalId) -> RepoResult<Vec<ShareGrant>>;
    /// Lists grants on one note in grant order.
    fn list_grants_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ShareGrant>>;
    /// Removes all grants on one note. Returns the number removed.
    fn remove_grants_for_note(&self, note_id: NoteId) -> RepoResult<usize>;
}

impl<T: ShareRegistry + ?Sized> ShareRegistry for &T {
    fn grant(&self, note_id: NoteId, grantee: &PrincipalId) -> RepoResult<ShareGrant> {
        (**self).grant(note_id, grantee)
    }

    fn find_grant(
        &self,
        note_id: NoteId,
        grantee: &PrincipalId,
    ) -> RepoResult<Option<ShareGrant>> {
        (**self).find_grant(note_id, grantee)
    }

    fn list_grants_for_grantee(&self, grantee: &PrincipalId) -> RepoResult<Vec<ShareGrant>> {
        (**self).list_grants_for_grantee(grantee)
    }

    fn list_grants_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ShareGrant>> {
        (**self).list_grants_for_note(note_id)
    }

    fn remove_grants_for_note(&self, note_id: NoteId) -> RepoResult<usize> {
        (**self).remove_grants_for_note(note_id)
    }
}

/// SQLite-backed share registry.
pub struct SqliteShareRegistry<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShareRegistry<'conn> {
    /// Constructs a registry from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes", "share_grants"])?;
        Ok(Self { conn })
    }
}

impl ShareRegistry for SqliteShareRegistry<'_> {
    fn grant(&self, note_id: NoteId, grantee: &PrincipalId) -> RepoResult<ShareGrant> {
        if grantee.as_str().trim().is_empty() {
            return Err(RepoError::BlankPrincipal);
        }

        let created_at = self
            .conn
            .query_row(
                "INSERT INTO share_grants (note_uuid, grantee)
                 VALUES (?1, ?2)
                 RETURNING created_at;",
                params![note_id.to_string(), grantee.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|err| map_grant_insert_error(err, note_id, grantee))?;

        Ok(ShareGrant {
            note_id,
            grantee: grantee.clone(),
            created_at,
        })
    }

    fn find_grant(
        &self,
        note_id: NoteId,
        grantee: &PrincipalId,
    ) -> RepoResult<Option<ShareGrant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRANT_SELECT_SQL}
             WHERE note_uuid = ?1 AND grantee = ?2;"
        ))?;
        let mut rows = stmt.query(params![note_id.to_string(), grantee.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_grant_row(row)?));
        }
        Ok(None)
    }

    fn list_grants_for_grantee(&self, grantee: &PrincipalId) -> RepoResult<Vec<ShareGrant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRANT_SELECT_SQL}
             WHERE grantee = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([grantee.as_str()])?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next()? {
            grants.push(parse_grant_row(row)?);
        }
        Ok(grants)
    }

    fn list_grants_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ShareGrant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRANT_SELECT_SQL}
             WHERE note_uuid = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next()? {
            grants.push(parse_grant_row(row)?);
        }
        Ok(grants)
    }

    fn remove_grants_for_note(&self, note_id: NoteId) -> RepoResult<usize> {
        delete_grants_for_note(self.conn, note_id)
    }
}

/// Deletes every grant on `note_id` using the caller's connection or
/// transaction.
pub(crate) fn delete_grants_for_note(conn: &Connection, note_id: NoteId) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM share_grants WHERE note_uuid = ?1;",
        [note_id.to_string()],
    )?;
    Ok(removed)
}

fn parse_grant_row(row: &Row<'_>) -> RepoResult<ShareGrant> {
    let note_uuid: String = row.get("note_uuid")?;
    let grantee: String = row.get("grantee")?;
    Ok(ShareGrant {
        note_id: parse_uuid(&note_uuid, "share_grants.note_uuid")?,
        grantee: PrincipalId::new(grantee),
        created_at: row.get("created_at")?,
    })
}

fn map_grant_insert_error(
    err: rusqlite::Error,
    note_id: NoteId,
    grantee: &PrincipalId,
) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return RepoError::DuplicateGrant {
                    note_id,
                    grantee: grantee.clone(),
                };
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return RepoError::NotFound(note_id),
            _ => {}
        }
    }
    RepoError::from(err)
}
