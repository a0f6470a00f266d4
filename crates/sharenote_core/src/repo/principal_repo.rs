//! Principal directory contract and a SQLite reference directory.
//!
//! Identities are issued and authenticated upstream; the core only asks
//! whether an id resolves. The SQLite directory exists so a single database
//! can back the whole service in tests and the CLI.

use crate::model::note::PrincipalId;
use crate::model::share::Principal;
use crate::repo::note_repo::{ensure_tables, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Lookup interface for known principals.
pub trait PrincipalDirectory {
    /// Returns whether `id` names a known principal.
    fn resolve(&self, id: &PrincipalId) -> RepoResult<bool>;
    /// Lists every known principal except `id`, ordered by id.
    fn list_principals_except(&self, id: &PrincipalId) -> RepoResult<Vec<Principal>>;
}

impl<T: PrincipalDirectory + ?Sized> PrincipalDirectory for &T {
    fn resolve(&self, id: &PrincipalId) -> RepoResult<bool> {
        (**self).resolve(id)
    }

    fn list_principals_except(&self, id: &PrincipalId) -> RepoResult<Vec<Principal>> {
        (**self).list_principals_except(id)
    }
}

/// SQLite-backed principal directory.
pub struct SqlitePrincipalDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePrincipalDirectory<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["principals"])?;
        Ok(Self { conn })
    }

    /// Registers a principal, or renames it when already present.
    pub fn register(&self, id: &PrincipalId, display_name: &str) -> RepoResult<Principal> {
        if id.as_str().trim().is_empty() {
            return Err(RepoError::BlankPrincipal);
        }
        self.conn.execute(
            "INSERT INTO principals (id, display_name)
             VALUES (?1, ?2)
             ON CONFLICT (id) DO UPDATE SET display_name = excluded.display_name;",
            params![id.as_str(), display_name],
        )?;
        Ok(Principal {
            id: id.clone(),
            display_name: display_name.to_string(),
        })
    }
}

impl PrincipalDirectory for SqlitePrincipalDirectory<'_> {
    fn resolve(&self, id: &PrincipalId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM principals WHERE id = ?1);",
            [id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_principals_except(&self, id: &PrincipalId) -> RepoResult<Vec<Principal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name
             FROM principals
             WHERE id <> ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([id.as_str()])?;
        let mut principals = Vec::new();
        while let Some(row) = rows.next()? {
            let principal_id: String = row.get("id")?;
            principals.push(Principal {
                id: PrincipalId::new(principal_id),
                display_name: row.get("display_name")?,
            });
        }
        Ok(principals)
    }
}
