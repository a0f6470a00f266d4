//! In-memory record store for tests and embedding.
//!
//! # Responsibility
//! - Implement `NoteStore`, `ShareRegistry` and `PrincipalDirectory` over one
//!   shared, mutex-guarded state so note deletion can cascade to grants.
//!
//! # Invariants
//! - Every trait call is atomic with respect to other calls on the same store.
//! - Iteration order is insertion order, mirroring the SQLite store.

use crate::model::note::{Note, NoteContent, NoteId, PrincipalId};
use crate::model::share::{Principal, ShareGrant};
use crate::repo::note_repo::{NoteStore, RepoError, RepoResult};
use crate::repo::principal_repo::PrincipalDirectory;
use crate::repo::share_repo::ShareRegistry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    notes: Vec<Note>,
    grants: Vec<ShareGrant>,
    principals: BTreeMap<PrincipalId, Principal>,
    clock: i64,
}

impl MemoryState {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn note_index(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }
}

/// Shared in-memory store implementing every repository contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a principal, or renames it when already present.
    pub fn register_principal(
        &self,
        id: &PrincipalId,
        display_name: &str,
    ) -> RepoResult<Principal> {
        if id.as_str().trim().is_empty() {
            return Err(RepoError::BlankPrincipal);
        }
        let principal = Principal {
            id: id.clone(),
            display_name: display_name.to_string(),
        };
        self.lock().principals.insert(id.clone(), principal.clone());
        Ok(principal)
    }

    /// Inserts a grant without checking that the note exists.
    ///
    /// Simulates stores that clean up orphan grants eventually. Test support
    /// only; request code goes through `ShareRegistry::grant`.
    #[doc(hidden)]
    pub fn insert_unchecked_grant(&self, note_id: NoteId, grantee: &PrincipalId) {
        let mut state = self.lock();
        let created_at = state.tick();
        state.grants.push(ShareGrant {
            note_id,
            grantee: grantee.clone(),
            created_at,
        });
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NoteStore for MemoryStore {
    fn create_note(&self, owner: &PrincipalId, title: &str, body: &str) -> RepoResult<Note> {
        let content = NoteContent::new(title, body)?;
        if owner.as_str().trim().is_empty() {
            return Err(RepoError::BlankPrincipal);
        }
        let mut state = self.lock();
        let now = state.tick();
        let note = Note {
            id: Uuid::new_v4(),
            title: content.title().to_string(),
            body: content.body().to_string(),
            owner: owner.clone(),
            created_at: now,
            updated_at: now,
        };
        state.notes.push(note.clone());
        Ok(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let state = self.lock();
        Ok(state.notes.iter().find(|note| note.id == id).cloned())
    }

    fn update_note(&self, id: NoteId, title: &str, body: &str) -> RepoResult<Note> {
        let content = NoteContent::new(title, body)?;
        let mut state = self.lock();
        let now = state.tick();
        let index = state.note_index(id).ok_or(RepoError::NotFound(id))?;
        let note = &mut state.notes[index];
        note.title = content.title().to_string();
        note.body = content.body().to_string();
        note.updated_at = now;
        Ok(note.clone())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let mut state = self.lock();
        let index = state.note_index(id).ok_or(RepoError::NotFound(id))?;
        state.notes.remove(index);
        state.grants.retain(|grant| grant.note_id != id);
        Ok(())
    }

    fn list_notes_by_owner(&self, owner: &PrincipalId) -> RepoResult<Vec<Note>> {
        let state = self.lock();
        Ok(state
            .notes
            .iter()
            .filter(|note| &note.owner == owner)
            .cloned()
            .collect())
    }
}

impl ShareRegistry for MemoryStore {
    fn grant(&self, note_id: NoteId, grantee: &PrincipalId) -> RepoResult<ShareGrant> {
        if grantee.as_str().trim().is_empty() {
            return Err(RepoError::BlankPrincipal);
        }
        let mut state = self.lock();
        if state.note_index(note_id).is_none() {
            return Err(RepoError::NotFound(note_id));
        }
        if state
            .grants
            .iter()
            .any(|grant| grant.note_id == note_id && &grant.grantee == grantee)
        {
            return Err(RepoError::DuplicateGrant {
                note_id,
                grantee: grantee.clone(),
            });
        }
        let created_at = state.tick();
        let grant = ShareGrant {
            note_id,
            grantee: grantee.clone(),
            created_at,
        };
        state.grants.push(grant.clone());
        Ok(grant)
    }

    fn find_grant(
        &self,
        note_id: NoteId,
        grantee: &PrincipalId,
    ) -> RepoResult<Option<ShareGrant>> {
        let state = self.lock();
        Ok(state
            .grants
            .iter()
            .find(|grant| grant.note_id == note_id && &grant.grantee == grantee)
            .cloned())
    }

    fn list_grants_for_grantee(&self, grantee: &PrincipalId) -> RepoResult<Vec<ShareGrant>> {
        let state = self.lock();
        Ok(state
            .grants
            .iter()
            .filter(|grant| &grant.grantee == grantee)
            .cloned()
            .collect())
    }

    fn list_grants_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ShareGrant>> {
        let state = self.lock();
        Ok(state
            .grants
            .iter()
            .filter(|grant| grant.note_id == note_id)
            .cloned()
            .collect())
    }

    fn remove_grants_for_note(&self, note_id: NoteId) -> RepoResult<usize> {
        let mut state = self.lock();
        let before = state.grants.len();
        state.grants.retain(|grant| grant.note_id != note_id);
        Ok(before - state.grants.len())
    }
}

impl PrincipalDirectory for MemoryStore {
    fn resolve(&self, id: &PrincipalId) -> RepoResult<bool> {
        Ok(self.lock().principals.contains_key(id))
    }

    fn list_principals_except(&self, id: &PrincipalId) -> RepoResult<Vec<Principal>> {
        let state = self.lock();
        Ok(state
            .principals
            .values()
            .filter(|principal| &principal.id != id)
            .cloned()
            .collect())
    }
}
