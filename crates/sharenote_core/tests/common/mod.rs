#![allow(dead_code)]

use sharenote_core::db::open_db_in_memory;
use sharenote_core::{
    AccessEvaluator, MemoryStore, NoteService, NoteStore, PrincipalDirectory, PrincipalId,
    ShareRegistry, SqliteNoteStore, SqlitePrincipalDirectory, SqliteShareRegistry,
};

pub type DynEvaluator<'a> =
    AccessEvaluator<'a, dyn NoteStore + 'a, dyn ShareRegistry + 'a, dyn PrincipalDirectory + 'a>;

pub type DynService<'a> =
    NoteService<&'a dyn NoteStore, &'a dyn ShareRegistry, &'a dyn PrincipalDirectory>;

/// One store backend wired through trait objects.
pub struct Backend<'a> {
    pub label: &'static str,
    pub notes: &'a dyn NoteStore,
    pub shares: &'a dyn ShareRegistry,
    pub principals: &'a dyn PrincipalDirectory,
}

impl<'a> Backend<'a> {
    pub fn service(&self) -> DynService<'a> {
        NoteService::new(self.notes, self.shares, self.principals)
    }

    pub fn evaluator(&self) -> DynEvaluator<'a> {
        AccessEvaluator::new(self.notes, self.shares, self.principals)
    }
}

pub fn principal(id: &str) -> PrincipalId {
    PrincipalId::new(id)
}

/// Runs `test` once against the in-memory store and once against SQLite,
/// with `registered` principals known to the directory.
pub fn for_each_backend(registered: &[&str], test: impl Fn(&Backend<'_>)) {
    let memory = MemoryStore::new();
    for id in registered {
        memory.register_principal(&principal(id), id).unwrap();
    }
    test(&Backend {
        label: "memory",
        notes: &memory,
        shares: &memory,
        principals: &memory,
    });

    let conn = open_db_in_memory().unwrap();
    let notes = SqliteNoteStore::try_new(&conn).unwrap();
    let shares = SqliteShareRegistry::try_new(&conn).unwrap();
    let directory = SqlitePrincipalDirectory::try_new(&conn).unwrap();
    for id in registered {
        directory.register(&principal(id), id).unwrap();
    }
    test(&Backend {
        label: "sqlite",
        notes: &notes,
        shares: &shares,
        principals: &directory,
    });
}
