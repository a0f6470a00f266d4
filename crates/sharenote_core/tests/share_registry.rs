mod common;

use common::{for_each_backend, principal};
use sharenote_core::db::open_db_in_memory;
use sharenote_core::{NoteStore, RepoError, ShareRegistry, SqliteNoteStore, SqliteShareRegistry};
use uuid::Uuid;

#[test]
fn grant_then_find() {
    for_each_backend(&[], |backend| {
        let bob = principal("bob");
        let note = backend
            .notes
            .create_note(&principal("alice"), "t", "b")
            .unwrap();
        let grant = backend.shares.grant(note.id, &bob).unwrap();
        assert_eq!(grant.note_id, note.id);
        assert_eq!(grant.grantee, bob);

        let found = backend.shares.find_grant(note.id, &bob).unwrap();
        assert_eq!(found.map(|g| g.grantee), Some(bob), "{}", backend.label);
        assert!(backend
            .shares
            .find_grant(note.id, &principal("carol"))
            .unwrap()
            .is_none());
    });
}

#[test]
fn duplicate_grant_is_rejected_and_not_merged() {
    for_each_backend(&[], |backend| {
        let bob = principal("bob");
        let note = backend
            .notes
            .create_note(&principal("alice"), "t", "b")
            .unwrap();
        backend.shares.grant(note.id, &bob).unwrap();

        let err = backend.shares.grant(note.id, &bob).unwrap_err();
        assert!(
            matches!(
                &err,
                RepoError::DuplicateGrant { note_id, grantee }
                    if *note_id == note.id && grantee == &bob
            ),
            "{}: {err}",
            backend.label
        );
        assert_eq!(backend.shares.list_grants_for_note(note.id).unwrap().len(), 1);
    });
}

#[test]
fn grant_for_missing_note_is_not_found() {
    for_each_backend(&[], |backend| {
        let missing = Uuid::new_v4();
        let err = backend.shares.grant(missing, &principal("bob")).unwrap_err();
        assert!(
            matches!(err, RepoError::NotFound(id) if id == missing),
            "{}",
            backend.label
        );
    });
}

#[test]
fn grants_for_grantee_keep_grant_order() {
    for_each_backend(&[], |backend| {
        let alice = principal("alice");
        let bob = principal("bob");
        let first = backend.notes.create_note(&alice, "first", "b").unwrap();
        let second = backend.notes.create_note(&alice, "second", "b").unwrap();
        backend.shares.grant(second.id, &bob).unwrap();
        backend.shares.grant(first.id, &bob).unwrap();
        backend.shares.grant(first.id, &principal("carol")).unwrap();

        let ids: Vec<_> = backend
            .shares
            .list_grants_for_grantee(&bob)
            .unwrap()
            .into_iter()
            .map(|grant| grant.note_id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id], "{}", backend.label);
    });
}

#[test]
fn remove_grants_for_note_reports_count() {
    for_each_backend(&[], |backend| {
        let note = backend
            .notes
            .create_note(&principal("alice"), "t", "b")
            .unwrap();
        backend.shares.grant(note.id, &principal("bob")).unwrap();
        backend.shares.grant(note.id, &principal("carol")).unwrap();

        assert_eq!(backend.shares.remove_grants_for_note(note.id).unwrap(), 2);
        assert_eq!(backend.shares.remove_grants_for_note(note.id).unwrap(), 0);
        assert!(backend.notes.get_note(note.id).unwrap().is_some());
    });
}

#[test]
fn sqlite_foreign_key_cascade_removes_grants_on_raw_delete() {
    let conn = open_db_in_memory().unwrap();
    let notes = SqliteNoteStore::try_new(&conn).unwrap();
    let shares = SqliteShareRegistry::try_new(&conn).unwrap();
    let bob = principal("bob");
    let note = notes.create_note(&principal("alice"), "t", "b").unwrap();
    shares.grant(note.id, &bob).unwrap();

    conn.execute("DELETE FROM notes WHERE uuid = ?1;", [note.id.to_string()])
        .unwrap();

    assert!(shares.list_grants_for_grantee(&bob).unwrap().is_empty());
}
