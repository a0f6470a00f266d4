use sharenote_core::db::open_db;
use sharenote_core::{
    ErrorKind, NoteStore, PrincipalId, ShareRegistry, SqliteNoteService, SqliteNoteStore,
    SqlitePrincipalDirectory, SqliteShareRegistry,
};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

const GRANTEES: usize = 6;

fn seed(path: &Path) -> uuid::Uuid {
    let conn = open_db(path).unwrap();
    let directory = SqlitePrincipalDirectory::try_new(&conn).unwrap();
    directory
        .register(&PrincipalId::new("alice"), "Alice")
        .unwrap();
    for idx in 0..GRANTEES {
        let id = PrincipalId::new(format!("grantee-{idx}"));
        directory.register(&id, "Grantee").unwrap();
    }
    let notes = SqliteNoteStore::try_new(&conn).unwrap();
    notes
        .create_note(&PrincipalId::new("alice"), "Groceries", "milk")
        .unwrap()
        .id
}

#[test]
fn racing_shares_and_delete_leave_no_orphan_grants() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let note_id = seed(&path);
    let barrier = Arc::new(Barrier::new(GRANTEES + 1));

    let mut handles = Vec::new();
    for idx in 0..GRANTEES {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            let conn = open_db(&path).unwrap();
            let service = SqliteNoteService::try_from_connection(&conn).unwrap();
            let alice = PrincipalId::new("alice");
            let grantee = PrincipalId::new(format!("grantee-{idx}"));
            barrier.wait();
            match service.share_note(&alice, note_id, &grantee) {
                Ok(_) => {}
                Err(err) => assert_eq!(err.kind(), ErrorKind::NotFound, "{err}"),
            }
        }));
    }

    let deleter = {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let conn = open_db(&path).unwrap();
            let service = SqliteNoteService::try_from_connection(&conn).unwrap();
            barrier.wait();
            service
                .delete_note(&PrincipalId::new("alice"), note_id)
                .unwrap();
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    deleter.join().unwrap();

    let conn = open_db(&path).unwrap();
    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*)
             FROM share_grants g
             LEFT JOIN notes n ON n.uuid = g.note_uuid
             WHERE n.uuid IS NULL;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);

    let shares = SqliteShareRegistry::try_new(&conn).unwrap();
    assert!(shares.list_grants_for_note(note_id).unwrap().is_empty());
}

#[test]
fn racing_duplicate_shares_persist_one_grant() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.db");
    let note_id = seed(&path);
    let workers = 4;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = SqliteNoteService::try_from_connection(&conn).unwrap();
                barrier.wait();
                service
                    .share_note(
                        &PrincipalId::new("alice"),
                        note_id,
                        &PrincipalId::new("grantee-0"),
                    )
                    .map_err(|err| err.kind())
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .all(|kind| *kind == ErrorKind::AlreadyShared));

    let conn = open_db(&path).unwrap();
    let shares = SqliteShareRegistry::try_new(&conn).unwrap();
    assert_eq!(shares.list_grants_for_note(note_id).unwrap().len(), 1);
}
