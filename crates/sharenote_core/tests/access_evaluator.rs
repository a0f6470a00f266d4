mod common;

use common::{for_each_backend, principal};
use sharenote_core::{AccessError, Note, NoteStore, PrincipalId, Provenance, ShareRegistry};
use std::collections::HashMap;

const PEOPLE: &[&str] = &["alice", "bob", "carol", "dave"];

#[test]
fn can_read_iff_owner_or_grantee() {
    for_each_backend(PEOPLE, |backend| {
        let evaluator = backend.evaluator();
        let alice = principal("alice");
        let bob = principal("bob");
        let notes: Vec<Note> = (0..3)
            .map(|idx| {
                backend
                    .notes
                    .create_note(&alice, &format!("note {idx}"), "body")
                    .unwrap()
            })
            .collect();
        backend.shares.grant(notes[1].id, &bob).unwrap();

        for note in &notes {
            for who in PEOPLE {
                let who = principal(who);
                let expected = who == note.owner
                    || backend.shares.find_grant(note.id, &who).unwrap().is_some();
                assert_eq!(
                    evaluator.can_read(&who, note).unwrap(),
                    expected,
                    "{}: {} on {}",
                    backend.label,
                    who,
                    note.title
                );
            }
        }
    });
}

#[test]
fn strangers_can_neither_read_nor_mutate() {
    for_each_backend(PEOPLE, |backend| {
        let evaluator = backend.evaluator();
        let note = backend
            .notes
            .create_note(&principal("alice"), "private", "body")
            .unwrap();
        let carol = principal("carol");
        assert!(!evaluator.can_read(&carol, &note).unwrap());
        assert!(!evaluator.can_mutate(&carol, &note));
        assert_eq!(
            evaluator.resolve_provenance(&carol, &note).unwrap(),
            Provenance::None
        );
    });
}

#[test]
fn grants_never_confer_mutate_rights() {
    for_each_backend(PEOPLE, |backend| {
        let evaluator = backend.evaluator();
        let alice = principal("alice");
        let bob = principal("bob");
        let note = backend.notes.create_note(&alice, "shared", "body").unwrap();
        evaluator.authorize_share(&alice, &note, &bob).unwrap();

        assert!(evaluator.can_read(&bob, &note).unwrap());
        assert!(!evaluator.can_mutate(&bob, &note), "{}", backend.label);
        assert!(evaluator.can_mutate(&alice, &note));

        let err = evaluator
            .authorize_share(&bob, &note, &principal("carol"))
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden { .. }));
        assert!(backend
            .shares
            .find_grant(note.id, &principal("carol"))
            .unwrap()
            .is_none());
    });
}

#[test]
fn provenance_checks_ownership_first() {
    for_each_backend(PEOPLE, |backend| {
        let evaluator = backend.evaluator();
        let alice = principal("alice");
        let bob = principal("bob");
        let note = backend.notes.create_note(&alice, "t", "b").unwrap();
        backend.shares.grant(note.id, &bob).unwrap();
        // Self-grant is not prevented by the store.
        backend.shares.grant(note.id, &alice).unwrap();

        assert_eq!(
            evaluator.resolve_provenance(&alice, &note).unwrap(),
            Provenance::Owned
        );
        assert_eq!(
            evaluator.resolve_provenance(&bob, &note).unwrap(),
            Provenance::Shared
        );
    });
}

#[test]
fn list_visible_is_exactly_owned_plus_granted() {
    for_each_backend(PEOPLE, |backend| {
        let evaluator = backend.evaluator();
        let alice = principal("alice");
        let bob = principal("bob");
        let carol = principal("carol");

        let bob_own_1 = backend.notes.create_note(&bob, "bob 1", "b").unwrap();
        let alice_shared = backend.notes.create_note(&alice, "alice 1", "b").unwrap();
        let alice_private = backend.notes.create_note(&alice, "alice 2", "b").unwrap();
        let carol_shared = backend.notes.create_note(&carol, "carol 1", "b").unwrap();
        let bob_own_2 = backend.notes.create_note(&bob, "bob 2", "b").unwrap();
        backend.shares.grant(carol_shared.id, &bob).unwrap();
        backend.shares.grant(alice_shared.id, &bob).unwrap();
        backend.shares.grant(bob_own_1.id, &bob).unwrap();

        let visible = evaluator.list_visible(&bob).unwrap();
        let tagged: Vec<(PrincipalId, Provenance)> = visible
            .iter()
            .map(|v| (v.note.owner.clone(), v.provenance))
            .collect();
        let ids: Vec<_> = visible.iter().map(|v| v.note.id).collect();

        assert_eq!(
            ids,
            vec![bob_own_1.id, bob_own_2.id, carol_shared.id, alice_shared.id],
            "{}",
            backend.label
        );
        assert_eq!(
            tagged,
            vec![
                (bob.clone(), Provenance::Owned),
                (bob.clone(), Provenance::Owned),
                (carol.clone(), Provenance::Shared),
                (alice.clone(), Provenance::Shared),
            ]
        );
        assert!(!ids.contains(&alice_private.id));

        let mut counts: HashMap<_, usize> = HashMap::new();
        for id in ids {
            *counts.entry(id).or_default() += 1;
        }
        assert!(counts.values().all(|count| *count == 1));
    });
}

#[test]
fn authorize_share_checks_in_order() {
    for_each_backend(PEOPLE, |backend| {
        let evaluator = backend.evaluator();
        let alice = principal("alice");
        let bob = principal("bob");
        let note = backend.notes.create_note(&alice, "t", "b").unwrap();

        let err = evaluator
            .authorize_share(&alice, &note, &principal("ghost"))
            .unwrap_err();
        assert!(
            matches!(&err, AccessError::PrincipalNotFound(id) if id.as_str() == "ghost"),
            "{}: {err}",
            backend.label
        );

        evaluator.authorize_share(&alice, &note, &bob).unwrap();
        let err = evaluator.authorize_share(&alice, &note, &bob).unwrap_err();
        assert!(matches!(err, AccessError::AlreadyShared { .. }));
        assert_eq!(backend.shares.list_grants_for_note(note.id).unwrap().len(), 1);
    });
}
