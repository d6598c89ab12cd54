//! Change tracking.

use memdb_core::{args, Change, Config};
use memdb_testkit::{sample_person, write_ops_strategy, Person, TestDatabase, WriteOp, PEOPLE};
use proptest::prelude::*;
use std::collections::BTreeMap;
use uuid::Uuid;

fn exactly_one_kind(change: &Change<Person>) -> bool {
    [change.created(), change.updated(), change.deleted()]
        .iter()
        .filter(|kind| **kind)
        .count()
        == 1
}

#[test]
fn repeated_updates_collapse_into_one_change() {
    let db = TestDatabase::new();
    let a = sample_person(0);
    db.insert_all(PEOPLE, [a.clone()]);

    let mut b = a.clone();
    b.age = 50;
    let mut c = a.clone();
    c.age = 60;

    let mut txn = db.txn(true);
    txn.insert(PEOPLE, b).unwrap();
    txn.insert(PEOPLE, c.clone()).unwrap();
    let changes = txn.changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].table, PEOPLE);
    assert_eq!(changes[0].before.as_deref(), Some(&a));
    assert_eq!(changes[0].after.as_deref(), Some(&c));
    assert!(changes[0].updated());
    txn.commit().unwrap();

    // Still readable after commit.
    assert_eq!(txn.changes().unwrap().len(), 1);
}

#[test]
fn changes_are_classified() {
    let db = TestDatabase::with_people(2);
    let mut updated = sample_person(0);
    updated.name = "renamed".to_string();

    let mut txn = db.txn(true);
    txn.insert(PEOPLE, sample_person(5)).unwrap();
    txn.insert(PEOPLE, updated).unwrap();
    txn.delete(PEOPLE, &sample_person(1)).unwrap();
    let changes = txn.changes().unwrap();
    txn.commit().unwrap();

    assert_eq!(changes.len(), 3);
    assert!(changes.iter().all(exactly_one_kind));
    assert!(changes[0].created());
    assert!(changes[1].updated());
    assert!(changes[2].deleted());
    assert_eq!(changes[2].primary_key(), sample_person(1).id.as_bytes());
}

#[test]
fn insert_then_delete_leaves_no_change() {
    let db = TestDatabase::new();
    let person = Person::new("brief", 1);
    let mut txn = db.txn(true);
    txn.insert(PEOPLE, person.clone()).unwrap();
    txn.delete(PEOPLE, &person).unwrap();
    assert!(txn.changes().unwrap().is_empty());
}

#[test]
fn delete_all_is_tracked_per_object() {
    let db = TestDatabase::with_people(10);
    let mut txn = db.txn(true);
    let removed = txn.delete_all(PEOPLE, "name", &args!["alice"]).unwrap();
    let changes = txn.changes().unwrap();
    assert_eq!(removed, 2);
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(Change::deleted));
}

#[test]
fn tracking_disabled_by_config() {
    let db = TestDatabase::with_config(Config::new().track_changes(false));
    let mut txn = db.txn(true);
    txn.insert(PEOPLE, Person::new("untracked", 3)).unwrap();
    assert!(txn.changes().is_none());

    txn.track_changes();
    txn.insert(PEOPLE, Person::new("tracked", 4)).unwrap();
    assert_eq!(txn.changes().unwrap().len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The change log of a transaction equals the difference between the
    /// state it started from and the state it ends with.
    #[test]
    fn changes_match_net_effect(
        seed in write_ops_strategy(6, 8),
        ops in write_ops_strategy(6, 24),
    ) {
        let db = TestDatabase::new();
        let mut initial: BTreeMap<Uuid, Person> = BTreeMap::new();
        {
            let mut txn = db.txn(true);
            for op in seed {
                if let WriteOp::Insert(person) = op {
                    initial.insert(person.id, person.clone());
                    txn.insert(PEOPLE, person).unwrap();
                }
            }
            txn.commit().unwrap();
        }

        let mut state = initial.clone();
        let mut touched = Vec::new();
        let mut txn = db.txn(true);
        for op in ops {
            let id = op.id();
            match op {
                WriteOp::Insert(person) => {
                    state.insert(id, person.clone());
                    txn.insert(PEOPLE, person).unwrap();
                }
                WriteOp::Delete(_) => match state.remove(&id) {
                    Some(person) => txn.delete(PEOPLE, &person).unwrap(),
                    None => continue,
                },
            }
            if !touched.contains(&id) {
                touched.push(id);
            }
        }

        let expected: Vec<(Option<&Person>, Option<&Person>)> = touched
            .iter()
            .map(|id| (initial.get(id), state.get(id)))
            .filter(|(before, after)| before.is_some() || after.is_some())
            .collect();
        let changes = txn.changes().unwrap();
        let actual: Vec<(Option<&Person>, Option<&Person>)> = changes
            .iter()
            .map(|c| (c.before.as_deref(), c.after.as_deref()))
            .collect();
        prop_assert_eq!(actual, expected);
        prop_assert!(changes.iter().all(exactly_one_kind));
    }
}
