//! Benchmark utilities.

use memdb_core::Database;
use memdb_testkit::{person_schema, Person, PEOPLE};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

const NAMES: [&str; 6] = ["ana", "ben", "cai", "dee", "eli", "fay"];
const TAGS: [&str; 4] = ["red", "green", "blue", "gold"];

/// Generate random tree keys of the given length.
pub fn random_keys(count: usize, len: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect())
        .collect()
}

/// Generate people with random ids, names, ages and tags.
pub fn random_people(count: usize) -> Vec<Person> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let name = NAMES.choose(&mut rng).copied().unwrap_or("anon");
            let tag_count = rng.gen_range(0..3);
            let tags = TAGS
                .choose_multiple(&mut rng, tag_count)
                .map(|t| (*t).to_string())
                .collect();
            Person {
                id: Uuid::new_v4(),
                email: format!("{name}{i}@bench.test"),
                name: name.to_string(),
                age: rng.gen_range(0..100),
                tags,
                manager: None,
                attrs: Vec::new(),
            }
        })
        .collect()
}

/// Opens a database holding `people` in the people table.
pub fn populated_db(people: &[Person]) -> Database<Person> {
    let db = Database::new(person_schema()).expect("valid schema");
    {
        let mut txn = db.txn(true);
        for person in people {
            txn.insert(PEOPLE, person.clone()).expect("insert");
        }
        txn.commit().expect("commit");
    }
    db
}
