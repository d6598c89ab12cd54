//! Test fixtures and database helpers.
//!
//! [`Person`] is the sample object type used across the integration tests
//! and benchmarks. Its schema puts at least one index on every built-in
//! indexer.

use memdb_core::{
    CompoundIndex, Config, Database, DbSchema, FieldSetIndex, IndexSchema, Indexer, IntFieldIndex,
    StringFieldIndex, StringMapFieldIndex, StringSliceFieldIndex, TableSchema, UuidFieldIndex,
};
use std::sync::Arc;
use uuid::Uuid;

/// Table holding current people.
pub const PEOPLE: &str = "people";

/// Second table with the same schema, for multi-table tests.
pub const ARCHIVE: &str = "archive";

const NAMES: [&str; 8] = [
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi",
];

const TAGS: [&str; 5] = ["admin", "dev", "ops", "sales", "support"];

/// Sample object stored in test databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Primary key.
    pub id: Uuid,
    /// Unique, case-insensitive.
    pub email: String,
    /// Display name; not unique.
    pub name: String,
    /// Age in years.
    pub age: i64,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Optional reference to another person.
    pub manager: Option<Uuid>,
    /// Free-form attributes.
    pub attrs: Vec<(String, String)>,
}

impl Person {
    /// Creates a person with a random id and an email derived from `name`.
    pub fn new(name: &str, age: i64) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            email: format!("{name}.{}@example.com", id.simple()),
            name: name.to_string(),
            age,
            tags: Vec::new(),
            manager: None,
            attrs: Vec::new(),
        }
    }

    /// Replaces the tags.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Sets the manager.
    pub fn with_manager(mut self, manager: Uuid) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }
}

fn table(name: &str) -> TableSchema<Person> {
    TableSchema::new(name)
        .index(
            IndexSchema::new(
                "id",
                Indexer::single(UuidFieldIndex::new(|p: &Person| Some(p.id))),
            )
            .unique(),
        )
        .index(
            IndexSchema::new(
                "email",
                Indexer::single(
                    StringFieldIndex::new(|p: &Person| Some(p.email.as_str())).lowercase(),
                ),
            )
            .unique(),
        )
        .index(IndexSchema::new(
            "name",
            Indexer::single(StringFieldIndex::new(|p: &Person| Some(p.name.as_str()))),
        ))
        .index(IndexSchema::new(
            "age",
            Indexer::single(IntFieldIndex::new(|p: &Person| Some(p.age))),
        ))
        .index(
            IndexSchema::new(
                "tags",
                Indexer::multi(StringSliceFieldIndex::new(|p: &Person| {
                    p.tags.iter().map(String::as_str).collect()
                })),
            )
            .allow_missing(),
        )
        .index(
            IndexSchema::new(
                "manager",
                Indexer::single(UuidFieldIndex::new(|p: &Person| p.manager)),
            )
            .allow_missing(),
        )
        .index(IndexSchema::new(
            "has_manager",
            Indexer::single(FieldSetIndex::new(|p: &Person| p.manager.is_some())),
        ))
        .index(IndexSchema::new(
            "name_age",
            Indexer::single(
                CompoundIndex::new()
                    .part(StringFieldIndex::new(|p: &Person| Some(p.name.as_str())))
                    .part(IntFieldIndex::new(|p: &Person| Some(p.age))),
            ),
        ))
        .index(
            IndexSchema::new(
                "attrs",
                Indexer::multi(StringMapFieldIndex::new(|p: &Person| {
                    p.attrs
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect()
                })),
            )
            .allow_missing(),
        )
}

/// Returns the schema of the [`PEOPLE`] and [`ARCHIVE`] tables.
pub fn person_schema() -> DbSchema<Person> {
    DbSchema::new().table(table(PEOPLE)).table(table(ARCHIVE))
}

/// Returns a deterministic person for index `i`.
///
/// Ids are `Uuid::from_u128(i + 1)`, names cycle through eight values and
/// every third person reports to person 0.
pub fn sample_person(i: usize) -> Person {
    let id = Uuid::from_u128(i as u128 + 1);
    let name = NAMES[i % NAMES.len()];
    let mut person = Person {
        id,
        email: format!("{name}{i}@example.com"),
        name: name.to_string(),
        age: 20 + (i % 50) as i64,
        tags: vec![TAGS[i % TAGS.len()].to_string()],
        manager: None,
        attrs: vec![("team".to_string(), format!("t{}", i % 4))],
    };
    if i % 3 == 1 {
        person.tags.push(TAGS[(i + 1) % TAGS.len()].to_string());
    }
    if i > 0 && i % 3 == 0 {
        person.manager = Some(Uuid::from_u128(1));
    }
    person
}

/// Returns `count` sample people.
pub fn sample_people(count: usize) -> Vec<Person> {
    (0..count).map(sample_person).collect()
}

/// A test database of [`Person`] objects.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database<Person>,
}

impl TestDatabase {
    /// Creates an empty test database.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty test database with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        init_tracing();
        Self {
            db: Database::with_config(person_schema(), config)
                .expect("Failed to create test database"),
        }
    }

    /// Creates a test database holding [`sample_people`]`(count)` in the
    /// [`PEOPLE`] table.
    pub fn with_people(count: usize) -> Self {
        let test_db = Self::new();
        test_db.insert_all(PEOPLE, sample_people(count));
        test_db
    }

    /// Inserts `people` into `table` in a single committed transaction.
    pub fn insert_all(&self, table: &str, people: impl IntoIterator<Item = Person>) {
        let mut txn = self.db.txn(true);
        for person in people {
            txn.insert(table, person).expect("Failed to insert person");
        }
        txn.commit().expect("Failed to commit");
    }

    /// Returns every person in `table` in primary key order.
    pub fn all(&self, table: &str) -> Vec<Arc<Person>> {
        self.db
            .txn(false)
            .get(table, "id", &[])
            .expect("Failed to scan table")
            .collect()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database<Person>;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Installs a `tracing` subscriber for tests.
///
/// Honors `RUST_LOG` and writes through the test harness so output is
/// captured per test. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Runs `f` against a fresh test database.
///
/// # Example
///
/// ```rust
/// use memdb_testkit::{with_test_db, Person, PEOPLE};
///
/// with_test_db(|db| {
///     let mut txn = db.txn(true);
///     txn.insert(PEOPLE, Person::new("joe", 40)).unwrap();
///     txn.commit().unwrap();
/// });
/// ```
pub fn with_test_db<F, R>(f: F) -> R
where
    F: FnOnce(&TestDatabase) -> R,
{
    let db = TestDatabase::new();
    f(&db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memdb_core::args;

    #[test]
    fn schema_is_valid() {
        assert!(person_schema().validate().is_ok());
    }

    #[test]
    fn sample_people_are_distinct() {
        let people = sample_people(20);
        for (i, p) in people.iter().enumerate() {
            assert_eq!(*p, sample_person(i));
        }
        let mut emails: Vec<_> = people.iter().map(|p| p.email.clone()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 20);
    }

    #[test]
    fn populated_database() {
        let db = TestDatabase::with_people(12);
        assert_eq!(db.all(PEOPLE).len(), 12);
        assert!(db.all(ARCHIVE).is_empty());

        let txn = db.txn(false);
        let managed = txn.get(PEOPLE, "has_manager", &args![true]).unwrap().count();
        assert_eq!(managed, 3);
    }
}
