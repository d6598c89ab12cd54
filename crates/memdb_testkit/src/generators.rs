//! Property-based test generators using proptest.

use crate::fixtures::Person;
use proptest::prelude::*;
use uuid::Uuid;

/// Strategy for generating names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex")
}

/// Strategy for generating tag lists, possibly empty and with repeats.
pub fn tags_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec!["admin", "dev", "ops", "sales", "support"]),
        0..4,
    )
    .prop_map(|tags| tags.into_iter().map(str::to_string).collect())
}

/// Strategy for generating a person whose id is one of `slots` values.
///
/// A small slot count makes repeated writes to the same primary key likely.
pub fn person_strategy(slots: u128) -> impl Strategy<Value = Person> {
    (
        0..slots.max(1),
        name_strategy(),
        -100_i64..100,
        tags_strategy(),
        any::<bool>(),
    )
        .prop_map(|(slot, name, age, tags, managed)| {
            let id = Uuid::from_u128(slot + 1);
            Person {
                id,
                email: format!("{name}.{slot}@example.com"),
                name,
                age,
                tags,
                manager: managed.then(|| Uuid::from_u128(1)),
                attrs: Vec::new(),
            }
        })
}

/// A single write in a generated workload.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or replace a person.
    Insert(Person),
    /// Delete the person in the given slot, if present.
    Delete(u128),
}

impl WriteOp {
    /// Primary key the operation targets.
    pub fn id(&self) -> Uuid {
        match self {
            WriteOp::Insert(person) => person.id,
            WriteOp::Delete(slot) => Uuid::from_u128(slot + 1),
        }
    }
}

/// Strategy for generating a write operation over `slots` primary keys.
pub fn write_op_strategy(slots: u128) -> impl Strategy<Value = WriteOp> {
    prop_oneof![
        3 => person_strategy(slots).prop_map(WriteOp::Insert),
        1 => (0..slots.max(1)).prop_map(WriteOp::Delete),
    ]
}

/// Strategy for generating a sequence of write operations.
pub fn write_ops_strategy(slots: u128, max_len: usize) -> impl Strategy<Value = Vec<WriteOp>> {
    prop::collection::vec(write_op_strategy(slots), 1..=max_len.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_people_stay_in_slots(person in person_strategy(4)) {
            prop_assert!(person.id.as_u128() >= 1 && person.id.as_u128() <= 4);
            prop_assert!(!person.name.is_empty());
        }

        #[test]
        fn op_ids_stay_in_slots(op in write_op_strategy(3)) {
            let id = op.id().as_u128();
            prop_assert!((1..=3).contains(&id));
        }
    }
}
