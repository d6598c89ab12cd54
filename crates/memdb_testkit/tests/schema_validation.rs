//! Schema validation properties.

use memdb_core::{
    Database, DbSchema, IndexSchema, Indexer, IntFieldIndex, SchemaError, StringFieldIndex,
    StringSliceFieldIndex, TableSchema, UuidFieldIndex,
};
use memdb_testkit::{person_schema, Person};
use proptest::prelude::*;

/// Shape of the `"id"` index in a generated table.
#[derive(Debug, Clone, Copy, PartialEq)]
enum IdShape {
    Absent,
    NotUnique,
    Multi,
    Valid,
}

fn id_shape() -> impl Strategy<Value = IdShape> {
    prop_oneof![
        Just(IdShape::Absent),
        Just(IdShape::NotUnique),
        Just(IdShape::Multi),
        Just(IdShape::Valid),
    ]
}

fn id_index(shape: IdShape) -> Option<IndexSchema<Person>> {
    let single = || Indexer::single(UuidFieldIndex::new(|p: &Person| Some(p.id)));
    match shape {
        IdShape::Absent => None,
        IdShape::NotUnique => Some(IndexSchema::new("id", single())),
        IdShape::Multi => Some(
            IndexSchema::new(
                "id",
                Indexer::multi(StringSliceFieldIndex::new(|p: &Person| {
                    p.tags.iter().map(String::as_str).collect()
                })),
            )
            .unique(),
        ),
        IdShape::Valid => Some(IndexSchema::new("id", single()).unique()),
    }
}

fn table(name: &str, shape: IdShape, extra: &[String]) -> TableSchema<Person> {
    let mut table = TableSchema::new(name);
    if let Some(id) = id_index(shape) {
        table = table.index(id);
    }
    for index in extra {
        table = table.index(IndexSchema::new(
            index.as_str(),
            Indexer::single(IntFieldIndex::new(|p: &Person| Some(p.age))),
        ));
    }
    table
}

proptest! {
    #[test]
    fn validation_matches_primary_index_shape(
        shapes in prop::collection::vec(id_shape(), 1..4),
        extra in prop::collection::vec("[a-h]{1,6}", 0..4),
    ) {
        let extra: Vec<String> = extra.into_iter().filter(|name| name != "id").collect();
        let mut schema = DbSchema::new();
        for (i, shape) in shapes.iter().enumerate() {
            schema = schema.table(table(&format!("t{i}"), *shape, &extra));
        }

        let result = schema.validate();
        let every_table_valid = shapes.iter().all(|s| *s == IdShape::Valid);
        prop_assert_eq!(result.is_ok(), every_table_valid);
        if let Err(err) = result {
            prop_assert!(matches!(
                err,
                SchemaError::MissingIdIndex(_)
                    | SchemaError::IdNotUnique(_)
                    | SchemaError::IdNotSingle(_)
                    | SchemaError::NoIndexes(_)
            ));
        }
    }
}

#[test]
fn empty_schema_is_rejected() {
    let schema = DbSchema::<Person>::new();
    assert_eq!(schema.validate(), Err(SchemaError::NoTables));
    assert!(Database::new(schema).is_err());
}

#[test]
fn mismatched_names_are_rejected() {
    let mut schema = DbSchema::new().table(table("people", IdShape::Valid, &[]));
    let renamed = schema.tables.remove("people").expect("table exists");
    schema.tables.insert("humans".to_string(), renamed);
    assert_eq!(
        schema.validate(),
        Err(SchemaError::TableNameMismatch("humans".to_string()))
    );

    let mut people = table("people", IdShape::Valid, &["age".to_string()]);
    let index = people.indexes.remove("age").expect("index exists");
    people.indexes.insert("years".to_string(), index);
    let schema = DbSchema::new().table(people);
    assert!(matches!(
        schema.validate(),
        Err(SchemaError::IndexNameMismatch { .. })
    ));
}

#[test]
fn index_without_name_is_rejected() {
    let schema = DbSchema::new().table(
        table("people", IdShape::Valid, &[]).index(IndexSchema::new(
            "",
            Indexer::single(StringFieldIndex::new(|p: &Person| Some(p.name.as_str()))),
        )),
    );
    assert!(schema.validate().is_err());
}

#[test]
fn fixture_schema_opens() {
    let db = Database::new(person_schema()).expect("valid schema");
    assert_eq!(db.schema().tables.len(), 2);
}
