//! Insert and delete.
//!
//! Every write first derives all keys it is going to touch and only then
//! mutates the index handles, so a failing indexer leaves the transaction
//! exactly as it was.

use super::read::{stores_compound_keys, PREFIX_SUFFIX};
use super::Txn;
use crate::error::{CoreError, CoreResult};
use crate::index::Arg;
use crate::schema::{IndexSchema, TableSchema, PRIMARY_INDEX};
use std::collections::HashSet;
use std::sync::Arc;

/// Key updates planned for one index.
struct IndexPlan<'a> {
    name: &'a str,
    remove: Vec<Vec<u8>>,
    insert: Vec<Vec<u8>>,
}

/// Derives the stored keys of `obj` for `index`.
fn stored_keys<T>(
    table: &str,
    name: &str,
    index: &IndexSchema<T>,
    obj: &T,
    primary_key: &[u8],
) -> CoreResult<Vec<Vec<u8>>> {
    let mut keys = index
        .indexer
        .keys_from_object(obj)
        .map_err(|err| CoreError::indexer(table, name, &err))?;
    if stores_compound_keys(index) {
        for key in &mut keys {
            key.extend_from_slice(primary_key);
        }
    }
    Ok(keys)
}

/// Derives the primary key of `obj`.
fn primary_key<T>(table: &str, schema: &TableSchema<T>, obj: &T) -> CoreResult<Vec<u8>> {
    let index = schema
        .primary()
        .ok_or_else(|| CoreError::index_not_found(table, PRIMARY_INDEX))?;
    index
        .indexer
        .keys_from_object(obj)
        .map_err(|err| CoreError::indexer(table, PRIMARY_INDEX, &err))?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::MissingPrimaryKey {
            table: table.to_string(),
        })
}

/// Pairs each object with its primary key, dropping repeats.
///
/// Multi-value indexes yield an object once per matching key.
fn distinct_objects<T>(
    table: &str,
    schema: &TableSchema<T>,
    objects: Vec<Arc<T>>,
) -> CoreResult<Vec<(Vec<u8>, Arc<T>)>> {
    let mut seen = HashSet::with_capacity(objects.len());
    let mut distinct = Vec::with_capacity(objects.len());
    for obj in objects {
        let id = primary_key(table, schema, &obj)?;
        if seen.insert(id.clone()) {
            distinct.push((id, obj));
        }
    }
    Ok(distinct)
}

impl<'db, T> Txn<'db, T> {
    /// Inserts `obj` into `table`, replacing any object with the same
    /// primary key.
    ///
    /// Every index of the table is updated. Keys the previous version had
    /// but `obj` does not are removed.
    pub fn insert(&mut self, table: &str, obj: impl Into<Arc<T>>) -> CoreResult<()> {
        self.ensure_write()?;
        let obj = obj.into();
        let db = self.db;
        let schema = db
            .schema()
            .get(table)
            .ok_or_else(|| CoreError::table_not_found(table))?;

        let id = primary_key(table, schema, &obj)?;
        let existing = self
            .readable_index(table, PRIMARY_INDEX)?
            .get(&id)
            .cloned();

        let mut plans = Vec::with_capacity(schema.indexes.len());
        for (name, index) in &schema.indexes {
            let insert = stored_keys(table, name, index, &obj, &id)?;
            if insert.is_empty() && !index.allow_missing && name != PRIMARY_INDEX {
                return Err(CoreError::MissingIndexValue {
                    table: table.to_string(),
                    index: name.clone(),
                });
            }
            let remove = match &existing {
                Some(old) => stored_keys(table, name, index, old, &id)?
                    .into_iter()
                    .filter(|key| !insert.contains(key))
                    .collect(),
                None => Vec::new(),
            };
            plans.push(IndexPlan {
                name: name.as_str(),
                remove,
                insert,
            });
        }

        for plan in plans {
            let txn = self.writable_index(table, plan.name)?;
            for key in &plan.remove {
                txn.delete(key);
            }
            for key in &plan.insert {
                txn.insert(key, Arc::clone(&obj));
            }
        }

        if let Some(changes) = &mut self.changes {
            changes.record(table, &id, existing, Some(obj));
        }
        db.stats().record_insert();
        Ok(())
    }

    /// Deletes the object stored under the primary key of `obj`.
    ///
    /// Only the primary key of `obj` matters; the stored version is what
    /// gets removed from every index. Fails with [`CoreError::NotFound`] if
    /// no such object exists.
    pub fn delete(&mut self, table: &str, obj: &T) -> CoreResult<()> {
        self.ensure_write()?;
        let db = self.db;
        let schema = db
            .schema()
            .get(table)
            .ok_or_else(|| CoreError::table_not_found(table))?;

        let id = primary_key(table, schema, obj)?;
        let existing = self
            .readable_index(table, PRIMARY_INDEX)?
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                table: table.to_string(),
            })?;

        self.remove_object(table, schema, &id, existing, None)
    }

    /// Deletes every object whose key in a `*_prefix` index starts with the
    /// prefix derived from `args`.
    ///
    /// Returns whether anything was deleted.
    pub fn delete_prefix(
        &mut self,
        table: &str,
        prefix_index: &str,
        args: &[Arg],
    ) -> CoreResult<bool> {
        self.ensure_write()?;
        if !prefix_index.ends_with(PREFIX_SUFFIX) {
            return Err(CoreError::invalid_operation(format!(
                "index name for delete_prefix must be a prefix index, got '{prefix_index}'"
            )));
        }
        let lookup = self.lookup(table, prefix_index, args)?;
        let objects: Vec<Arc<T>> = self.get(table, prefix_index, args)?.collect();
        if objects.is_empty() {
            return Ok(false);
        }

        let db = self.db;
        let schema = db
            .schema()
            .get(table)
            .ok_or_else(|| CoreError::table_not_found(table))?;
        for (id, obj) in distinct_objects(table, schema, objects)? {
            self.remove_object(table, schema, &id, obj, Some((lookup.name, &lookup.key)))?;
        }

        let removed = self
            .writable_index(table, lookup.name)?
            .delete_prefix(&lookup.key);
        Ok(removed)
    }

    /// Deletes every object [`get`](Self::get) would return for the same
    /// arguments. Returns how many distinct objects were deleted.
    pub fn delete_all(&mut self, table: &str, index: &str, args: &[Arg]) -> CoreResult<usize> {
        self.ensure_write()?;
        let objects: Vec<Arc<T>> = self.get(table, index, args)?.collect();
        let db = self.db;
        let schema = db
            .schema()
            .get(table)
            .ok_or_else(|| CoreError::table_not_found(table))?;
        let objects = distinct_objects(table, schema, objects)?;
        for (id, obj) in &objects {
            self.remove_object(table, schema, id, Arc::clone(obj), None)?;
        }
        Ok(objects.len())
    }

    /// Removes `obj` from every index of the table.
    ///
    /// With `bulk = Some((index, prefix))`, keys of that index under `prefix`
    /// are left for the caller to drop in one prefix delete.
    fn remove_object(
        &mut self,
        table: &str,
        schema: &TableSchema<T>,
        id: &[u8],
        obj: Arc<T>,
        bulk: Option<(&str, &[u8])>,
    ) -> CoreResult<()> {
        let mut plans = Vec::with_capacity(schema.indexes.len());
        for (name, index) in &schema.indexes {
            let mut remove = stored_keys(table, name, index, &obj, id)?;
            if let Some((bulk_index, prefix)) = bulk {
                if bulk_index == name {
                    remove.retain(|key| !key.starts_with(prefix));
                }
            }
            plans.push(IndexPlan {
                name: name.as_str(),
                remove,
                insert: Vec::new(),
            });
        }

        for plan in plans {
            let txn = self.writable_index(table, plan.name)?;
            for key in &plan.remove {
                txn.delete(key);
            }
        }

        if let Some(changes) = &mut self.changes {
            changes.record(table, id, Some(obj), None);
        }
        self.db.stats().record_delete();
        Ok(())
    }
}
