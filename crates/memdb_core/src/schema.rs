//! Database, table and index schemas.
//!
//! A schema is fixed when the database is created. Every table must have a
//! unique, single-value index named [`PRIMARY_INDEX`]; its key is the
//! object's identity.

use crate::error::SchemaError;
use crate::index::Indexer;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the mandatory primary index.
pub const PRIMARY_INDEX: &str = "id";

/// Schema of a whole database.
pub struct DbSchema<T> {
    /// Tables keyed by name.
    pub tables: BTreeMap<String, TableSchema<T>>,
}

impl<T> DbSchema<T> {
    /// Creates a schema with no tables.
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Adds a table keyed by its own name.
    #[must_use]
    pub fn table(mut self, table: TableSchema<T>) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Looks up a table.
    pub fn get(&self, name: &str) -> Option<&TableSchema<T>> {
        self.tables.get(name)
    }

    /// Checks the schema for structural problems.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.tables.is_empty() {
            return Err(SchemaError::NoTables);
        }
        for (name, table) in &self.tables {
            if *name != table.name {
                return Err(SchemaError::TableNameMismatch(name.clone()));
            }
            table.validate()?;
        }
        Ok(())
    }
}

impl<T> Default for DbSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for DbSchema<T> {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
        }
    }
}

impl<T> fmt::Debug for DbSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSchema")
            .field("tables", &self.tables)
            .finish()
    }
}

/// Schema of a single table.
pub struct TableSchema<T> {
    /// Table name.
    pub name: String,
    /// Indexes keyed by name.
    pub indexes: BTreeMap<String, IndexSchema<T>>,
}

impl<T> TableSchema<T> {
    /// Creates a table with no indexes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexes: BTreeMap::new(),
        }
    }

    /// Adds an index keyed by its own name.
    #[must_use]
    pub fn index(mut self, index: IndexSchema<T>) -> Self {
        self.indexes.insert(index.name.clone(), index);
        self
    }

    /// Returns the primary index, if declared.
    pub fn primary(&self) -> Option<&IndexSchema<T>> {
        self.indexes.get(PRIMARY_INDEX)
    }

    /// Checks the table for structural problems.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::MissingTableName);
        }
        if self.indexes.is_empty() {
            return Err(SchemaError::NoIndexes(self.name.clone()));
        }
        let id = self
            .primary()
            .ok_or_else(|| SchemaError::MissingIdIndex(self.name.clone()))?;
        if !id.unique {
            return Err(SchemaError::IdNotUnique(self.name.clone()));
        }
        if !id.indexer.is_single() {
            return Err(SchemaError::IdNotSingle(self.name.clone()));
        }
        for (name, index) in &self.indexes {
            if *name != index.name {
                return Err(SchemaError::IndexNameMismatch {
                    table: self.name.clone(),
                    index: name.clone(),
                });
            }
            if index.name.is_empty() {
                return Err(SchemaError::MissingIndexName(self.name.clone()));
            }
        }
        Ok(())
    }
}

impl<T> Clone for TableSchema<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            indexes: self.indexes.clone(),
        }
    }
}

impl<T> fmt::Debug for TableSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSchema")
            .field("name", &self.name)
            .field("indexes", &self.indexes)
            .finish()
    }
}

/// Schema of a single index.
pub struct IndexSchema<T> {
    /// Index name.
    pub name: String,
    /// Objects without a value are left out of the index instead of failing.
    ///
    /// Ignored for the primary index.
    pub allow_missing: bool,
    /// At most one object per key.
    pub unique: bool,
    /// Key derivation.
    pub indexer: Indexer<T>,
}

impl<T> IndexSchema<T> {
    /// Creates a non-unique index that requires a value.
    pub fn new(name: impl Into<String>, indexer: Indexer<T>) -> Self {
        Self {
            name: name.into(),
            allow_missing: false,
            unique: false,
            indexer,
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Allows objects without a value.
    #[must_use]
    pub fn allow_missing(mut self) -> Self {
        self.allow_missing = true;
        self
    }
}

impl<T> Clone for IndexSchema<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            allow_missing: self.allow_missing,
            unique: self.unique,
            indexer: self.indexer.clone(),
        }
    }
}

impl<T> fmt::Debug for IndexSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSchema")
            .field("name", &self.name)
            .field("allow_missing", &self.allow_missing)
            .field("unique", &self.unique)
            .field("indexer", &self.indexer)
            .finish()
    }
}
