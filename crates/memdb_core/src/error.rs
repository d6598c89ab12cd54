//! Error types for MemDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in MemDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The schema failed validation.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// Table is not declared in the schema.
    #[error("invalid table '{table}'")]
    TableNotFound {
        /// Name of the table.
        table: String,
    },

    /// Index is not declared on the table.
    #[error("invalid index '{index}' on table '{table}'")]
    IndexNotFound {
        /// Name of the table.
        table: String,
        /// Name of the index.
        index: String,
    },

    /// The object to delete is not stored in the table.
    #[error("not found in table '{table}'")]
    NotFound {
        /// Name of the table.
        table: String,
    },

    /// The primary key could not be derived from an object.
    #[error("object missing primary index in table '{table}'")]
    MissingPrimaryKey {
        /// Name of the table.
        table: String,
    },

    /// An index produced no value and does not allow missing values.
    #[error("missing value for index '{index}' in table '{table}'")]
    MissingIndexValue {
        /// Name of the table.
        table: String,
        /// Name of the index.
        index: String,
    },

    /// An indexer failed to derive keys from an object.
    #[error("failed to build index '{index}' in table '{table}': {message}")]
    Indexer {
        /// Name of the table.
        table: String,
        /// Name of the index.
        index: String,
        /// Description of the failure.
        message: String,
    },

    /// An indexer rejected an object field value.
    #[error("invalid index value: {message}")]
    InvalidValue {
        /// Description of the problem.
        message: String,
    },

    /// Query arguments do not fit the indexer.
    #[error("invalid index arguments: {message}")]
    InvalidArgs {
        /// Description of the problem.
        message: String,
    },

    /// The index cannot be queried by prefix.
    #[error("index '{index}' does not support prefix scanning")]
    PrefixNotSupported {
        /// Name of the index.
        index: String,
    },

    /// A mutation was attempted in a read transaction.
    #[error("cannot modify the database in a read-only transaction")]
    ReadOnlyTransaction,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a table not found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates an index not found error.
    pub fn index_not_found(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexNotFound {
            table: table.into(),
            index: index.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Wraps an indexer failure with the table and index it happened on.
    pub(crate) fn indexer(table: &str, index: &str, source: &CoreError) -> Self {
        Self::Indexer {
            table: table.to_string(),
            index: index.to_string(),
            message: source.to_string(),
        }
    }
}

/// Structural problems found while validating a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema declares no tables.
    #[error("schema has no tables defined")]
    NoTables,

    /// A table is registered under a key other than its name.
    #[error("table name mis-match for '{0}'")]
    TableNameMismatch(String),

    /// A table has an empty name.
    #[error("missing table name")]
    MissingTableName,

    /// A table declares no indexes.
    #[error("missing table indexes for '{0}'")]
    NoIndexes(String),

    /// A table has no `id` index.
    #[error("table {0:?}: must have id index")]
    MissingIdIndex(String),

    /// The `id` index is not unique.
    #[error("table {0:?}: id index must be unique")]
    IdNotUnique(String),

    /// The `id` index is multi-value.
    #[error("table {0:?}: id index must be a single-value indexer")]
    IdNotSingle(String),

    /// An index is registered under a key other than its name.
    #[error("table {table:?}: index name mis-match for '{index}'")]
    IndexNameMismatch {
        /// Table declaring the index.
        table: String,
        /// Map key the index was registered under.
        index: String,
    },

    /// An index has an empty name.
    #[error("table {0:?}: missing index name")]
    MissingIndexName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_converts() {
        let err: CoreError = SchemaError::NoTables.into();
        assert!(matches!(err, CoreError::Schema(SchemaError::NoTables)));
        assert_eq!(err.to_string(), "invalid schema: schema has no tables defined");
    }

    #[test]
    fn indexer_error_keeps_context() {
        let source = CoreError::invalid_value("bad field");
        let err = CoreError::indexer("people", "name", &source);
        assert_eq!(
            err.to_string(),
            "failed to build index 'name' in table 'people': invalid index value: bad field"
        );
    }
}
