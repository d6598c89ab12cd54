//! Database entry point.

use crate::config::Config;
use crate::error::CoreResult;
use crate::schema::DbSchema;
use crate::stats::DatabaseStats;
use crate::transaction::Txn;
use arc_swap::ArcSwap;
use memdb_tree::Tree;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tree holding the objects of one index, keyed by index key.
pub(crate) type IndexTree<T> = Tree<Arc<T>>;

/// Tree of all index trees, keyed by [`index_path`].
pub(crate) type RootTree<T> = Tree<IndexTree<T>>;

/// Key of an index tree in the root tree.
pub(crate) fn index_path(table: &str, index: &str) -> Vec<u8> {
    let mut path = Vec::with_capacity(table.len() + index.len() + 1);
    path.extend_from_slice(table.as_bytes());
    path.push(b'.');
    path.extend_from_slice(index.as_bytes());
    path
}

/// An in-memory database of objects of type `T`.
///
/// Readers never block: a read transaction captures the current root and
/// keeps seeing it no matter what commits afterwards. Writers are serialized
/// by a single lock.
///
/// # Example
///
/// ```rust
/// use memdb_core::{args, Database, DbSchema, IndexSchema, Indexer, StringFieldIndex, TableSchema};
///
/// struct Person {
///     email: String,
/// }
///
/// let schema = DbSchema::new().table(
///     TableSchema::new("person").index(
///         IndexSchema::new(
///             "id",
///             Indexer::single(StringFieldIndex::new(|p: &Person| Some(p.email.as_str()))),
///         )
///         .unique(),
///     ),
/// );
/// let db = Database::new(schema)?;
///
/// let mut txn = db.txn(true);
/// txn.insert("person", Person { email: "joe@example.com".into() })?;
/// txn.commit()?;
///
/// let txn = db.txn(false);
/// let joe = txn.first("person", "id", &args!["joe@example.com"])?;
/// assert!(joe.is_some());
/// # Ok::<(), memdb_core::CoreError>(())
/// ```
pub struct Database<T> {
    schema: Arc<DbSchema<T>>,
    root: ArcSwap<RootTree<T>>,
    writer: Mutex<()>,
    primary: bool,
    config: Config,
    stats: DatabaseStats,
}

impl<T> Database<T> {
    /// Creates a database with the default configuration.
    pub fn new(schema: DbSchema<T>) -> CoreResult<Self> {
        Self::with_config(schema, Config::default())
    }

    /// Creates a database with a custom configuration.
    ///
    /// Fails if the schema does not validate.
    pub fn with_config(schema: DbSchema<T>, config: Config) -> CoreResult<Self> {
        schema.validate()?;

        let mut root = RootTree::new().txn();
        for (table, table_schema) in &schema.tables {
            for index in table_schema.indexes.keys() {
                root.insert(&index_path(table, index), IndexTree::new());
            }
        }
        let root = root.commit();

        tracing::debug!(
            tables = schema.tables.len(),
            indexes = root.len(),
            "database initialized"
        );

        Ok(Self {
            schema: Arc::new(schema),
            root: ArcSwap::new(Arc::new(root)),
            writer: Mutex::new(()),
            primary: true,
            config,
            stats: DatabaseStats::new(),
        })
    }

    /// Starts a transaction.
    ///
    /// A write transaction holds the writer lock until it is committed,
    /// aborted or dropped, so starting a second one on the same thread
    /// deadlocks.
    pub fn txn(&self, write: bool) -> Txn<'_, T> {
        self.stats.record_txn(write);
        if !write {
            return Txn::read(self, self.root.load_full());
        }

        let started = Instant::now();
        let guard = self.writer.lock();
        let waited = started.elapsed();
        if waited >= self.config.writer_wait_warning {
            tracing::warn!(waited_ms = duration_ms(waited), "slow writer lock acquisition");
        }

        // Load after taking the lock so the transaction builds on the latest commit.
        Txn::write(self, self.root.load_full(), guard)
    }

    /// Returns an independent database that starts from the current state.
    ///
    /// The snapshot has its own writer lock and statistics; writes to either
    /// side are invisible to the other. Commits on a snapshot do not fire
    /// watch channels.
    pub fn snapshot(&self) -> Self {
        tracing::debug!("database snapshot taken");
        Self {
            schema: Arc::clone(&self.schema),
            root: ArcSwap::new(self.root.load_full()),
            writer: Mutex::new(()),
            primary: false,
            config: self.config.clone(),
            stats: DatabaseStats::new(),
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &DbSchema<T> {
        &self.schema
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the statistics.
    pub fn stats(&self) -> &DatabaseStats {
        &self.stats
    }

    /// Default limit for [`WatchSet::add_with_limit`](crate::WatchSet::add_with_limit).
    pub fn watch_limit(&self) -> usize {
        self.config.watch_limit
    }

    /// True for databases created with [`new`](Self::new) or
    /// [`with_config`](Self::with_config), false for snapshots.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub(crate) fn publish(&self, root: RootTree<T>) {
        self.root.store(Arc::new(root));
    }
}

impl<T> fmt::Debug for Database<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.schema.tables.keys().collect::<Vec<_>>())
            .field("primary", &self.primary)
            .field("config", &self.config)
            .finish()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, SchemaError};
    use crate::index::{Indexer, StringFieldIndex};
    use crate::schema::{IndexSchema, TableSchema};

    fn schema() -> DbSchema<String> {
        DbSchema::new().table(
            TableSchema::new("main").index(
                IndexSchema::new(
                    "id",
                    Indexer::single(StringFieldIndex::new(|s: &String| Some(s.as_str()))),
                )
                .unique(),
            ),
        )
    }

    #[test]
    fn index_path_format() {
        assert_eq!(index_path("people", "id"), b"people.id".to_vec());
    }

    #[test]
    fn creates_index_trees() {
        let db = Database::new(schema()).unwrap();
        let root = db.root.load_full();
        assert_eq!(root.len(), 1);
        assert!(root.get(b"main.id").is_some());
        assert!(db.is_primary());
    }

    #[test]
    fn rejects_invalid_schema() {
        let err = Database::<String>::new(DbSchema::new()).unwrap_err();
        assert!(matches!(err, CoreError::Schema(SchemaError::NoTables)));
    }

    #[test]
    fn config_is_applied() {
        let config = Config::new().watch_limit(8);
        let db = Database::with_config(schema(), config).unwrap();
        assert_eq!(db.watch_limit(), 8);
    }

    #[test]
    fn snapshot_is_not_primary() {
        let db = Database::new(schema()).unwrap();
        let snap = db.snapshot();
        assert!(!snap.is_primary());
        assert_eq!(snap.stats().read_txns(), 0);
    }

    #[test]
    fn txn_counts() {
        let db = Database::new(schema()).unwrap();
        drop(db.txn(false));
        drop(db.txn(true));
        assert_eq!(db.stats().read_txns(), 1);
        assert_eq!(db.stats().write_txns(), 1);
    }
}
