//! # MemDB Core
//!
//! Schema-driven in-memory database built on the persistent trees of
//! `memdb_tree`.
//!
//! This crate provides:
//! - Schemas of tables and indexes, validated once at construction
//! - Indexers that derive binary keys from objects and query arguments
//! - Snapshot-isolated read transactions that never block
//! - A single serialized writer that updates all indexes atomically
//! - Per-transaction change logs and watch channels for change notification

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod changes;
mod config;
mod database;
mod error;
pub mod index;
mod iterator;
mod schema;
mod stats;
mod transaction;
mod watch;

pub use changes::{Change, Changes};
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult, SchemaError};
pub use index::{
    Arg, ArgsIndexer, BoolFieldIndex, CompoundIndex, CompoundMultiIndex, ConditionalIndex,
    FieldSetIndex, Indexer, IntFieldIndex, MultiIndexer, SingleIndexer, StringFieldIndex,
    StringMapFieldIndex, StringSliceFieldIndex, UintFieldIndex, UuidFieldIndex,
};
pub use iterator::{FilterIterator, IndexIterator, ResultIterator};
pub use memdb_tree::WatchCh;
pub use schema::{DbSchema, IndexSchema, TableSchema, PRIMARY_INDEX};
pub use stats::{DatabaseStats, StatsSnapshot};
pub use transaction::{Txn, TxnState, PREFIX_SUFFIX};
pub use watch::WatchSet;
