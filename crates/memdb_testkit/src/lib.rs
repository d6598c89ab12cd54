//! # MemDB Testkit
//!
//! Test utilities for MemDB.
//!
//! This crate provides:
//! - A sample object type with a schema exercising every built-in indexer
//! - Test database helpers
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use memdb_core::args;
//! use memdb_testkit::prelude::*;
//!
//! let db = TestDatabase::with_people(10);
//! let txn = db.txn(false);
//! assert_eq!(txn.get(PEOPLE, "id", &args![])?.count(), 10);
//! # Ok::<(), memdb_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
