//! Indexers turn objects and query arguments into index keys.
//!
//! Every index of a table is backed by one [`Indexer`]. Keys are plain byte
//! strings; their lexicographic order is the index order.
//!
//! # Built-in Indexers
//!
//! - [`StringFieldIndex`], [`StringSliceFieldIndex`], [`StringMapFieldIndex`]
//! - [`IntFieldIndex`], [`UintFieldIndex`]
//! - [`BoolFieldIndex`], [`ConditionalIndex`], [`FieldSetIndex`]
//! - [`UuidFieldIndex`]
//! - [`CompoundIndex`], [`CompoundMultiIndex`]
//!
//! Custom indexers implement [`ArgsIndexer`] plus either [`SingleIndexer`]
//! or [`MultiIndexer`].

mod boolean;
mod compound;
mod int;
mod string;
mod traits;
mod uuid;

pub use self::boolean::{BoolFieldIndex, ConditionalIndex, FieldSetIndex};
pub use self::compound::{CompoundIndex, CompoundMultiIndex};
pub use self::int::{IntFieldIndex, UintFieldIndex};
pub use self::string::{StringFieldIndex, StringMapFieldIndex, StringSliceFieldIndex};
pub use self::traits::{Arg, ArgsIndexer, Indexer, MultiIndexer, SingleIndexer};
pub use self::uuid::UuidFieldIndex;
