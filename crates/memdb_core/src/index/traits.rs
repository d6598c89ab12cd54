//! Indexer traits and query argument types.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A single query argument handed to an indexer.
///
/// Indexers decide which variants they accept; a mismatch is reported as
/// [`CoreError::InvalidArgs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// A string value.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A boolean.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A UUID.
    Uuid(Uuid),
}

impl Arg {
    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Str(_) => "string",
            Arg::Int(_) => "int",
            Arg::Uint(_) => "uint",
            Arg::Bool(_) => "bool",
            Arg::Bytes(_) => "bytes",
            Arg::Uuid(_) => "uuid",
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(value.clone())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Int(i64::from(value))
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Arg::Uint(value)
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Uint(u64::from(value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Arg::Bytes(value)
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Arg::Bytes(value.to_vec())
    }
}

impl From<Uuid> for Arg {
    fn from(value: Uuid) -> Self {
        Arg::Uuid(value)
    }
}

/// Builds an argument list from a heterogeneous list of values.
///
/// ```rust
/// use memdb_core::{args, Arg};
///
/// let a = args!["joe", 42];
/// assert_eq!(a, vec![Arg::Str("joe".into()), Arg::Int(42)]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Arg::from($value)),+]
    };
}

/// Converts query arguments into index keys.
///
/// Implemented by every indexer; the object-facing half lives in
/// [`SingleIndexer`] or [`MultiIndexer`].
pub trait ArgsIndexer: Send + Sync {
    /// Builds the exact key for the given arguments.
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>>;

    /// Builds a key prefix for the given arguments.
    ///
    /// Returns `None` when the indexer has no prefix form.
    fn prefix_from_args(&self, _args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        None
    }
}

/// Derives at most one key per object.
pub trait SingleIndexer<T>: ArgsIndexer {
    /// Returns the key for `obj`, or `None` if the object has no value.
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>>;
}

/// Derives any number of keys per object.
pub trait MultiIndexer<T>: ArgsIndexer {
    /// Returns the keys for `obj`; an empty list means no value.
    fn from_object(&self, obj: &T) -> CoreResult<Vec<Vec<u8>>>;
}

/// An indexer registered on an index schema.
pub enum Indexer<T> {
    /// One key per object.
    Single(Arc<dyn SingleIndexer<T>>),
    /// Many keys per object.
    Multi(Arc<dyn MultiIndexer<T>>),
}

impl<T> Indexer<T> {
    /// Wraps a single-value indexer.
    pub fn single(indexer: impl SingleIndexer<T> + 'static) -> Self {
        Indexer::Single(Arc::new(indexer))
    }

    /// Wraps a multi-value indexer.
    pub fn multi(indexer: impl MultiIndexer<T> + 'static) -> Self {
        Indexer::Multi(Arc::new(indexer))
    }

    /// Returns true for single-value indexers.
    pub fn is_single(&self) -> bool {
        matches!(self, Indexer::Single(_))
    }

    /// Derives all keys for `obj`. An empty list means the value is missing.
    pub fn keys_from_object(&self, obj: &T) -> CoreResult<Vec<Vec<u8>>> {
        match self {
            Indexer::Single(indexer) => Ok(indexer.from_object(obj)?.into_iter().collect()),
            Indexer::Multi(indexer) => indexer.from_object(obj),
        }
    }

    /// See [`ArgsIndexer::from_args`].
    pub fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        match self {
            Indexer::Single(indexer) => indexer.from_args(args),
            Indexer::Multi(indexer) => indexer.from_args(args),
        }
    }

    /// See [`ArgsIndexer::prefix_from_args`].
    pub fn prefix_from_args(&self, args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        match self {
            Indexer::Single(indexer) => indexer.prefix_from_args(args),
            Indexer::Multi(indexer) => indexer.prefix_from_args(args),
        }
    }
}

impl<T> Clone for Indexer<T> {
    fn clone(&self) -> Self {
        match self {
            Indexer::Single(indexer) => Indexer::Single(Arc::clone(indexer)),
            Indexer::Multi(indexer) => Indexer::Multi(Arc::clone(indexer)),
        }
    }
}

impl<T> fmt::Debug for Indexer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indexer::Single(_) => f.write_str("Indexer::Single"),
            Indexer::Multi(_) => f.write_str("Indexer::Multi"),
        }
    }
}

/// Returns the only argument, or an error if there is not exactly one.
pub(crate) fn single_arg(args: &[Arg]) -> CoreResult<&Arg> {
    match args {
        [arg] => Ok(arg),
        _ => Err(CoreError::invalid_args(format!(
            "must provide only a single argument, got {}",
            args.len()
        ))),
    }
}

pub(crate) fn unexpected_arg(expected: &str, arg: &Arg) -> CoreError {
    CoreError::invalid_args(format!("argument must be a {expected}: {arg:?}"))
}
