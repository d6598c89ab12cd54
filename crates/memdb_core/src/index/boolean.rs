//! Boolean and predicate indexers.
//!
//! All of these produce the one-byte keys `0x00` (false) and `0x01` (true)
//! and are queried with a single boolean argument.

use crate::error::CoreResult;
use crate::index::traits::{single_arg, unexpected_arg, Arg, ArgsIndexer, SingleIndexer};

fn encode(value: bool) -> Vec<u8> {
    vec![u8::from(value)]
}

fn bool_args(args: &[Arg]) -> CoreResult<Vec<u8>> {
    match single_arg(args)? {
        Arg::Bool(v) => Ok(encode(*v)),
        other => Err(unexpected_arg("bool", other)),
    }
}

/// Indexes a boolean field.
pub struct BoolFieldIndex<T> {
    field: Box<dyn Fn(&T) -> Option<bool> + Send + Sync>,
}

impl<T> BoolFieldIndex<T> {
    /// Creates an index over the boolean returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Option<bool> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
        }
    }
}

impl<T> ArgsIndexer for BoolFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        bool_args(args)
    }
}

impl<T> SingleIndexer<T> for BoolFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok((self.field)(obj).map(encode))
    }
}

/// Indexes the outcome of a fallible predicate over the object.
///
/// Every object gets a key; a predicate error aborts the write.
pub struct ConditionalIndex<T> {
    condition: Box<dyn Fn(&T) -> CoreResult<bool> + Send + Sync>,
}

impl<T> ConditionalIndex<T> {
    /// Creates an index over `condition`.
    pub fn new<F>(condition: F) -> Self
    where
        F: Fn(&T) -> CoreResult<bool> + Send + Sync + 'static,
    {
        Self {
            condition: Box::new(condition),
        }
    }
}

impl<T> ArgsIndexer for ConditionalIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        bool_args(args)
    }
}

impl<T> SingleIndexer<T> for ConditionalIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok(Some(encode((self.condition)(obj)?)))
    }
}

/// Indexes whether an optional field is set.
pub struct FieldSetIndex<T> {
    is_set: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> FieldSetIndex<T> {
    /// Creates an index over `is_set`.
    pub fn new<F>(is_set: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            is_set: Box::new(is_set),
        }
    }
}

impl<T> ArgsIndexer for FieldSetIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        bool_args(args)
    }
}

impl<T> SingleIndexer<T> for FieldSetIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok(Some(encode((self.is_set)(obj))))
    }
}
