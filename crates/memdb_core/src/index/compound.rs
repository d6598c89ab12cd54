//! Indexers that concatenate the keys of several sub-indexers.

use crate::error::{CoreError, CoreResult};
use crate::index::traits::{Arg, ArgsIndexer, Indexer, MultiIndexer, SingleIndexer};
use std::sync::Arc;

/// Builds the exact key for `args` against `parts`, one argument per part.
fn compound_args<P>(
    parts: &[P],
    args: &[Arg],
    from_args: impl Fn(&P, &[Arg]) -> CoreResult<Vec<u8>>,
) -> CoreResult<Vec<u8>> {
    if args.len() != parts.len() {
        return Err(CoreError::invalid_args(format!(
            "wrong number of arguments: expected {}, got {}",
            parts.len(),
            args.len()
        )));
    }
    let mut out = Vec::new();
    for (part, arg) in parts.iter().zip(args) {
        out.extend(from_args(part, std::slice::from_ref(arg))?);
    }
    Ok(out)
}

/// Builds a key prefix from the first `args.len()` parts. The last supplied
/// argument goes through the part's prefix form.
fn compound_prefix<P>(
    parts: &[P],
    args: &[Arg],
    from_args: impl Fn(&P, &[Arg]) -> CoreResult<Vec<u8>>,
    prefix_from_args: impl Fn(&P, &[Arg]) -> Option<CoreResult<Vec<u8>>>,
) -> CoreResult<Vec<u8>> {
    if args.len() > parts.len() {
        return Err(CoreError::invalid_args(format!(
            "more arguments than index parts: {} > {}",
            args.len(),
            parts.len()
        )));
    }
    let mut out = Vec::new();
    for (i, (part, arg)) in parts.iter().zip(args).enumerate() {
        let arg = std::slice::from_ref(arg);
        if i + 1 < args.len() {
            out.extend(from_args(part, arg)?);
        } else {
            let prefix = prefix_from_args(part, arg).ok_or_else(|| {
                CoreError::invalid_args(format!("sub-index {i} does not support prefix scanning"))
            })?;
            out.extend(prefix?);
        }
    }
    Ok(out)
}

/// Concatenates the keys of several single-value indexers.
///
/// A missing sub-value makes the whole key missing, unless `allow_missing`
/// is set, in which case the key is truncated at the first missing part.
pub struct CompoundIndex<T> {
    parts: Vec<Arc<dyn SingleIndexer<T>>>,
    allow_missing: bool,
}

impl<T> CompoundIndex<T> {
    /// Creates an empty compound index; add parts with [`Self::part`].
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            allow_missing: false,
        }
    }

    /// Appends a sub-indexer.
    #[must_use]
    pub fn part(mut self, indexer: impl SingleIndexer<T> + 'static) -> Self {
        self.parts.push(Arc::new(indexer));
        self
    }

    /// Keeps the leading parts when a later part is missing.
    #[must_use]
    pub fn allow_missing(mut self) -> Self {
        self.allow_missing = true;
        self
    }
}

impl<T> Default for CompoundIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArgsIndexer for CompoundIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        compound_args(&self.parts, args, |p, a| p.from_args(a))
    }

    fn prefix_from_args(&self, args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        Some(compound_prefix(
            &self.parts,
            args,
            |p, a| p.from_args(a),
            |p, a| p.prefix_from_args(a),
        ))
    }
}

impl<T> SingleIndexer<T> for CompoundIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        let mut out = Vec::new();
        for part in &self.parts {
            match part.from_object(obj)? {
                Some(key) => out.extend(key),
                None if self.allow_missing => break,
                None => return Ok(None),
            }
        }
        Ok((!out.is_empty()).then_some(out))
    }
}

/// Concatenates the keys of single- or multi-value indexers.
///
/// An object yields the cartesian product of its part keys.
pub struct CompoundMultiIndex<T> {
    parts: Vec<Indexer<T>>,
    allow_missing: bool,
}

impl<T> CompoundMultiIndex<T> {
    /// Creates an empty compound index; add parts with [`Self::part`].
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            allow_missing: false,
        }
    }

    /// Appends a sub-indexer.
    #[must_use]
    pub fn part(mut self, indexer: Indexer<T>) -> Self {
        self.parts.push(indexer);
        self
    }

    /// Keeps the leading parts when a later part is missing.
    #[must_use]
    pub fn allow_missing(mut self) -> Self {
        self.allow_missing = true;
        self
    }
}

impl<T> Default for CompoundMultiIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArgsIndexer for CompoundMultiIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        compound_args(&self.parts, args, Indexer::from_args)
    }

    fn prefix_from_args(&self, args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        Some(compound_prefix(
            &self.parts,
            args,
            Indexer::from_args,
            Indexer::prefix_from_args,
        ))
    }
}

impl<T> MultiIndexer<T> for CompoundMultiIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Vec<Vec<u8>>> {
        let mut keys: Vec<Vec<u8>> = vec![Vec::new()];
        for part in &self.parts {
            let values = part.keys_from_object(obj)?;
            if values.is_empty() {
                if self.allow_missing {
                    break;
                }
                return Ok(Vec::new());
            }
            keys = keys
                .iter()
                .flat_map(|head| {
                    values.iter().map(move |value| {
                        let mut key = head.clone();
                        key.extend_from_slice(value);
                        key
                    })
                })
                .collect();
        }
        keys.retain(|key| !key.is_empty());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::index::{IntFieldIndex, StringFieldIndex, StringSliceFieldIndex};

    struct Obj {
        first: String,
        last: String,
        age: Option<i64>,
        tags: Vec<String>,
    }

    fn obj(first: &str, last: &str) -> Obj {
        Obj {
            first: first.into(),
            last: last.into(),
            age: None,
            tags: vec!["x".into(), "y".into()],
        }
    }

    fn name_index() -> CompoundIndex<Obj> {
        CompoundIndex::new()
            .part(StringFieldIndex::new(|o: &Obj| Some(o.first.as_str())))
            .part(StringFieldIndex::new(|o: &Obj| Some(o.last.as_str())))
    }

    #[test]
    fn concatenates_parts() {
        let index = name_index();
        assert_eq!(
            index.from_object(&obj("a", "b")).unwrap(),
            Some(b"a\0b\0".to_vec())
        );
        assert_eq!(index.from_args(&args!["a", "b"]).unwrap(), b"a\0b\0".to_vec());
        assert!(index.from_args(&args!["a"]).is_err());
    }

    #[test]
    fn missing_part() {
        let index = name_index();
        assert_eq!(index.from_object(&obj("a", "")).unwrap(), None);

        let lenient = name_index().allow_missing();
        assert_eq!(
            lenient.from_object(&obj("a", "")).unwrap(),
            Some(b"a\0".to_vec())
        );
        assert_eq!(lenient.from_object(&obj("", "b")).unwrap(), None);
    }

    #[test]
    fn prefix_with_fewer_args() {
        let index = name_index();
        assert_eq!(
            index.prefix_from_args(&args!["a"]).unwrap().unwrap(),
            b"a".to_vec()
        );
        assert_eq!(
            index.prefix_from_args(&args!["a", "b"]).unwrap().unwrap(),
            b"a\0b".to_vec()
        );
        assert!(index.prefix_from_args(&args!["a", "b", "c"]).unwrap().is_err());
    }

    #[test]
    fn prefix_requires_prefix_capable_last_part() {
        let index = CompoundIndex::new()
            .part(StringFieldIndex::new(|o: &Obj| Some(o.first.as_str())))
            .part(IntFieldIndex::new(|o: &Obj| o.age));
        assert!(index.prefix_from_args(&args!["a"]).unwrap().is_ok());
        assert!(index.prefix_from_args(&args!["a", 3]).unwrap().is_err());
    }

    #[test]
    fn multi_builds_cartesian_product() {
        let index = CompoundMultiIndex::new()
            .part(Indexer::single(StringFieldIndex::new(|o: &Obj| Some(o.first.as_str()))))
            .part(Indexer::multi(StringSliceFieldIndex::new(|o: &Obj| {
                o.tags.iter().map(String::as_str).collect()
            })));
        let keys = index.from_object(&obj("a", "b")).unwrap();
        assert_eq!(keys, vec![b"a\0x\0".to_vec(), b"a\0y\0".to_vec()]);
        assert_eq!(index.from_args(&args!["a", "y"]).unwrap(), b"a\0y\0".to_vec());
    }

    #[test]
    fn multi_missing_part() {
        let mut o = obj("a", "b");
        o.tags.clear();
        let strict = CompoundMultiIndex::new()
            .part(Indexer::single(StringFieldIndex::new(|o: &Obj| Some(o.first.as_str()))))
            .part(Indexer::multi(StringSliceFieldIndex::new(|o: &Obj| {
                o.tags.iter().map(String::as_str).collect()
            })));
        assert!(strict.from_object(&o).unwrap().is_empty());

        let lenient = strict.allow_missing();
        assert_eq!(lenient.from_object(&o).unwrap(), vec![b"a\0".to_vec()]);
    }
}
