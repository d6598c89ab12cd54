//! String-valued indexers.
//!
//! Keys are the UTF-8 bytes of the value followed by a `0x00` terminator, so
//! a value never sorts as a prefix of a longer one in exact lookups. Prefix
//! queries drop the terminator.

use crate::error::CoreResult;
use crate::index::traits::{
    single_arg, unexpected_arg, Arg, ArgsIndexer, MultiIndexer, SingleIndexer,
};

type StrField<T> = Box<dyn Fn(&T) -> Option<&str> + Send + Sync>;
type StrSliceField<T> = Box<dyn Fn(&T) -> Vec<&str> + Send + Sync>;
type StrMapField<T> = Box<dyn Fn(&T) -> Vec<(&str, &str)> + Send + Sync>;

fn normalize(value: &str, lowercase: bool) -> String {
    if lowercase {
        value.to_lowercase()
    } else {
        value.to_string()
    }
}

fn terminated(value: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(value.len() + 1);
    key.extend_from_slice(value.as_bytes());
    key.push(0);
    key
}

fn string_arg(arg: &Arg) -> CoreResult<&str> {
    match arg {
        Arg::Str(s) => Ok(s),
        other => Err(unexpected_arg("string", other)),
    }
}

/// Indexes a string field of an object.
///
/// Empty strings count as a missing value.
pub struct StringFieldIndex<T> {
    field: StrField<T>,
    lowercase: bool,
}

impl<T> StringFieldIndex<T> {
    /// Creates an index over the string returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Option<&str> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
            lowercase: false,
        }
    }

    /// Folds values and arguments to lowercase.
    #[must_use]
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    fn key(&self, value: &str) -> Vec<u8> {
        terminated(&normalize(value, self.lowercase))
    }
}

impl<T> ArgsIndexer for StringFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        let value = string_arg(single_arg(args)?)?;
        Ok(self.key(value))
    }

    fn prefix_from_args(&self, args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        Some(self.from_args(args).map(|mut key| {
            key.pop();
            key
        }))
    }
}

impl<T> SingleIndexer<T> for StringFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok((self.field)(obj)
            .filter(|value| !value.is_empty())
            .map(|value| self.key(value)))
    }
}

/// Indexes every element of a string list field.
///
/// Empty elements are skipped and duplicates collapse into one key.
pub struct StringSliceFieldIndex<T> {
    field: StrSliceField<T>,
    lowercase: bool,
}

impl<T> StringSliceFieldIndex<T> {
    /// Creates an index over the strings returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Vec<&str> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
            lowercase: false,
        }
    }

    /// Folds values and arguments to lowercase.
    #[must_use]
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }
}

impl<T> ArgsIndexer for StringSliceFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        let value = string_arg(single_arg(args)?)?;
        Ok(terminated(&normalize(value, self.lowercase)))
    }

    fn prefix_from_args(&self, args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        Some(self.from_args(args).map(|mut key| {
            key.pop();
            key
        }))
    }
}

impl<T> MultiIndexer<T> for StringSliceFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Vec<Vec<u8>>> {
        let mut keys: Vec<Vec<u8>> = (self.field)(obj)
            .into_iter()
            .filter(|value| !value.is_empty())
            .map(|value| terminated(&normalize(value, self.lowercase)))
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

/// Indexes the entries of a string-to-string map field.
///
/// Each entry produces the key `key\0value\0`. Querying with one argument
/// matches every entry with that map key.
pub struct StringMapFieldIndex<T> {
    field: StrMapField<T>,
    lowercase: bool,
}

impl<T> StringMapFieldIndex<T> {
    /// Creates an index over the entries returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Vec<(&str, &str)> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
            lowercase: false,
        }
    }

    /// Folds map keys, values and arguments to lowercase.
    #[must_use]
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    fn entry_key(&self, key: &str, value: &str) -> Vec<u8> {
        let mut out = terminated(&normalize(key, self.lowercase));
        out.extend(terminated(&normalize(value, self.lowercase)));
        out
    }
}

impl<T> ArgsIndexer for StringMapFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        match args {
            [key] => Ok(terminated(&normalize(string_arg(key)?, self.lowercase))),
            [key, value] => Ok(self.entry_key(string_arg(key)?, string_arg(value)?)),
            _ => Err(crate::error::CoreError::invalid_args(format!(
                "must provide one or two arguments, got {}",
                args.len()
            ))),
        }
    }
}

impl<T> MultiIndexer<T> for StringMapFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Vec<Vec<u8>>> {
        let mut keys: Vec<Vec<u8>> = (self.field)(obj)
            .into_iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| self.entry_key(key, value))
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use std::collections::BTreeMap;

    struct Obj {
        name: String,
        tags: Vec<String>,
        meta: BTreeMap<String, String>,
    }

    fn obj() -> Obj {
        Obj {
            name: "Armon".into(),
            tags: vec!["b".into(), "".into(), "a".into(), "b".into()],
            meta: BTreeMap::from([("role".to_string(), "Admin".to_string())]),
        }
    }

    #[test]
    fn string_field_from_object() {
        let index = StringFieldIndex::new(|o: &Obj| Some(o.name.as_str()));
        assert_eq!(index.from_object(&obj()).unwrap(), Some(b"Armon\0".to_vec()));

        let lower = StringFieldIndex::new(|o: &Obj| Some(o.name.as_str())).lowercase();
        assert_eq!(lower.from_object(&obj()).unwrap(), Some(b"armon\0".to_vec()));
    }

    #[test]
    fn string_field_empty_is_missing() {
        let index = StringFieldIndex::new(|_: &Obj| Some(""));
        assert_eq!(index.from_object(&obj()).unwrap(), None);
        let none = StringFieldIndex::new(|_: &Obj| None);
        assert_eq!(none.from_object(&obj()).unwrap(), None);
    }

    #[test]
    fn string_field_args() {
        let index = StringFieldIndex::new(|o: &Obj| Some(o.name.as_str())).lowercase();
        assert_eq!(index.from_args(&args!["FoO"]).unwrap(), b"foo\0".to_vec());
        assert_eq!(
            index.prefix_from_args(&args!["Fo"]).unwrap().unwrap(),
            b"fo".to_vec()
        );
        assert!(index.from_args(&args![1]).is_err());
        assert!(index.from_args(&args!["a", "b"]).is_err());
    }

    #[test]
    fn string_slice_skips_empty_and_duplicates() {
        let index =
            StringSliceFieldIndex::new(|o: &Obj| o.tags.iter().map(String::as_str).collect());
        assert_eq!(
            index.from_object(&obj()).unwrap(),
            vec![b"a\0".to_vec(), b"b\0".to_vec()]
        );

        let empty = StringSliceFieldIndex::new(|_: &Obj| Vec::new());
        assert!(empty.from_object(&obj()).unwrap().is_empty());
    }

    #[test]
    fn string_map_entries() {
        let index = StringMapFieldIndex::new(|o: &Obj| {
            o.meta.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
        })
        .lowercase();
        assert_eq!(
            index.from_object(&obj()).unwrap(),
            vec![b"role\0admin\0".to_vec()]
        );
        assert_eq!(index.from_args(&args!["role"]).unwrap(), b"role\0".to_vec());
        assert_eq!(
            index.from_args(&args!["role", "ADMIN"]).unwrap(),
            b"role\0admin\0".to_vec()
        );
        assert!(index.from_args(&args![]).is_err());
    }
}
