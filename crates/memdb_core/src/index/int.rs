//! Integer indexers.
//!
//! Values are encoded as 8 big-endian bytes. Signed values get their sign bit
//! flipped so that byte order matches numeric order across zero.

use crate::error::{CoreError, CoreResult};
use crate::index::traits::{single_arg, unexpected_arg, Arg, ArgsIndexer, SingleIndexer};

const SIGN_BIT: u64 = 1 << 63;

fn encode_int(value: i64) -> Vec<u8> {
    ((value as u64) ^ SIGN_BIT).to_be_bytes().to_vec()
}

fn encode_uint(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Indexes a signed integer field.
pub struct IntFieldIndex<T> {
    field: Box<dyn Fn(&T) -> Option<i64> + Send + Sync>,
}

impl<T> IntFieldIndex<T> {
    /// Creates an index over the integer returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Option<i64> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
        }
    }
}

impl<T> ArgsIndexer for IntFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        let value = match single_arg(args)? {
            Arg::Int(v) => *v,
            Arg::Uint(v) => i64::try_from(*v)
                .map_err(|_| CoreError::invalid_args(format!("{v} overflows a signed index")))?,
            other => return Err(unexpected_arg("integer", other)),
        };
        Ok(encode_int(value))
    }
}

impl<T> SingleIndexer<T> for IntFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok((self.field)(obj).map(encode_int))
    }
}

/// Indexes an unsigned integer field.
pub struct UintFieldIndex<T> {
    field: Box<dyn Fn(&T) -> Option<u64> + Send + Sync>,
}

impl<T> UintFieldIndex<T> {
    /// Creates an index over the integer returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Option<u64> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
        }
    }
}

impl<T> ArgsIndexer for UintFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        let value = match single_arg(args)? {
            Arg::Uint(v) => *v,
            Arg::Int(v) => u64::try_from(*v)
                .map_err(|_| CoreError::invalid_args(format!("{v} is negative")))?,
            other => return Err(unexpected_arg("unsigned integer", other)),
        };
        Ok(encode_uint(value))
    }
}

impl<T> SingleIndexer<T> for UintFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok((self.field)(obj).map(encode_uint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use proptest::prelude::*;

    #[test]
    fn int_args_accept_both_signs() {
        let index = IntFieldIndex::new(|v: &i64| Some(*v));
        assert_eq!(index.from_args(&args![5_i64]).unwrap(), encode_int(5));
        assert_eq!(index.from_args(&args![5_u64]).unwrap(), encode_int(5));
        assert!(index.from_args(&args![u64::MAX]).is_err());
        assert!(index.from_args(&args!["5"]).is_err());
    }

    #[test]
    fn uint_rejects_negative() {
        let index = UintFieldIndex::new(|v: &u64| Some(*v));
        assert!(index.from_args(&args![-1_i64]).is_err());
        assert_eq!(index.from_args(&args![7_i64]).unwrap(), encode_uint(7));
    }

    #[test]
    fn missing_value() {
        let index = IntFieldIndex::new(|_: &i64| None);
        assert_eq!(index.from_object(&1).unwrap(), None);
    }

    proptest! {
        #[test]
        fn int_encoding_preserves_order(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(a.cmp(&b), encode_int(a).cmp(&encode_int(b)));
        }

        #[test]
        fn uint_encoding_preserves_order(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(a.cmp(&b), encode_uint(a).cmp(&encode_uint(b)));
        }
    }
}
