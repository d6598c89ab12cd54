//! UUID indexer.

use crate::error::{CoreError, CoreResult};
use crate::index::traits::{single_arg, unexpected_arg, Arg, ArgsIndexer, SingleIndexer};
use uuid::Uuid;

/// Indexes a UUID field as its 16 raw bytes.
///
/// Arguments may be a [`Uuid`], its hyphenated string form or 16 raw bytes.
/// Prefix queries take a partial hex string (hyphens allowed) of even length.
pub struct UuidFieldIndex<T> {
    field: Box<dyn Fn(&T) -> Option<Uuid> + Send + Sync>,
}

impl<T> UuidFieldIndex<T> {
    /// Creates an index over the UUID returned by `field`.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(&T) -> Option<Uuid> + Send + Sync + 'static,
    {
        Self {
            field: Box::new(field),
        }
    }
}

/// Decodes a possibly partial hyphenated hex UUID.
fn parse_hex(s: &str, full: bool) -> CoreResult<Vec<u8>> {
    if full && s.len() != 36 {
        return Err(CoreError::invalid_args(format!(
            "UUID must be 36 characters, got {}",
            s.len()
        )));
    }
    if s.len() > 36 {
        return Err(CoreError::invalid_args(format!(
            "UUID prefix is longer than a UUID: {s}"
        )));
    }
    if s.matches('-').count() > 4 {
        return Err(CoreError::invalid_args(format!(
            "UUID should have maximum of 4 \"-\"; got {s}"
        )));
    }
    let digits: Vec<u8> = s.bytes().filter(|b| *b != b'-').collect();
    if digits.len() % 2 != 0 {
        return Err(CoreError::invalid_args(
            "input (without hyphens) must be even length",
        ));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
                _ => Err(CoreError::invalid_args(format!("invalid hex in UUID: {s}"))),
            }
        })
        .collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

impl<T> ArgsIndexer for UuidFieldIndex<T> {
    fn from_args(&self, args: &[Arg]) -> CoreResult<Vec<u8>> {
        match single_arg(args)? {
            Arg::Uuid(id) => Ok(id.as_bytes().to_vec()),
            Arg::Str(s) => parse_hex(s, true),
            Arg::Bytes(b) if b.len() == 16 => Ok(b.clone()),
            Arg::Bytes(b) => Err(CoreError::invalid_args(format!(
                "UUID must be 16 bytes, got {}",
                b.len()
            ))),
            other => Err(unexpected_arg("UUID", other)),
        }
    }

    fn prefix_from_args(&self, args: &[Arg]) -> Option<CoreResult<Vec<u8>>> {
        let prefix = single_arg(args).and_then(|arg| match arg {
            Arg::Str(s) => parse_hex(s, false),
            Arg::Bytes(b) => Ok(b.clone()),
            Arg::Uuid(id) => Ok(id.as_bytes().to_vec()),
            other => Err(unexpected_arg("UUID prefix", other)),
        });
        Some(prefix)
    }
}

impl<T> SingleIndexer<T> for UuidFieldIndex<T> {
    fn from_object(&self, obj: &T) -> CoreResult<Option<Vec<u8>>> {
        Ok((self.field)(obj).map(|id| id.as_bytes().to_vec()))
    }
}
