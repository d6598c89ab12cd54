//! Benchmark support for MemDB.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
