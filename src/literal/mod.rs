//! Typed literal values for config entries.
//!
//! This module handles:
//! - The `Value` type every config value decodes into
//! - A recursive-descent decoder for the literal grammar
//!
//! The decoder never evaluates anything: names other than the boolean and
//! null constants, calls and operators are rejected.

pub mod decoder;
pub mod value;

pub use decoder::{DecodeError, decode};
pub use value::Value;
