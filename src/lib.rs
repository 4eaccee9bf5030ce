//! Betterconfig - INI-style configuration with typed literal values.
//!
//! This library provides:
//! - Decoding of literal values (numbers, strings, booleans, null, lists,
//!   tuples, sets, mappings) instead of opaque strings
//! - Top-level keys written before any section header
//! - Recursive `include` of other files by glob pattern, loading each
//!   physical file at most once
//!
//! # Example
//!
//! ```no_run
//! use betterconfig::{LoadOptions, Value, load};
//!
//! // top_level = 'variables defined outside of sections'
//! // include   = ['./include.cfg', 'include.d/*.cfg']
//! //
//! // [section]
//! // namespaced = True
//! let settings = load(["./fancy.cfg"], &LoadOptions::default()).unwrap();
//!
//! let namespaced = settings
//!     .section("section")
//!     .and_then(|s| s.get("namespaced"))
//!     .and_then(Value::as_bool);
//! println!("namespaced: {namespaced:?}");
//! ```

pub mod config;
pub mod error;
pub mod literal;

pub use config::{Config, Entry, LoadOptions, Section, SeenSet, Source, load, load_with_seen};
pub use error::{ConfigError, Result};
pub use literal::{DecodeError, Value, decode};
