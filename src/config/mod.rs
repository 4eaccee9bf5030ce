//! Configuration loading for betterconfig.
//!
//! This module handles:
//! - Section-less framing of sources
//! - Section/key parsing with defaults and interpolation
//! - Include resolution with cycle prevention
//! - Merging sources and includes into one `Config`

pub mod framer;
pub mod identity;
pub mod include;
pub mod loader;
pub mod parser;
pub mod types;

pub use framer::{LineSource, Sectionless};
pub use identity::{Identity, SeenSet};
pub use include::{include_patterns, resolve_includes};
pub use loader::{load, load_with_seen};
pub use parser::{ParsedDocument, ParsedEntry, parse, parse_str};
pub use types::{Config, Entry, LoadOptions, Section, Source};
