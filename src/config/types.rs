use crate::error::{ConfigError, Result};
use crate::literal::Value;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default name of the key listing include patterns.
pub const DEFAULT_INCLUDE_KEY: &str = "include";

/// Default name of the pseudo-section holding top-level keys.
pub const DEFAULT_SECTION: &str = "_";

/// Name of the parser's defaults section, which never becomes a real section.
pub const DEFAULTS_SECTION: &str = "DEFAULT";

/// Keys of one section, mapped to their decoded values.
pub type Section = BTreeMap<String, Value>;

/// One entry at the root of a [`Config`]: a top-level value or a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
	Value(Value),
	Section(Section),
}

impl Entry {
	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Entry::Value(value) => Some(value),
			Entry::Section(_) => None,
		}
	}

	pub fn as_section(&self) -> Option<&Section> {
		match self {
			Entry::Section(section) => Some(section),
			Entry::Value(_) => None,
		}
	}

	/// The entry as a plain value; sections become string-keyed mappings.
	pub fn to_value(&self) -> Value {
		match self {
			Entry::Value(value) => value.clone(),
			Entry::Section(section) => Value::Dict(
				section
					.iter()
					.map(|(key, value)| (Value::Str(key.clone()), value.clone()))
					.collect(),
			),
		}
	}
}

/// The compiled result of a load: sections plus top-level keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config {
	entries: BTreeMap<String, Entry>,
}

impl Config {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&Entry> {
		self.entries.get(name)
	}

	/// Look up a section by name.
	pub fn section(&self, name: &str) -> Option<&Section> {
		self.get(name).and_then(Entry::as_section)
	}

	/// Look up a top-level value by name.
	pub fn value(&self, name: &str) -> Option<&Value> {
		self.get(name).and_then(Entry::as_value)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Entry> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Set a top-level value, replacing whatever held the name.
	pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
		self.entries.insert(key.into(), Entry::Value(value));
	}

	/// Get a section for writing, creating it empty if missing.
	///
	/// Fails when the name already holds a top-level value.
	pub fn section_mut(&mut self, name: &str, origin: &str) -> Result<&mut Section> {
		let entry = self
			.entries
			.entry(name.to_string())
			.or_insert_with(|| Entry::Section(Section::new()));

		match entry {
			Entry::Section(section) => Ok(section),
			Entry::Value(_) => Err(ConfigError::SectionConflict {
				origin: origin.to_string(),
				name: name.to_string(),
			}),
		}
	}

	/// Overlay `other` onto this config.
	///
	/// Sections present on both sides merge key by key; every other entry
	/// from `other` replaces the existing one.
	pub fn overlay(&mut self, other: Config) {
		for (name, incoming) in other.entries {
			match incoming {
				Entry::Section(section) => match self.entries.get_mut(&name) {
					Some(Entry::Section(existing)) => existing.extend(section),
					_ => {
						self.entries.insert(name, Entry::Section(section));
					}
				},
				value => {
					self.entries.insert(name, value);
				}
			}
		}
	}

	/// The whole config as a string-keyed mapping value.
	pub fn to_value(&self) -> Value {
		Value::Dict(
			self.entries
				.iter()
				.map(|(name, entry)| (Value::Str(name.clone()), entry.to_value()))
				.collect(),
		)
	}

	pub fn into_inner(self) -> BTreeMap<String, Entry> {
		self.entries
	}
}

impl<'a> IntoIterator for &'a Config {
	type Item = (&'a String, &'a Entry);
	type IntoIter = btree_map::Iter<'a, String, Entry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

/// Options controlling a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
	include_key: String,
	default_section: String,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			include_key: DEFAULT_INCLUDE_KEY.to_string(),
			default_section: DEFAULT_SECTION.to_string(),
		}
	}
}

impl LoadOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Use `key` as the include directive in the top-level section.
	pub fn include_key(mut self, key: impl Into<String>) -> Result<Self> {
		self.set("include", &key.into())?;
		Ok(self)
	}

	/// Use `name` for the pseudo-section holding top-level keys.
	pub fn default_section(mut self, name: impl Into<String>) -> Result<Self> {
		self.set("default", &name.into())?;
		Ok(self)
	}

	/// Set an option by its keyword name (`include` or `default`).
	///
	/// Unknown names fail with [`ConfigError::InvalidOption`].
	pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
		match name {
			"include" => {
				if value.trim().is_empty() {
					return Err(invalid_value(name, "the include key cannot be empty"));
				}
				self.include_key = value.to_string();
			}
			"default" => {
				if value.trim().is_empty() {
					return Err(invalid_value(name, "the default section name cannot be empty"));
				}
				if value.contains(']') || value.contains('\n') {
					return Err(invalid_value(name, "the default section name cannot contain ']' or newlines"));
				}
				if value == DEFAULTS_SECTION {
					return Err(invalid_value(name, "DEFAULT is reserved for parser defaults"));
				}
				self.default_section = value.to_string();
			}
			_ => {
				return Err(ConfigError::InvalidOption {
					name: name.to_string(),
				});
			}
		}
		Ok(())
	}

	/// Build options from keyword-style `(name, value)` pairs.
	pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut options = Self::default();
		for (name, value) in pairs {
			options.set(name.as_ref(), value.as_ref())?;
		}
		Ok(options)
	}

	/// The include key as it appears after key folding.
	pub fn include(&self) -> String {
		self.include_key.to_lowercase()
	}

	pub fn default_name(&self) -> &str {
		&self.default_section
	}
}

fn invalid_value(name: &str, reason: &str) -> ConfigError {
	ConfigError::InvalidOptionValue {
		name: name.to_string(),
		reason: reason.to_string(),
	}
}

/// A config source handed to the loader.
///
/// Paths are opened and closed by the loader. Borrowed files and readers stay
/// owned by the caller and are never closed.
pub enum Source<'a> {
	Path(PathBuf),
	File {
		file: &'a File,
		/// Used for include resolution and error messages.
		path: Option<PathBuf>,
	},
	Reader {
		reader: &'a mut dyn Read,
		path: Option<PathBuf>,
	},
}

impl<'a> Source<'a> {
	/// An open file, with the path it was opened from.
	pub fn file(file: &'a File, path: impl Into<PathBuf>) -> Self {
		Source::File {
			file,
			path: Some(path.into()),
		}
	}

	/// A bare reader with no identity or location, such as standard input.
	pub fn reader(reader: &'a mut dyn Read) -> Self {
		Source::Reader { reader, path: None }
	}
}

impl std::fmt::Debug for Source<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
			Source::File { path, .. } => f.debug_struct("File").field("path", path).finish(),
			Source::Reader { path, .. } => f.debug_struct("Reader").field("path", path).finish(),
		}
	}
}

impl From<PathBuf> for Source<'_> {
	fn from(path: PathBuf) -> Self {
		Source::Path(path)
	}
}

impl From<&Path> for Source<'_> {
	fn from(path: &Path) -> Self {
		Source::Path(path.to_path_buf())
	}
}

impl From<&PathBuf> for Source<'_> {
	fn from(path: &PathBuf) -> Self {
		Source::Path(path.clone())
	}
}

impl From<&str> for Source<'_> {
	fn from(path: &str) -> Self {
		Source::Path(PathBuf::from(path))
	}
}

impl From<String> for Source<'_> {
	fn from(path: String) -> Self {
		Source::Path(PathBuf::from(path))
	}
}

impl<'a> From<&'a File> for Source<'a> {
	fn from(file: &'a File) -> Self {
		Source::File { file, path: None }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn section(pairs: &[(&str, i64)]) -> Entry {
		Entry::Section(
			pairs
				.iter()
				.map(|(k, v)| (k.to_string(), Value::Int(*v)))
				.collect(),
		)
	}

	#[test]
	fn test_overlay_merges_sections() {
		let mut base = Config::new();
		base.entries.insert("section".into(), section(&[("x", 1), ("y", 2)]));
		base.insert_value("top", Value::Int(1));

		let mut include = Config::new();
		include.entries.insert("section".into(), section(&[("x", 9)]));
		include.insert_value("top", Value::Int(2));

		base.overlay(include);

		let merged = base.section("section").unwrap();
		assert_eq!(merged.get("x"), Some(&Value::Int(9)));
		assert_eq!(merged.get("y"), Some(&Value::Int(2)));
		assert_eq!(base.value("top"), Some(&Value::Int(2)));
	}

	#[test]
	fn test_overlay_replaces_mismatched_entries() {
		let mut base = Config::new();
		base.entries.insert("name".into(), section(&[("x", 1)]));

		let mut include = Config::new();
		include.insert_value("name", Value::from("flat"));

		base.overlay(include);
		assert_eq!(base.value("name"), Some(&Value::from("flat")));
	}

	#[test]
	fn test_section_conflict() {
		let mut config = Config::new();
		config.insert_value("config", Value::Int(1));

		let err = config.section_mut("config", "test.cfg").unwrap_err();
		assert!(matches!(err, ConfigError::SectionConflict { ref name, .. } if name == "config"));
	}

	#[test]
	fn test_to_value() {
		let mut config = Config::new();
		config.section_mut("s", "test.cfg").unwrap().insert("k".into(), Value::Bool(true));
		config.insert_value("top", Value::None);

		let value = config.to_value();
		assert_eq!(value.get("top"), Some(&Value::None));
		assert_eq!(value.get("s").and_then(|s| s.get("k")), Some(&Value::Bool(true)));
	}

	#[test]
	fn test_options_set() {
		let mut options = LoadOptions::new();
		options.set("include", "Extends").unwrap();
		options.set("default", "top").unwrap();
		assert_eq!(options.include(), "extends");
		assert_eq!(options.default_name(), "top");
	}

	#[test]
	fn test_options_rejects_unknown_name() {
		let err = LoadOptions::from_pairs([("includes", "x")]).unwrap_err();
		match err {
			ConfigError::InvalidOption { name } => assert_eq!(name, "includes"),
			other => panic!("Expected InvalidOption error, got {other:?}"),
		}
	}

	#[test]
	fn test_options_rejects_bad_values() {
		assert!(LoadOptions::new().default_section("").is_err());
		assert!(LoadOptions::new().default_section("a]b").is_err());
		assert!(LoadOptions::new().default_section("DEFAULT").is_err());
		assert!(LoadOptions::new().include_key(" ").is_err());
	}
}
