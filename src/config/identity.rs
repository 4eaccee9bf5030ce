use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Stable identity of a physical file: device and inode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
	pub dev: u64,
	pub ino: u64,
}

impl Identity {
	/// Identify an open file, if the platform exposes inode numbers.
	#[cfg(unix)]
	pub fn of(file: &File) -> Option<Self> {
		use std::os::unix::fs::MetadataExt;

		let metadata = file.metadata().ok()?;
		Some(Self {
			dev: metadata.dev(),
			ino: metadata.ino(),
		})
	}

	#[cfg(not(unix))]
	pub fn of(_file: &File) -> Option<Self> {
		None
	}
}

/// Directory holding `path`, used as the base for relative includes.
///
/// Empty when the source has no path, so includes resolve against the
/// working directory.
pub fn containing_dir(path: Option<&Path>) -> PathBuf {
	path.and_then(Path::parent)
		.map(Path::to_path_buf)
		.unwrap_or_default()
}

/// Identities of every source processed during one load.
///
/// Shared by the whole include tree so no file is processed twice.
#[derive(Debug, Default)]
pub struct SeenSet {
	seen: HashSet<Identity>,
}

impl SeenSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a source, returning `false` if it was already processed.
	///
	/// Sources without an identity are always treated as new.
	pub fn insert(&mut self, identity: Option<Identity>) -> bool {
		match identity {
			Some(identity) => self.seen.insert(identity),
			None => true,
		}
	}

	#[cfg(test)]
	fn contains(&self, identity: &Identity) -> bool {
		self.seen.contains(identity)
	}

	pub fn len(&self) -> usize {
		self.seen.len()
	}

	pub fn is_empty(&self) -> bool {
		self.seen.is_empty()
	}
}
