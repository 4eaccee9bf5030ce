use crate::literal::DecodeError;

/// Library-level structured errors for betterconfig.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
///
/// `origin` fields hold the display name of the failing source: its path, or
/// `<stream>` for readers without one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{name} is an invalid option for load")]
	InvalidOption { name: String },

	#[error("Invalid value for option {name}: {reason}")]
	InvalidOptionValue { name: String, reason: String },

	#[error("Failed to read config source: {origin}")]
	ReadError {
		origin: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse {origin} at line {line}: {message}")]
	ParseError {
		origin: String,
		line: usize,
		message: String,
	},

	#[error("File contains no section headers: {origin} (line {line})")]
	MissingSectionHeader { origin: String, line: usize },

	#[error("Invalid literal for [{section}] {key} in {origin} at line {line}")]
	InvalidLiteral {
		origin: String,
		section: String,
		key: String,
		line: usize,
		#[source]
		source: DecodeError,
	},

	#[error("Bad interpolation for [{section}] {key} in {origin}: {message}")]
	Interpolation {
		origin: String,
		section: String,
		key: String,
		message: String,
	},

	#[error("Include directive in {origin} must be a string or a sequence of strings, found {found}")]
	InvalidInclude { origin: String, found: String },

	#[error("Invalid include pattern in {origin}: {pattern}")]
	InvalidGlob {
		origin: String,
		pattern: String,
		#[source]
		source: globset::Error,
	},

	#[error("Section [{name}] in {origin} conflicts with a top-level value of the same name")]
	SectionConflict { origin: String, name: String },
}

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
