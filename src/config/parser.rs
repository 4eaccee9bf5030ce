use crate::config::framer::LineSource;
use crate::config::types::DEFAULTS_SECTION;
use crate::error::{ConfigError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Interpolation stops expanding after this many passes.
const MAX_INTERPOLATION_DEPTH: usize = 10;

static SECTION_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\[(?P<header>[^\]]+)\]").expect("section regex is valid"));

static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?P<option>[^:=\s][^:=]*)\s*[:=]\s*(?P<value>.*)$").expect("option regex is valid")
});

/// One key found by the parser, with its raw (undecoded) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
	pub section: String,
	pub key: String,
	pub value: String,
	/// Line the key was written on, 1-based.
	pub line: usize,
}

#[derive(Debug, Clone)]
struct RawOption {
	key: String,
	value: String,
	line: usize,
}

#[derive(Debug, Clone, Copy)]
enum Target {
	Defaults,
	Section(usize),
}

/// Sections and keys of one source, in file order.
#[derive(Debug, Default)]
pub struct ParsedDocument {
	origin: String,
	defaults: Vec<RawOption>,
	sections: Vec<(String, Vec<RawOption>)>,
}

impl ParsedDocument {
	/// Section names in order of first appearance. `DEFAULT` is not included.
	pub fn sections(&self) -> impl Iterator<Item = &str> {
		self.sections.iter().map(|(name, _)| name.as_str())
	}

	#[cfg(test)]
	fn has_section(&self, name: &str) -> bool {
		self.sections().any(|s| s == name)
	}

	/// Entries of a section with defaults applied and `%(name)s` references
	/// expanded.
	///
	/// The section's own keys come first in file order, followed by any
	/// defaults it does not override.
	pub fn entries(&self, section: &str) -> Result<Vec<ParsedEntry>> {
		let Some((_, options)) = self.sections.iter().find(|(name, _)| name == section) else {
			return Ok(Vec::new());
		};

		let mut vars: HashMap<&str, &str> = HashMap::new();
		for option in self.defaults.iter().chain(options) {
			vars.insert(&option.key, &option.value);
		}

		let inherited = self
			.defaults
			.iter()
			.filter(|default| !options.iter().any(|o| o.key == default.key));

		options
			.iter()
			.chain(inherited)
			.map(|option| {
				Ok(ParsedEntry {
					section: section.to_string(),
					key: option.key.clone(),
					value: self.interpolate(section, option, &vars)?,
					line: option.line,
				})
			})
			.collect()
	}

	fn interpolate(&self, section: &str, option: &RawOption, vars: &HashMap<&str, &str>) -> Result<String> {
		let error = |message: String| ConfigError::Interpolation {
			origin: self.origin.clone(),
			section: section.to_string(),
			key: option.key.clone(),
			message,
		};

		let mut value = option.value.clone();
		for _ in 0..MAX_INTERPOLATION_DEPTH {
			if !value.contains("%(") {
				return Ok(value);
			}
			value = substitute(&value, vars).map_err(error)?;
		}

		if value.contains("%(") {
			return Err(error(format!(
				"value still contains references after {MAX_INTERPOLATION_DEPTH} passes: {:?}",
				option.value
			)));
		}
		Ok(value)
	}

	fn options_mut(&mut self, target: Target) -> &mut Vec<RawOption> {
		match target {
			Target::Defaults => &mut self.defaults,
			Target::Section(index) => &mut self.sections[index].1,
		}
	}
}

/// One substitution pass: `%(name)s` becomes the named raw value, `%%` becomes `%`.
fn substitute(value: &str, vars: &HashMap<&str, &str>) -> std::result::Result<String, String> {
	let mut out = String::with_capacity(value.len());
	let mut rest = value;

	while let Some(pos) = rest.find('%') {
		out.push_str(&rest[..pos]);
		rest = &rest[pos + 1..];

		if let Some(after) = rest.strip_prefix('%') {
			out.push('%');
			rest = after;
		} else if let Some(after) = rest.strip_prefix('(') {
			let close = after
				.find(')')
				.ok_or_else(|| format!("unterminated reference in {value:?}"))?;
			let name = after[..close].to_lowercase();
			rest = after[close + 1..]
				.strip_prefix('s')
				.ok_or_else(|| format!("reference %({name}) must be written as %({name})s"))?;
			let replacement = vars
				.get(name.as_str())
				.ok_or_else(|| format!("no option named {name:?} to substitute"))?;
			out.push_str(replacement);
		} else {
			return Err(format!("'%' must be followed by '%' or '(' in {value:?}"));
		}
	}

	out.push_str(rest);
	Ok(out)
}

/// Position of an inline `;` comment: the first `;`, if whitespace precedes it.
fn inline_comment(value: &str) -> Option<usize> {
	let pos = value.find(';')?;
	value[..pos]
		.chars()
		.next_back()
		.is_some_and(char::is_whitespace)
		.then_some(pos)
}

fn is_comment(line: &str) -> bool {
	if line.starts_with(['#', ';']) {
		return true;
	}
	// "rem" as the first word, DOS style
	line.starts_with(['r', 'R'])
		&& line
			.split_whitespace()
			.next()
			.is_some_and(|word| word.eq_ignore_ascii_case("rem"))
}

/// Parse sections and keys from a line source.
///
/// `origin` names the source in errors. Keys are folded to lower case.
pub fn parse(source: &mut dyn LineSource, origin: &str) -> Result<ParsedDocument> {
	let mut document = ParsedDocument {
		origin: origin.to_string(),
		..Default::default()
	};
	let mut current: Option<Target> = None;
	let mut last_option: Option<usize> = None;
	let synthetic = source.synthetic_lines();
	let mut read_lines: usize = 0;
	let mut buf = String::new();

	loop {
		buf.clear();
		let read = source
			.read_line(&mut buf)
			.map_err(|source| ConfigError::ReadError {
				origin: origin.to_string(),
				source,
			})?;
		if read == 0 {
			break;
		}
		read_lines += 1;
		let line_no = read_lines.saturating_sub(synthetic);

		let line = buf.trim_end_matches(['\n', '\r']);
		if line.trim().is_empty() || is_comment(line) {
			continue;
		}

		let indented = line.starts_with(char::is_whitespace);
		if indented {
			if let (Some(target), Some(index)) = (current, last_option) {
				let continued = line.trim();
				let option = &mut document.options_mut(target)[index];
				option.value.push('\n');
				option.value.push_str(continued);
				continue;
			}
			if line.trim_start().starts_with(['#', ';']) {
				continue;
			}
		}

		if let Some(caps) = SECTION_RE.captures(line) {
			let name = &caps["header"];
			current = Some(if name == DEFAULTS_SECTION {
				Target::Defaults
			} else {
				// a repeated header re-opens the section
				match document.sections.iter().position(|(s, _)| s == name) {
					Some(index) => Target::Section(index),
					None => {
						document.sections.push((name.to_string(), Vec::new()));
						Target::Section(document.sections.len() - 1)
					}
				}
			});
			last_option = None;
			continue;
		}

		let Some(target) = current else {
			return Err(ConfigError::MissingSectionHeader {
				origin: origin.to_string(),
				line: line_no,
			});
		};

		let Some(caps) = OPTION_RE.captures(line) else {
			return Err(ConfigError::ParseError {
				origin: origin.to_string(),
				line: line_no,
				message: format!("expected a section header or 'key = value', found {line:?}"),
			});
		};

		let key = caps["option"].trim_end().to_lowercase();
		let mut value = &caps["value"];
		if let Some(pos) = inline_comment(value) {
			value = &value[..pos];
		}
		let option = RawOption {
			key,
			value: value.trim().to_string(),
			line: line_no,
		};

		let options = document.options_mut(target);
		let index = match options.iter().position(|o| o.key == option.key) {
			Some(index) => {
				options[index] = option;
				index
			}
			None => {
				options.push(option);
				options.len() - 1
			}
		};
		last_option = Some(index);
	}

	Ok(document)
}

/// Parse a document held in a string (useful for testing).
pub fn parse_str(content: &str, origin: &str) -> Result<ParsedDocument> {
	let mut source = content.as_bytes();
	parse(&mut source, origin)
}
