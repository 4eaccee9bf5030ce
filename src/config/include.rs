use crate::error::{ConfigError, Result};
use crate::literal::Value;
use globset::GlobBuilder;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Interpret an include directive's value as a list of glob patterns.
///
/// A single string is one pattern; lists, tuples and sets of strings are
/// taken in order.
pub fn include_patterns(value: &Value, origin: &str) -> Result<Vec<String>> {
	let invalid = |found: &Value| ConfigError::InvalidInclude {
		origin: origin.to_string(),
		found: found.kind().to_string(),
	};

	if let Value::Str(pattern) = value {
		return Ok(vec![pattern.clone()]);
	}

	let items = value.as_seq().ok_or_else(|| invalid(value))?;
	items
		.into_iter()
		.map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(item)))
		.collect()
}

/// Expand include patterns relative to `base_dir`.
///
/// Each pattern's matches are sorted lexically by full path, then appended in
/// pattern order. Patterns that match nothing contribute nothing.
pub fn resolve_includes(patterns: &[String], base_dir: &Path, origin: &str) -> Result<Vec<PathBuf>> {
	let mut resolved = Vec::new();
	for pattern in patterns {
		let mut matches = expand_pattern(pattern, base_dir, origin)?;
		matches.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
		tracing::debug!(
			origin,
			pattern = pattern.as_str(),
			matches = matches.len(),
			"resolved include pattern"
		);
		resolved.extend(matches);
	}
	Ok(resolved)
}

fn has_magic(name: &OsStr) -> bool {
	name.to_str().is_some_and(|s| s.contains(['*', '?', '[']))
}

/// Rewrite one shell-style pattern component into globset syntax.
///
/// Braces are literal, an unclosed `[` is literal, and runs of `*` act as a
/// single `*`.
fn translate_component(part: &str) -> String {
	let chars: Vec<char> = part.chars().collect();
	let mut out = String::with_capacity(part.len());
	let mut i = 0;
	while i < chars.len() {
		match chars[i] {
			'*' => {
				out.push('*');
				while chars.get(i + 1) == Some(&'*') {
					i += 1;
				}
			}
			'{' => out.push_str("[{]"),
			'}' => out.push_str("[}]"),
			'[' => match class_end(&chars, i) {
				Some(end) => {
					out.extend(&chars[i..=end]);
					i = end;
				}
				None => out.push_str("[[]"),
			},
			c => out.push(c),
		}
		i += 1;
	}
	out
}

/// Index of the `]` closing the class opened at `open`. A `]` right after
/// `[` or `[!` is a member, not the end.
fn class_end(chars: &[char], open: usize) -> Option<usize> {
	let mut j = open + 1;
	if chars.get(j) == Some(&'!') {
		j += 1;
	}
	if chars.get(j) == Some(&']') {
		j += 1;
	}
	(j..chars.len()).find(|&k| chars[k] == ']')
}

fn expand_pattern(pattern: &str, base_dir: &Path, origin: &str) -> Result<Vec<PathBuf>> {
	let full = base_dir.join(pattern);
	let components: Vec<Component> = full.components().collect();

	// Everything before the first wildcard component is a literal directory.
	let Some(split) = components
		.iter()
		.position(|c| matches!(c, Component::Normal(name) if has_magic(name)))
	else {
		return Ok(if full.exists() { vec![full] } else { Vec::new() });
	};

	let root: PathBuf = components[..split].iter().collect();
	let rest: Vec<String> = components[split..]
		.iter()
		.map(|c| c.as_os_str().to_string_lossy().into_owned())
		.collect();

	let translated: Vec<String> = rest.iter().map(|part| translate_component(part)).collect();
	let matcher = GlobBuilder::new(&translated.join("/"))
		.literal_separator(true)
		.backslash_escape(false)
		.allow_unclosed_class(true)
		.build()
		.map_err(|source| ConfigError::InvalidGlob {
			origin: origin.to_string(),
			pattern: pattern.to_string(),
			source,
		})?
		.compile_matcher();

	let walk_root = if root.as_os_str().is_empty() {
		PathBuf::from(".")
	} else {
		root.clone()
	};

	let mut matches = Vec::new();
	for entry in WalkDir::new(&walk_root)
		.min_depth(rest.len())
		.max_depth(rest.len())
		.follow_links(true)
		.into_iter()
		.filter_map(std::result::Result::ok)
	{
		let Ok(rel) = entry.path().strip_prefix(&walk_root) else {
			continue;
		};
		if !matcher.is_match(rel) || hides_dotfile(rel, &rest) {
			continue;
		}
		matches.push(root.join(rel));
	}
	Ok(matches)
}

/// Wildcards do not match names starting with `.` unless the pattern does.
fn hides_dotfile(rel: &Path, pattern: &[String]) -> bool {
	rel.components().zip(pattern).any(|(component, part)| {
		component.as_os_str().to_string_lossy().starts_with('.') && !part.starts_with('.')
	})
}
