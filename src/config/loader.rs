use crate::config::framer::Sectionless;
use crate::config::identity::{Identity, SeenSet, containing_dir};
use crate::config::include::{include_patterns, resolve_includes};
use crate::config::parser::parse;
use crate::config::types::{Config, LoadOptions, Source};
use crate::error::{ConfigError, Result};
use crate::literal::decode;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

/// An opened source, ready to be framed and parsed.
struct Document<'a> {
	reader: Box<dyn Read + 'a>,
	origin: String,
	dir: PathBuf,
	identity: Option<Identity>,
}

impl<'a> Document<'a> {
	/// Open a source. Files opened here are closed when the document drops.
	fn open(source: Source<'a>) -> Result<Self> {
		match source {
			Source::Path(path) => {
				let origin = path.display().to_string();
				let file = File::open(&path).map_err(|source| ConfigError::ReadError {
					origin: origin.clone(),
					source,
				})?;
				Ok(Self {
					identity: Identity::of(&file),
					dir: containing_dir(Some(&path)),
					reader: Box::new(file),
					origin,
				})
			}
			Source::File { file, path } => Ok(Self {
				identity: Identity::of(file),
				dir: containing_dir(path.as_deref()),
				origin: origin_of(path.as_deref()),
				reader: Box::new(file),
			}),
			Source::Reader { reader, path } => Ok(Self {
				identity: None,
				dir: containing_dir(path.as_deref()),
				origin: origin_of(path.as_deref()),
				reader: Box::new(reader),
			}),
		}
	}
}

fn origin_of(path: Option<&std::path::Path>) -> String {
	path.map(|p| p.display().to_string())
		.unwrap_or_else(|| "<stream>".to_string())
}

/// Load config sources into one [`Config`].
///
/// Sources are processed in order and all write into the same result. Each
/// source's includes are loaded after its own keys and overlaid on top.
/// A file reached twice (through includes or repeated arguments) is only
/// processed the first time.
///
/// # Example
///
/// ```no_run
/// use betterconfig::{LoadOptions, load};
///
/// let config = load(["./fancy.cfg"], &LoadOptions::default()).unwrap();
/// if let Some(section) = config.section("section") {
///     println!("namespaced = {:?}", section.get("namespaced"));
/// }
/// ```
pub fn load<'a, I>(sources: I, options: &LoadOptions) -> Result<Config>
where
	I: IntoIterator,
	I::Item: Into<Source<'a>>,
{
	let mut seen = SeenSet::new();
	load_with_seen(sources, options, &mut seen)
}

/// Load config sources, sharing `seen` with the caller.
///
/// Sources whose identity is already in `seen` are skipped silently.
pub fn load_with_seen<'a, I>(sources: I, options: &LoadOptions, seen: &mut SeenSet) -> Result<Config>
where
	I: IntoIterator,
	I::Item: Into<Source<'a>>,
{
	let sources: Vec<Source<'a>> = sources.into_iter().map(Into::into).collect();
	load_sources(sources, options, seen)
}

fn load_sources(sources: Vec<Source<'_>>, options: &LoadOptions, seen: &mut SeenSet) -> Result<Config> {
	let mut compiled = Config::new();

	for source in sources {
		let document = Document::open(source)?;

		// prevent infinite include recursion
		if !seen.insert(document.identity) {
			tracing::debug!(origin = %document.origin, "skipping already loaded source");
			continue;
		}

		let includes = merge_document(document, options, &mut compiled)?;

		if !includes.is_empty() {
			let sources = includes.into_iter().map(Source::Path).collect();
			let included = load_sources(sources, options, seen)?;
			compiled.overlay(included);
		}
	}

	Ok(compiled)
}

/// Parse one document into `compiled`, returning the includes it names.
///
/// The document (and any file it owns) is dropped before returning.
fn merge_document(document: Document<'_>, options: &LoadOptions, compiled: &mut Config) -> Result<Vec<PathBuf>> {
	let Document {
		reader, origin, dir, ..
	} = document;
	tracing::debug!(origin = %origin, "loading config source");

	let default = options.default_name();
	let include_key = options.include();

	let mut framed = Sectionless::new(BufReader::new(reader), default);
	let parsed = parse(&mut framed, &origin)?;
	drop(framed);

	let mut includes = Vec::new();
	for section in parsed.sections() {
		let is_default = section == default;
		if !is_default {
			// sections exist even when they hold no keys
			compiled.section_mut(section, &origin)?;
		}

		for entry in parsed.entries(section)? {
			let value = decode(&entry.value).map_err(|source| ConfigError::InvalidLiteral {
				origin: origin.clone(),
				section: entry.section.clone(),
				key: entry.key.clone(),
				line: entry.line,
				source,
			})?;

			if is_default && entry.key == include_key {
				let patterns = include_patterns(&value, &origin)?;
				includes.extend(resolve_includes(&patterns, &dir, &origin)?);
			} else if is_default {
				tracing::trace!(origin = %origin, key = %entry.key, "top-level key");
				compiled.insert_value(entry.key, value);
			} else {
				tracing::trace!(origin = %origin, section, key = %entry.key, "section key");
				compiled.section_mut(section, &origin)?.insert(entry.key, value);
			}
		}
	}

	if !includes.is_empty() {
		tracing::debug!(origin = %origin, count = includes.len(), "queued includes");
	}
	Ok(includes)
}
