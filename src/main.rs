use anyhow::{Context, Result};
use betterconfig::{Config, LoadOptions, Source, Value, load};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Lines longer than this are broken up in literal output.
const LINE_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "betterconfig")]
#[command(
	author,
	version,
	about = "Load INI-style config files with typed values and includes, and print the result"
)]
struct Cli {
	/// Config files to load, in order. Reads standard input when none are given.
	#[arg(value_name = "FILE")]
	files: Vec<PathBuf>,

	/// Loader option as NAME=VALUE (include=KEY or default=SECTION)
	#[arg(short = 'o', long = "option", value_name = "NAME=VALUE", value_parser = parse_option)]
	options: Vec<(String, String)>,

	/// Output format
	#[arg(long, value_enum, default_value_t = Format::Literal)]
	format: Format,

	/// Print only this section or top-level key
	#[arg(long, value_name = "NAME")]
	section: Option<String>,

	/// Log loading steps to stderr
	#[arg(short, long)]
	verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
	/// Literal syntax, one root entry per line
	Literal,
	Json,
	Toml,
}

fn parse_option(raw: &str) -> std::result::Result<(String, String), String> {
	let (name, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
	Ok((name.trim().to_string(), value.to_string()))
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	// Options are validated before any file is opened.
	let options = LoadOptions::from_pairs(cli.options.iter().map(|(name, value)| (name, value)))
		.context("Invalid loader option")?;

	let config = if cli.files.is_empty() {
		let stdin = std::io::stdin();
		let mut input = stdin.lock();
		load([Source::reader(&mut input)], &options).context("Failed to load config from stdin")?
	} else {
		load(cli.files.iter(), &options).context("Failed to load config")?
	};

	let rendered = match cli.section {
		Some(ref name) => {
			let entry = config
				.get(name)
				.with_context(|| format!("No section or key named {name:?}"))?;
			render_value(&entry.to_value(), cli.format)?
		}
		None => render_config(&config, cli.format)?,
	};

	println!("{rendered}");
	Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
	let filter = if verbose {
		EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
	} else {
		EnvFilter::from_default_env().add_directive(Level::WARN.into())
	};
	let _ = tracing_subscriber::registry()
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(filter)
		.try_init();
}

fn render_config(config: &Config, format: Format) -> Result<String> {
	match format {
		Format::Literal => Ok(pretty_literal(&config.to_value())),
		Format::Json => serde_json::to_string_pretty(config).context("Failed to render JSON"),
		Format::Toml => toml::to_string_pretty(config).context("Failed to render TOML"),
	}
}

fn render_value(value: &Value, format: Format) -> Result<String> {
	match format {
		Format::Literal => Ok(pretty_literal(value)),
		Format::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
		Format::Toml => toml::to_string_pretty(value).context("Failed to render TOML"),
	}
}

/// Literal text of `value`; long mappings get one entry per line.
fn pretty_literal(value: &Value) -> String {
	let flat = value.to_string();
	let Value::Dict(map) = value else {
		return flat;
	};
	if flat.len() <= LINE_WIDTH {
		return flat;
	}

	let entries: Vec<String> = map.iter().map(|(key, value)| format!("{key}: {value}")).collect();
	format!("{{{}}}", entries.join(",\n "))
}
