#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use betterconfig::{ConfigError, LoadOptions, Source, Value, decode, load};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn betterconfig_cmd() -> assert_cmd::Command {
	assert_cmd::Command::cargo_bin("betterconfig").unwrap()
}

fn fixture(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR"))
		.join("tests/fixtures")
		.join(name)
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&path, content).unwrap();
	path
}

// ============================================================================
// Library load tests
// ============================================================================

#[test]
fn test_load_literals_fixture() {
	let config = load([fixture("literals.cfg")], &LoadOptions::default()).unwrap();

	let expected = decode(
		r#"{'config': {
			'foo': 1,
			'bar': ['a', 'list', 'of', 'strings'],
			'baz': "just a plain old string",
		}}"#,
	)
	.unwrap();
	assert_eq!(config.to_value(), expected);
}

#[test]
fn test_load_fancy_fixture_with_includes() {
	let config = load([fixture("fancy.cfg")], &LoadOptions::default()).unwrap();

	assert_eq!(
		config.value("top_level"),
		Some(&Value::from("variables defined outside of sections"))
	);
	assert_eq!(config.value("from_include"), Some(&Value::Int(1)));
	assert!(config.get("include").is_none());

	let section = config.section("section").unwrap();
	assert_eq!(section.get("namespaced"), Some(&Value::Bool(true)));
	assert_eq!(section.get("level"), Some(&Value::from("override")));
	assert_eq!(section.get("ports"), Some(&Value::from(vec![8080_i64, 8081])));

	let extra = config.section("extra").unwrap();
	assert_eq!(
		extra.get("pair"),
		Some(&Value::Tuple(vec![Value::Int(1), Value::from("one")]))
	);
}

#[test]
fn test_nested_include_from_sectionless_file() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	write(base, "foo_1.cfg", "[foo]\nnumbers = [4, 8, 12]\n");
	let top = write(
		base,
		"top.cfg",
		"include = [\"foo_*.cfg\"]\n\n[config]\nbar = 24\n",
	);

	let config = load([&top], &LoadOptions::default()).unwrap();
	let expected = decode("{'foo': {'numbers': [4, 8, 12]}, 'config': {'bar': 24}}").unwrap();
	assert_eq!(config.to_value(), expected);
}

#[test]
fn test_include_patterns_resolve_in_order() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	write(base, "b2.cfg", "order = order_b2\n");
	write(base, "b1.cfg", "seen_b1 = True\n");
	write(base, "a1.cfg", "last = 'a1'\n");
	// the bare name in b2.cfg fails to decode, proving b1 and b2 load before a1
	let top = write(base, "top.cfg", "include = ['b*.cfg', 'a*.cfg']\n");

	let err = load([&top], &LoadOptions::default()).unwrap_err();
	assert!(matches!(err, ConfigError::InvalidLiteral { ref origin, .. } if origin.ends_with("b2.cfg")));

	write(base, "b2.cfg", "last = 'b2'\n");
	let config = load([&top], &LoadOptions::default()).unwrap();
	assert_eq!(config.value("seen_b1"), Some(&Value::Bool(true)));
	assert_eq!(config.value("last"), Some(&Value::from("a1")));
}

#[test]
fn test_include_cycle_contributes_each_file_once() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	write(base, "b.cfg", "include = 'a.cfg'\ncount = 2\n[b]\nvalue = 'b'\n");
	let a = write(base, "a.cfg", "include = 'b.cfg'\ncount = 1\n[a]\nvalue = 'a'\n");

	let config = load([&a], &LoadOptions::default()).unwrap();
	let expected = decode("{'count': 2, 'a': {'value': 'a'}, 'b': {'value': 'b'}}").unwrap();
	assert_eq!(config.to_value(), expected);
}

#[test]
fn test_include_relative_to_including_file() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	write(base, "conf/inner/leaf.cfg", "[leaf]\ndepth = 2\n");
	write(base, "conf/mid.cfg", "include = 'inner/*.cfg'\n[mid]\ndepth = 1\n");
	let top = write(base, "top.cfg", "include = 'conf/mid.cfg'\n");

	let config = load([&top], &LoadOptions::default()).unwrap();
	assert_eq!(config.section("mid").and_then(|s| s.get("depth")), Some(&Value::Int(1)));
	assert_eq!(config.section("leaf").and_then(|s| s.get("depth")), Some(&Value::Int(2)));
}

#[test]
fn test_stream_source_includes_resolve_against_given_path() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	write(base, "part.cfg", "part = 1\n");

	let mut input = "include = 'part.cfg'\n".as_bytes();
	let source = Source::Reader {
		reader: &mut input,
		path: Some(base.join("virtual.cfg")),
	};
	let config = load([source], &LoadOptions::default()).unwrap();
	assert_eq!(config.value("part"), Some(&Value::Int(1)));
}

#[test]
fn test_unreadable_include_target_is_error() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	// a directory matched by the glob cannot be opened as a config file
	fs::create_dir(base.join("dir.cfg")).unwrap();
	let top = write(base, "top.cfg", "include = '*.cfg'\n");

	let result = load([&top], &LoadOptions::default());
	assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_keyword_options() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path();
	write(base, "more.cfg", "more = 1\n");
	let top = write(base, "top.cfg", "uses = 'more.cfg'\nx = 1\n[root]\ny = 2\n");

	let options = LoadOptions::from_pairs([("include", "uses"), ("default", "root")]).unwrap();
	let config = load([&top], &options).unwrap();

	assert_eq!(config.value("more"), Some(&Value::Int(1)));
	assert_eq!(config.value("x"), Some(&Value::Int(1)));
	assert_eq!(config.value("y"), Some(&Value::Int(2)));
	assert!(config.get("root").is_none());
}

#[test]
fn test_unknown_keyword_option() {
	let err = LoadOptions::from_pairs([("seen", "x")]).unwrap_err();
	assert_eq!(err.to_string(), "seen is an invalid option for load");
}

// ============================================================================
// CLI tests
// ============================================================================

#[test]
fn test_help_flag() {
	betterconfig_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("typed values and includes"));
}

#[test]
fn test_version_flag() {
	betterconfig_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("betterconfig"));
}

#[test]
fn test_print_literal_output() {
	betterconfig_cmd()
		.arg(fixture("literals.cfg"))
		.assert()
		.success()
		.stdout(predicate::str::contains("'config': {"))
		.stdout(predicate::str::contains("'bar': ['a', 'list', 'of', 'strings']"))
		.stdout(predicate::str::contains("'foo': 1"));
}

#[test]
fn test_print_from_stdin() {
	betterconfig_cmd()
		.write_stdin("x = 1\nname = 'demo'\n")
		.assert()
		.success()
		.stdout("{'name': 'demo', 'x': 1}\n");
}

#[test]
fn test_print_json() {
	betterconfig_cmd()
		.args(["--format", "json"])
		.arg(fixture("fancy.cfg"))
		.assert()
		.success()
		.stdout(predicate::str::contains("\"namespaced\": true"))
		.stdout(predicate::str::contains("\"top_level\": \"variables defined outside of sections\""));
}

#[test]
fn test_print_toml() {
	betterconfig_cmd()
		.args(["--format", "toml"])
		.arg(fixture("literals.cfg"))
		.assert()
		.success()
		.stdout(predicate::str::contains("[config]"))
		.stdout(predicate::str::contains("foo = 1"));
}

#[test]
fn test_print_single_section() {
	betterconfig_cmd()
		.args(["--section", "config"])
		.arg(fixture("literals.cfg"))
		.assert()
		.success()
		.stdout(predicate::str::starts_with("{'bar': "));
}

#[test]
fn test_missing_section_fails() {
	betterconfig_cmd()
		.args(["--section", "nope"])
		.arg(fixture("literals.cfg"))
		.assert()
		.failure()
		.stderr(predicate::str::contains("No section or key named"));
}

#[test]
fn test_loader_option_flag() {
	betterconfig_cmd()
		.args(["-o", "default=top"])
		.write_stdin("x = 1\n[_]\ny = 2\n")
		.assert()
		.success()
		.stdout("{'_': {'y': 2}, 'x': 1}\n");
}

#[test]
fn test_invalid_option_fails() {
	betterconfig_cmd()
		.args(["-o", "bogus=1"])
		.arg("/nonexistent/never-opened.cfg")
		.assert()
		.failure()
		.stderr(predicate::str::contains("bogus is an invalid option"))
		.stderr(predicate::str::contains("never-opened").not());
}

#[test]
fn test_invalid_literal_fails() {
	betterconfig_cmd()
		.write_stdin("[s]\nvalue = os.system('true')\n")
		.assert()
		.failure()
		.stderr(predicate::str::contains("Invalid literal"));
}

#[test]
fn test_missing_file_fails() {
	betterconfig_cmd()
		.arg("/nonexistent/config.cfg")
		.assert()
		.failure()
		.stderr(predicate::str::contains("Failed to read config source"));
}
