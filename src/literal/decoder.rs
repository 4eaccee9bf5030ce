use crate::literal::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Containers nested deeper than this are rejected.
const MAX_DEPTH: usize = 128;

/// A value string that is not a valid literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at offset {offset})")]
pub struct DecodeError {
	/// What went wrong.
	pub message: String,

	/// Byte offset into the decoded text.
	pub offset: usize,
}

/// Decode a literal expression into a [`Value`].
///
/// Only literals are accepted: numbers, strings, `True`/`False`/`None`
/// (and `true`/`false`/`null`), lists, tuples, sets and mappings. Names,
/// calls and operators are rejected rather than evaluated.
pub fn decode(input: &str) -> Result<Value, DecodeError> {
	let mut parser = Parser { src: input, pos: 0, depth: 0 };

	parser.skip_blank_lines();
	if parser.at_end() {
		return Err(parser.error("expected a literal value, found end of input"));
	}

	let value = parser.parse_value()?;

	parser.skip_blank_lines();
	if !parser.at_end() {
		return Err(parser.unexpected());
	}

	Ok(value)
}

struct Parser<'a> {
	src: &'a str,
	pos: usize,
	depth: usize,
}

impl Parser<'_> {
	fn peek(&self) -> Option<char> {
		self.src[self.pos..].chars().next()
	}

	fn peek_nth(&self, n: usize) -> Option<char> {
		self.src[self.pos..].chars().nth(n)
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += c.len_utf8();
		Some(c)
	}

	fn at_end(&self) -> bool {
		self.pos >= self.src.len()
	}

	fn error(&self, message: impl Into<String>) -> DecodeError {
		DecodeError {
			message: message.into(),
			offset: self.pos,
		}
	}

	fn unexpected(&self) -> DecodeError {
		match self.peek() {
			Some(c) => self.error(format!("unexpected character {c:?}")),
			None => self.error("unexpected end of input"),
		}
	}

	/// Skip whitespace and `#` comments. Line breaks only count as
	/// whitespace inside brackets.
	fn skip_trivia(&mut self) {
		self.skip(self.depth > 0);
	}

	/// Skip whitespace, comments and line breaks around the whole value.
	fn skip_blank_lines(&mut self) {
		self.skip(true);
	}

	fn skip(&mut self, newlines: bool) {
		while let Some(c) = self.peek() {
			if c == '\n' || c == '\r' {
				if !newlines {
					break;
				}
				self.bump();
			} else if c.is_whitespace() {
				self.bump();
			} else if c == '#' {
				while self.peek().is_some_and(|c| c != '\n' && c != '\r') {
					self.bump();
				}
			} else {
				break;
			}
		}
	}

	fn parse_value(&mut self) -> Result<Value, DecodeError> {
		self.skip_trivia();
		match self.peek() {
			Some('[') => self.nested(Self::parse_list),
			Some('(') => self.nested(Self::parse_paren),
			Some('{') => self.nested(Self::parse_brace),
			Some('\'' | '"') => self.parse_strings(false),
			Some('+' | '-') => self.parse_signed(),
			Some(c) if c.is_ascii_digit() => self.parse_number(false),
			Some('.') if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
				self.parse_number(false)
			}
			Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
			_ => Err(self.unexpected()),
		}
	}

	fn nested(
		&mut self,
		parse: fn(&mut Self) -> Result<Value, DecodeError>,
	) -> Result<Value, DecodeError> {
		if self.depth >= MAX_DEPTH {
			return Err(self.error("literal is nested too deeply"));
		}
		self.depth += 1;
		let result = parse(self);
		self.depth -= 1;
		result
	}

	/// Parse comma-separated values up to `close`, allowing a trailing comma.
	fn parse_items(&mut self, close: char, mut items: Vec<Value>) -> Result<Vec<Value>, DecodeError> {
		loop {
			self.skip_trivia();
			if self.peek() == Some(close) {
				self.bump();
				return Ok(items);
			}
			items.push(self.parse_value()?);
			self.skip_trivia();
			match self.peek() {
				Some(',') => {
					self.bump();
				}
				Some(c) if c == close => {}
				_ => return Err(self.error(format!("expected ',' or '{close}'"))),
			}
		}
	}

	fn parse_list(&mut self) -> Result<Value, DecodeError> {
		self.bump();
		Ok(Value::List(self.parse_items(']', Vec::new())?))
	}

	fn parse_paren(&mut self) -> Result<Value, DecodeError> {
		self.bump();
		self.skip_trivia();
		if self.peek() == Some(')') {
			self.bump();
			return Ok(Value::Tuple(Vec::new()));
		}

		let first = self.parse_value()?;
		self.skip_trivia();
		match self.peek() {
			// a parenthesized value, not a tuple
			Some(')') => {
				self.bump();
				Ok(first)
			}
			Some(',') => {
				self.bump();
				Ok(Value::Tuple(self.parse_items(')', vec![first])?))
			}
			_ => Err(self.error("expected ',' or ')'")),
		}
	}

	fn parse_brace(&mut self) -> Result<Value, DecodeError> {
		self.bump();
		self.skip_trivia();
		if self.peek() == Some('}') {
			self.bump();
			return Ok(Value::Dict(BTreeMap::new()));
		}

		let start = self.pos;
		let first = self.parse_value()?;
		self.skip_trivia();
		if self.peek() == Some(':') {
			self.bump();
			self.parse_dict(start, first)
		} else {
			if self.peek() == Some(',') {
				self.bump();
			} else if self.peek() != Some('}') {
				return Err(self.error("expected ',', ':' or '}'"));
			}
			let items = self.parse_items('}', vec![first])?;
			let mut set = BTreeSet::new();
			for item in items {
				if !item.is_hashable() {
					return Err(self.error(format!("unhashable set member of type {}", item.kind())));
				}
				set.insert(item);
			}
			Ok(Value::Set(set))
		}
	}

	fn parse_dict(&mut self, first_start: usize, first_key: Value) -> Result<Value, DecodeError> {
		let mut map = BTreeMap::new();
		let mut key = first_key;
		let mut key_start = first_start;
		loop {
			if !key.is_hashable() {
				return Err(DecodeError {
					message: format!("unhashable mapping key of type {}", key.kind()),
					offset: key_start,
				});
			}
			let value = self.parse_value()?;
			map.insert(key, value);

			self.skip_trivia();
			match self.bump() {
				Some('}') => return Ok(Value::Dict(map)),
				Some(',') => {}
				_ => return Err(self.error("expected ',' or '}'")),
			}

			self.skip_trivia();
			if self.peek() == Some('}') {
				self.bump();
				return Ok(Value::Dict(map));
			}
			key_start = self.pos;
			key = self.parse_value()?;
			self.skip_trivia();
			if self.bump() != Some(':') {
				return Err(self.error("expected ':' after mapping key"));
			}
		}
	}

	fn parse_signed(&mut self) -> Result<Value, DecodeError> {
		let negative = self.bump() == Some('-');
		self.skip_trivia();
		match self.peek() {
			Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(negative),
			_ => Err(self.error("unary operators only apply to numbers")),
		}
	}

	fn parse_number(&mut self, negative: bool) -> Result<Value, DecodeError> {
		let start = self.pos;

		let radix = match (self.peek(), self.peek_nth(1)) {
			(Some('0'), Some('x' | 'X')) => Some(16),
			(Some('0'), Some('o' | 'O')) => Some(8),
			(Some('0'), Some('b' | 'B')) => Some(2),
			_ => None,
		};

		let value = if let Some(radix) = radix {
			self.pos += 2;
			let digits = self.take_digits(|c| c.is_digit(radix));
			check_underscores(&digits, start, true)?;
			if digits.is_empty() {
				return Err(self.error("missing digits after radix prefix"));
			}
			self.integer(&digits.replace('_', ""), radix, negative, start)?
		} else {
			let int_part = self.take_digits(|c| c.is_ascii_digit());
			check_underscores(&int_part, start, false)?;
			let mut is_float = false;
			let mut text = int_part.replace('_', "");

			if self.peek() == Some('.') {
				is_float = true;
				self.bump();
				let frac = self.take_digits(|c| c.is_ascii_digit());
				check_underscores(&frac, start, false)?;
				text.push('.');
				text.push_str(&frac.replace('_', ""));
			}

			if matches!(self.peek(), Some('e' | 'E')) {
				is_float = true;
				self.bump();
				text.push('e');
				if let Some(sign @ ('+' | '-')) = self.peek() {
					self.bump();
					text.push(sign);
				}
				let exp = self.take_digits(|c| c.is_ascii_digit());
				check_underscores(&exp, start, false)?;
				if exp.is_empty() {
					return Err(self.error("missing exponent digits"));
				}
				text.push_str(&exp.replace('_', ""));
			}

			if is_float {
				let parsed: f64 = text.parse().map_err(|_| DecodeError {
					message: format!("invalid float literal {text:?}"),
					offset: start,
				})?;
				Value::Float(if negative { -parsed } else { parsed })
			} else {
				if text.len() > 1 && text.starts_with('0') && text.bytes().any(|b| b != b'0') {
					return Err(DecodeError {
						message: "leading zeros in decimal integer literals are not permitted".to_string(),
						offset: start,
					});
				}
				self.integer(&text, 10, negative, start)?
			}
		};

		match self.peek() {
			Some('j' | 'J') => Err(self.error("complex numbers are not supported")),
			Some(c) if c.is_alphanumeric() || c == '_' || c == '.' => Err(self.unexpected()),
			_ => Ok(value),
		}
	}

	fn take_digits(&mut self, is_digit: impl Fn(char) -> bool) -> String {
		let start = self.pos;
		while let Some(c) = self.peek() {
			if is_digit(c) || c == '_' {
				self.bump();
			} else {
				break;
			}
		}
		self.src[start..self.pos].to_string()
	}

	fn integer(&self, digits: &str, radix: u32, negative: bool, start: usize) -> Result<Value, DecodeError> {
		let out_of_range = || DecodeError {
			message: "integer literal out of range".to_string(),
			offset: start,
		};
		let magnitude = i128::from_str_radix(digits, radix).map_err(|_| out_of_range())?;
		let signed = if negative { -magnitude } else { magnitude };
		i64::try_from(signed).map(Value::Int).map_err(|_| out_of_range())
	}

	/// Parse one or more adjacent string literals, concatenated.
	fn parse_strings(&mut self, raw: bool) -> Result<Value, DecodeError> {
		let mut out = self.parse_string(raw)?;
		loop {
			self.skip_trivia();
			let raw = match self.peek() {
				Some('\'' | '"') => false,
				Some(_) => match self.string_prefix() {
					Some(raw) => raw,
					None => break,
				},
				None => break,
			};
			out.push_str(&self.parse_string(raw)?);
		}
		Ok(Value::Str(out))
	}

	/// If a string prefix (`r`, `u`) followed by a quote is next, consume the
	/// prefix and return whether it makes the string raw.
	fn string_prefix(&mut self) -> Option<bool> {
		let first = self.peek()?;
		let raw = match first {
			'r' | 'R' => true,
			'u' | 'U' => false,
			_ => return None,
		};
		if matches!(self.peek_nth(1), Some('\'' | '"')) {
			self.bump();
			Some(raw)
		} else {
			None
		}
	}

	fn parse_string(&mut self, raw: bool) -> Result<String, DecodeError> {
		let start = self.pos;
		let quote = self.bump().ok_or_else(|| self.unexpected())?;
		let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
		if triple {
			self.pos += 2 * quote.len_utf8();
		}

		let unterminated = || DecodeError {
			message: "unterminated string literal".to_string(),
			offset: start,
		};

		let mut out = String::new();
		loop {
			let c = self.bump().ok_or_else(unterminated)?;
			if c == quote {
				if !triple {
					return Ok(out);
				}
				if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
					self.pos += 2 * quote.len_utf8();
					return Ok(out);
				}
				out.push(c);
			} else if c == '\n' && !triple {
				return Err(unterminated());
			} else if c == '\\' {
				let next = self.bump().ok_or_else(unterminated)?;
				if raw {
					out.push('\\');
					out.push(next);
				} else {
					self.unescape(next, &mut out)?;
				}
			} else {
				out.push(c);
			}
		}
	}

	fn unescape(&mut self, c: char, out: &mut String) -> Result<(), DecodeError> {
		match c {
			'\n' => {}
			'\\' | '\'' | '"' => out.push(c),
			'a' => out.push('\x07'),
			'b' => out.push('\x08'),
			'f' => out.push('\x0c'),
			'n' => out.push('\n'),
			'r' => out.push('\r'),
			't' => out.push('\t'),
			'v' => out.push('\x0b'),
			'0'..='7' => {
				let mut code = c.to_digit(8).unwrap_or(0);
				for _ in 0..2 {
					match self.peek().and_then(|d| d.to_digit(8)) {
						Some(d) => {
							code = code * 8 + d;
							self.bump();
						}
						None => break,
					}
				}
				out.push(self.char_from(code)?);
			}
			'x' => out.push(self.hex_escape(2)?),
			'u' => out.push(self.hex_escape(4)?),
			'U' => out.push(self.hex_escape(8)?),
			other => {
				out.push('\\');
				out.push(other);
			}
		}
		Ok(())
	}

	fn hex_escape(&mut self, len: usize) -> Result<char, DecodeError> {
		let mut code = 0u32;
		for _ in 0..len {
			let digit = self
				.peek()
				.and_then(|d| d.to_digit(16))
				.ok_or_else(|| self.error(format!("truncated escape, expected {len} hex digits")))?;
			code = code * 16 + digit;
			self.bump();
		}
		self.char_from(code)
	}

	fn char_from(&self, code: u32) -> Result<char, DecodeError> {
		char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {code:#x}")))
	}

	fn parse_name(&mut self) -> Result<Value, DecodeError> {
		if let Some(raw) = self.string_prefix() {
			return self.parse_strings(raw);
		}

		let start = self.pos;
		while let Some(c) = self.peek() {
			if c.is_alphanumeric() || c == '_' {
				self.bump();
			} else {
				break;
			}
		}
		let name = &self.src[start..self.pos];

		match name {
			"True" | "true" => Ok(Value::Bool(true)),
			"False" | "false" => Ok(Value::Bool(false)),
			"None" | "null" => Ok(Value::None),
			_ => {
				self.skip_trivia();
				let message = if self.peek() == Some('(') {
					format!("function calls are not allowed: {name}(...)")
				} else {
					format!("names are not allowed in literals: {name}")
				};
				Err(DecodeError { message, offset: start })
			}
		}
	}
}

/// Underscores may only separate digits.
fn check_underscores(digits: &str, start: usize, after_prefix: bool) -> Result<(), DecodeError> {
	let leading = digits.starts_with('_') && !after_prefix;
	if leading || digits.ends_with('_') || digits.contains("__") {
		return Err(DecodeError {
			message: "invalid underscore placement in number".to_string(),
			offset: start,
		});
	}
	Ok(())
}
