use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A decoded literal value.
///
/// Values have a total order (floats compare with [`f64::total_cmp`]) so that
/// they can key mappings and populate sets.
#[derive(Debug, Clone)]
pub enum Value {
	None,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	List(Vec<Value>),
	Tuple(Vec<Value>),
	Set(BTreeSet<Value>),
	Dict(BTreeMap<Value, Value>),
}

impl Value {
	/// Short name of the value's kind, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::None => "none",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Str(_) => "str",
			Value::List(_) => "list",
			Value::Tuple(_) => "tuple",
			Value::Set(_) => "set",
			Value::Dict(_) => "dict",
		}
	}

	/// Whether the value may be used as a mapping key or set member.
	///
	/// Mutable containers are not hashable, and neither is a tuple holding one.
	pub fn is_hashable(&self) -> bool {
		match self {
			Value::List(_) | Value::Set(_) | Value::Dict(_) => false,
			Value::Tuple(items) => items.iter().all(Value::is_hashable),
			_ => true,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Float(f) => Some(*f),
			Value::Int(n) => Some(*n as f64),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Items of a list, tuple or set, in order.
	pub fn as_seq(&self) -> Option<Vec<&Value>> {
		match self {
			Value::List(items) | Value::Tuple(items) => Some(items.iter().collect()),
			Value::Set(items) => Some(items.iter().collect()),
			_ => None,
		}
	}

	pub fn as_dict(&self) -> Option<&BTreeMap<Value, Value>> {
		match self {
			Value::Dict(map) => Some(map),
			_ => None,
		}
	}

	/// Look up a string key in a mapping value.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_dict()?.get(&Value::Str(key.to_string()))
	}

	fn rank(&self) -> u8 {
		match self {
			Value::None => 0,
			Value::Bool(_) => 1,
			Value::Int(_) => 2,
			Value::Float(_) => 3,
			Value::Str(_) => 4,
			Value::List(_) => 5,
			Value::Tuple(_) => 6,
			Value::Set(_) => 7,
			Value::Dict(_) => 8,
		}
	}
}

impl Ord for Value {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Value::None, Value::None) => Ordering::Equal,
			(Value::Bool(a), Value::Bool(b)) => a.cmp(b),
			(Value::Int(a), Value::Int(b)) => a.cmp(b),
			// zeros of either sign are one key
			(Value::Float(a), Value::Float(b)) if a == b => Ordering::Equal,
			(Value::Float(a), Value::Float(b)) => a.total_cmp(b),
			(Value::Str(a), Value::Str(b)) => a.cmp(b),
			(Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
			(Value::Set(a), Value::Set(b)) => a.cmp(b),
			(Value::Dict(a), Value::Dict(b)) => a.cmp(b),
			_ => self.rank().cmp(&other.rank()),
		}
	}
}

impl PartialOrd for Value {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Value {}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Value::Int(n)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Value::List(items.into_iter().map(Into::into).collect())
	}
}

/// Formats the value as literal text that decodes back to an equal value.
impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::None => f.write_str("None"),
			Value::Bool(true) => f.write_str("True"),
			Value::Bool(false) => f.write_str("False"),
			Value::Int(n) => write!(f, "{n}"),
			Value::Float(x) => write!(f, "{x:?}"),
			Value::Str(s) => write_quoted(f, s),
			Value::List(items) => {
				f.write_str("[")?;
				write_items(f, items.iter())?;
				f.write_str("]")
			}
			Value::Tuple(items) => {
				f.write_str("(")?;
				write_items(f, items.iter())?;
				if items.len() == 1 {
					f.write_str(",")?;
				}
				f.write_str(")")
			}
			// there is no literal spelling of an empty set
			Value::Set(items) if items.is_empty() => f.write_str("set()"),
			Value::Set(items) => {
				f.write_str("{")?;
				write_items(f, items.iter())?;
				f.write_str("}")
			}
			Value::Dict(map) => {
				f.write_str("{")?;
				for (i, (key, value)) in map.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{key}: {value}")?;
				}
				f.write_str("}")
			}
		}
	}
}

fn write_items<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a Value>) -> fmt::Result {
	for (i, item) in items.enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		write!(f, "{item}")?;
	}
	Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
	f.write_str("'")?;
	for c in s.chars() {
		match c {
			'\\' => f.write_str("\\\\")?,
			'\'' => f.write_str("\\'")?,
			'\n' => f.write_str("\\n")?,
			'\r' => f.write_str("\\r")?,
			'\t' => f.write_str("\\t")?,
			c if (c as u32) < 0x20 || c == '\x7f' => write!(f, "\\x{:02x}", c as u32)?,
			c => write!(f, "{c}")?,
		}
	}
	f.write_str("'")
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Value::None => serializer.serialize_none(),
			Value::Bool(b) => serializer.serialize_bool(*b),
			Value::Int(n) => serializer.serialize_i64(*n),
			Value::Float(x) => serializer.serialize_f64(*x),
			Value::Str(s) => serializer.serialize_str(s),
			Value::List(items) | Value::Tuple(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			Value::Set(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			Value::Dict(map) => {
				// Text formats only accept string keys; other keys use their literal text.
				let mut out = serializer.serialize_map(Some(map.len()))?;
				for (key, value) in map {
					match key {
						Value::Str(s) => out.serialize_entry(s, value)?,
						other => out.serialize_entry(&other.to_string(), value)?,
					}
				}
				out.end()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_scalars() {
		assert_eq!(Value::None.to_string(), "None");
		assert_eq!(Value::Bool(true).to_string(), "True");
		assert_eq!(Value::Int(-42).to_string(), "-42");
		assert_eq!(Value::Float(1.0).to_string(), "1.0");
		assert_eq!(Value::Float(0.25).to_string(), "0.25");
	}

	#[test]
	fn test_display_escapes_strings() {
		let value = Value::from("it's a\ttab\n");
		assert_eq!(value.to_string(), r"'it\'s a\ttab\n'");
	}

	#[test]
	fn test_display_single_element_tuple() {
		let value = Value::Tuple(vec![Value::Int(1)]);
		assert_eq!(value.to_string(), "(1,)");
		assert_eq!(Value::Tuple(vec![]).to_string(), "()");
	}

	#[test]
	fn test_ordering_across_kinds() {
		assert!(Value::None < Value::Bool(false));
		assert!(Value::Int(100) < Value::Float(0.0));
		assert!(Value::from("a") < Value::from("b"));
		assert_ne!(Value::Int(1), Value::Float(1.0));
		assert_eq!(Value::Float(0.0), Value::Float(-0.0));
		assert!(Value::Float(-1.0) < Value::Float(-0.0));
	}

	#[test]
	fn test_hashable() {
		assert!(Value::Tuple(vec![Value::Int(1), Value::from("a")]).is_hashable());
		assert!(!Value::Tuple(vec![Value::List(vec![])]).is_hashable());
		assert!(!Value::Dict(BTreeMap::new()).is_hashable());
	}

	#[test]
	fn test_serialize_json() {
		let mut map = BTreeMap::new();
		map.insert(Value::from("numbers"), Value::from(vec![4_i64, 8, 12]));
		map.insert(Value::Int(1), Value::None);
		let json = serde_json::to_string(&Value::Dict(map)).unwrap();
		assert_eq!(json, r#"{"1":null,"numbers":[4,8,12]}"#);
	}
}
