//! Dynamic rows and dotted-path access
//!
//! Grid rows are plain JSON objects. Relation data fetched alongside a row
//! is nested (`{"author": {"name": "..."}}`) and addressed with dotted paths
//! such as `author.name`.

use serde_json::Map;

pub use serde_json::Value;

/// A single fetched record.
pub type Row = Map<String, Value>;

/// Resolves a dotted path inside a value.
///
/// Object members are looked up by name, array elements by numeric index.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::value::get_path;
///
/// let value = json!({"author": {"name": "Ada", "tags": ["x", "y"]}});
/// assert_eq!(get_path(&value, "author.name"), Some(&json!("Ada")));
/// assert_eq!(get_path(&value, "author.tags.1"), Some(&json!("y")));
/// assert_eq!(get_path(&value, "author.missing"), None);
/// ```
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
	if path.is_empty() {
		return Some(value);
	}
	path.split('.').try_fold(value, |current, segment| match current {
		Value::Object(map) => map.get(segment),
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	})
}

/// Resolves a dotted path inside a row.
pub fn row_get<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
	let (head, rest) = match path.split_once('.') {
		Some((head, rest)) => (head, Some(rest)),
		None => (path, None),
	};
	let first = row.get(head)?;
	match rest {
		Some(rest) => get_path(first, rest),
		None => Some(first),
	}
}

/// Sets a value at a dotted path, creating intermediate objects.
///
/// Existing arrays on the path are written into element-wise, see
/// [`set_path`]; other non-object intermediates are replaced.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::value::{Row, row_set};
///
/// let mut row = Row::new();
/// row_set(&mut row, "author.name", json!("Ada"));
/// assert_eq!(row["author"]["name"], json!("Ada"));
/// ```
pub fn row_set(row: &mut Row, path: &str, value: Value) {
	match path.split_once('.') {
		None => {
			row.insert(path.to_string(), value);
		}
		Some((head, rest)) => {
			let slot = row
				.entry(head.to_string())
				.or_insert_with(|| Value::Object(Map::new()));
			set_path(slot, rest, value);
		}
	}
}

/// Sets a value at a dotted path inside a value.
///
/// Numeric segments address existing array elements; an index past the end
/// of an array leaves it untouched. Scalars on the path become objects.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::value::set_path;
///
/// let mut author = json!({"tags": ["a", "b"]});
/// set_path(&mut author, "tags.1", json!("B"));
/// assert_eq!(author, json!({"tags": ["a", "B"]}));
/// ```
pub fn set_path(target: &mut Value, path: &str, value: Value) {
	match target {
		Value::Object(map) => row_set(map, path, value),
		Value::Array(items) => {
			let (head, rest) = match path.split_once('.') {
				Some((head, rest)) => (head, Some(rest)),
				None => (path, None),
			};
			let Some(slot) = head.parse::<usize>().ok().and_then(|index| items.get_mut(index)) else {
				return;
			};
			match rest {
				Some(rest) => set_path(slot, rest, value),
				None => *slot = value,
			}
		}
		_ => {
			let mut map = Map::new();
			row_set(&mut map, path, value);
			*target = Value::Object(map);
		}
	}
}

/// Returns the normalized identity string of a key value.
///
/// Numbers and strings compare by their textual form so that `1` and `"1"`
/// identify the same row. `null` has no identity.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::value::key_string;
///
/// assert_eq!(key_string(&json!(1)), key_string(&json!("1")));
/// assert_eq!(key_string(&json!(null)), None);
/// ```
pub fn key_string(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
		other => Some(other.to_string()),
	}
}

/// Returns true for values that count as "no input".
///
/// `null`, the empty string, and empty arrays or objects are blank.
pub fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(map) => map.is_empty(),
		_ => false,
	}
}

/// Renders a scalar as display text.
///
/// Strings are returned without quotes, `null` becomes the empty string.
pub fn display_string(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Interprets a value as a number when it is numeric or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok(),
		Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
		_ => None,
	}
}
