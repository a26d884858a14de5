//! Request parameter bag
//!
//! [`QueryParams`] holds the query string of a request as a nested structure,
//! the way bracket-style keys are conventionally interpreted:
//!
//! | Query string | Structure |
//! |---|---|
//! | `name=bob` | `{"name": "bob"}` |
//! | `created_at[start]=2024-01-01` | `{"created_at": {"start": "2024-01-01"}}` |
//! | `id[]=1&id[]=2` | `{"id": ["1", "2"]}` |
//!
//! Filters work on the flattened form (dotted keys such as
//! `created_at.start`), see [`QueryParams::flatten`] and
//! [`QueryParams::from_dotted`].

use crate::error::{QueryError, QueryResult};
use crate::value::{Value, display_string, is_blank, row_get, row_set};
use serde_json::Map;

/// Nested request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
	root: Map<String, Value>,
}

impl QueryParams {
	/// Creates an empty parameter bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses an `application/x-www-form-urlencoded` query string.
	///
	/// A leading `?` is ignored.
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use tabula_core::QueryParams;
	///
	/// let params = QueryParams::from_query_str("?name=bob&created_at[start]=2024-01-01").unwrap();
	/// assert_eq!(params.get("name"), Some(&json!("bob")));
	/// assert_eq!(params.get("created_at.start"), Some(&json!("2024-01-01")));
	/// ```
	pub fn from_query_str(query: &str) -> QueryResult<Self> {
		let query = query.strip_prefix('?').unwrap_or(query);
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
			.map_err(|e| QueryError::InvalidQueryString(e.to_string()))?;
		Ok(Self::from_pairs(pairs))
	}

	/// Builds parameters from decoded key/value pairs.
	///
	/// Later duplicates of a plain key overwrite earlier ones; `[]` keys append.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut root = Value::Object(Map::new());
		for (key, value) in pairs {
			let segments = parse_key(key.as_ref());
			insert_segments(&mut root, &segments, Value::String(value.into()));
		}
		match root {
			Value::Object(root) => Self { root },
			_ => Self::default(),
		}
	}

	/// Builds parameters from an already structured JSON object.
	pub fn from_value(value: Value) -> Self {
		match value {
			Value::Object(root) => Self { root },
			_ => Self::default(),
		}
	}

	/// Re-nests flattened dotted keys into a structured bag.
	///
	/// Objects whose keys are exactly `0..n` become arrays again.
	pub fn from_dotted<I, K>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: AsRef<str>,
	{
		let mut root = Value::Object(Map::new());
		for (key, value) in entries {
			let segments: Vec<String> = key.as_ref().split('.').map(str::to_string).collect();
			insert_segments(&mut root, &segments, value);
		}
		normalize_lists(&mut root);
		Self::from_value(root)
	}

	/// Looks up a value by dotted path.
	pub fn get(&self, path: &str) -> Option<&Value> {
		row_get(&self.root, path)
	}

	/// Looks up a scalar string value by dotted path.
	pub fn get_str(&self, path: &str) -> Option<&str> {
		self.get(path).and_then(Value::as_str)
	}

	/// Returns true when a non-blank value exists at the path.
	pub fn has(&self, path: &str) -> bool {
		self.get(path).is_some_and(|v| !is_blank(v))
	}

	/// Sets a value at a dotted path.
	pub fn set(&mut self, path: &str, value: Value) {
		row_set(&mut self.root, path, value);
	}

	/// Removes a top-level key.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.root.shift_remove(key)
	}

	/// Returns true when no parameter is present.
	pub fn is_empty(&self) -> bool {
		self.root.is_empty()
	}

	/// Returns the structured parameters.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.root
	}

	/// Flattens the nested structure into dotted keys.
	///
	/// Empty arrays and objects are kept as leaves so callers can decide how
	/// to treat them.
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use tabula_core::QueryParams;
	///
	/// let params = QueryParams::from_query_str("a[b]=1&ids[]=7&ids[]=8").unwrap();
	/// let flat = params.flatten();
	/// assert_eq!(flat, vec![
	///     ("a.b".to_string(), json!("1")),
	///     ("ids.0".to_string(), json!("7")),
	///     ("ids.1".to_string(), json!("8")),
	/// ]);
	/// ```
	pub fn flatten(&self) -> Vec<(String, Value)> {
		let mut out = Vec::new();
		for (key, value) in &self.root {
			flatten_into(key.clone(), value, &mut out);
		}
		out
	}

	/// Serializes the parameters back to a query string with bracket keys.
	pub fn to_query_string(&self) -> String {
		serde_urlencoded::to_string(self.to_pairs()).unwrap_or_default()
	}

	/// Returns the parameters as bracket-keyed pairs.
	pub fn to_pairs(&self) -> Vec<(String, String)> {
		self.flatten()
			.into_iter()
			.map(|(dotted, value)| (bracket_key(&dotted), display_string(&value)))
			.collect()
	}
}

/// Converts a dotted key into bracket syntax (`a.b.0` → `a[b][0]`).
pub fn bracket_key(dotted: &str) -> String {
	let mut parts = dotted.split('.');
	let mut key = parts.next().unwrap_or_default().to_string();
	for part in parts {
		key.push('[');
		key.push_str(part);
		key.push(']');
	}
	key
}

/// Splits a bracket-style key into path segments.
///
/// `a[b][]` yields `["a", "b", ""]`. Keys with unbalanced brackets are kept
/// whole.
pub fn parse_key(key: &str) -> Vec<String> {
	let Some(open) = key.find('[') else {
		return vec![key.to_string()];
	};
	if open == 0 || !key.ends_with(']') {
		return vec![key.to_string()];
	}
	let mut segments = vec![key[..open].to_string()];
	let mut rest = &key[open..];
	while let Some(stripped) = rest.strip_prefix('[') {
		let Some(close) = stripped.find(']') else {
			return vec![key.to_string()];
		};
		segments.push(stripped[..close].to_string());
		rest = &stripped[close + 1..];
	}
	if !rest.is_empty() {
		return vec![key.to_string()];
	}
	segments
}

fn insert_segments(target: &mut Value, segments: &[String], value: Value) {
	let Some((head, rest)) = segments.split_first() else {
		*target = value;
		return;
	};
	if head.is_empty() {
		if !target.is_array() {
			*target = Value::Array(Vec::new());
		}
		if let Value::Array(items) = target {
			items.push(Value::Null);
			if let Some(last) = items.last_mut() {
				insert_segments(last, rest, value);
			}
		}
		return;
	}
	if !target.is_object() {
		*target = Value::Object(Map::new());
	}
	if let Value::Object(map) = target {
		let slot = map.entry(head.clone()).or_insert(Value::Null);
		insert_segments(slot, rest, value);
	}
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, Value)>) {
	match value {
		Value::Object(map) if !map.is_empty() => {
			for (key, child) in map {
				flatten_into(format!("{prefix}.{key}"), child, out);
			}
		}
		Value::Array(items) if !items.is_empty() => {
			for (index, child) in items.iter().enumerate() {
				flatten_into(format!("{prefix}.{index}"), child, out);
			}
		}
		leaf => out.push((prefix, leaf.clone())),
	}
}

fn normalize_lists(value: &mut Value) {
	match value {
		Value::Object(map) => {
			for child in map.values_mut() {
				normalize_lists(child);
			}
			let sequential = !map.is_empty()
				&& map
					.keys()
					.enumerate()
					.all(|(index, key)| key.parse::<usize>().ok() == Some(index));
			if sequential {
				let items = std::mem::take(map).into_iter().map(|(_, v)| v).collect();
				*value = Value::Array(items);
			}
		}
		Value::Array(items) => items.iter_mut().for_each(normalize_lists),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("name", vec!["name"])]
	#[case("a[b]", vec!["a", "b"])]
	#[case("ids[]", vec!["ids", ""])]
	#[case("a[b][c]", vec!["a", "b", "c"])]
	#[case("a[b", vec!["a[b"])]
	#[case("[x]", vec!["[x]"])]
	fn test_parse_key(#[case] key: &str, #[case] expected: Vec<&str>) {
		assert_eq!(parse_key(key), expected);
	}

	#[rstest]
	fn test_from_pairs_builds_lists() {
		// Arrange
		let pairs = vec![("ids[]", "1"), ("ids[]", "2"), ("name", "bob")];

		// Act
		let params = QueryParams::from_pairs(pairs);

		// Assert
		assert_eq!(params.get("ids"), Some(&json!(["1", "2"])));
		assert_eq!(params.get_str("name"), Some("bob"));
	}

	#[rstest]
	fn test_from_dotted_restores_lists() {
		let params = QueryParams::from_dotted(vec![
			("ids.0", json!("1")),
			("ids.1", json!("2")),
			("range.start", json!("a")),
		]);

		assert_eq!(params.get("ids"), Some(&json!(["1", "2"])));
		assert_eq!(params.get("range"), Some(&json!({"start": "a"})));
	}

	#[rstest]
	fn test_to_query_string_uses_bracket_keys() {
		let params = QueryParams::from_query_str("a[b]=1&c=x%20y").unwrap();

		let query = params.to_query_string();

		assert_eq!(query, "a%5Bb%5D=1&c=x+y");
	}
}
