//! HTML escaping for cell values

use crate::value::Value;

/// The entity replacing a character that must not reach markup raw.
fn entity(ch: char) -> Option<&'static str> {
	match ch {
		'&' => Some("&amp;"),
		'<' => Some("&lt;"),
		'>' => Some("&gt;"),
		'"' => Some("&quot;"),
		'\'' => Some("&#x27;"),
		_ => None,
	}
}

/// Entity-encodes a cell string for text and attribute positions.
///
/// # Examples
///
/// ```
/// use tabula_core::html::escape;
///
/// assert_eq!(escape("Ada"), "Ada");
/// assert_eq!(escape("<a href='x'>"), "&lt;a href=&#x27;x&#x27;&gt;");
/// ```
pub fn escape(text: &str) -> String {
	let Some(first) = text.find(|ch: char| entity(ch).is_some()) else {
		return text.to_string();
	};
	let (clean, rest) = text.split_at(first);
	let mut escaped = String::with_capacity(text.len() + 16);
	escaped.push_str(clean);
	for ch in rest.chars() {
		match entity(ch) {
			Some(entity) => escaped.push_str(entity),
			None => escaped.push(ch),
		}
	}
	escaped
}

/// Entity-encodes every string inside a value, recursively.
///
/// Numbers, booleans and `null` are returned unchanged.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::html::encode_value;
///
/// let encoded = encode_value(&json!({"tags": ["<a>", 1]}));
/// assert_eq!(encoded, json!({"tags": ["&lt;a&gt;", 1]}));
/// ```
pub fn encode_value(value: &Value) -> Value {
	match value {
		Value::String(s) => Value::String(escape(s)),
		Value::Array(items) => Value::Array(items.iter().map(encode_value).collect()),
		Value::Object(map) => Value::Object(
			map.iter()
				.map(|(key, child)| (key.clone(), encode_value(child)))
				.collect(),
		),
		other => other.clone(),
	}
}
