//! Display transforms and chain execution

use crate::column::Column;
use std::sync::Arc;
use tabula_core::html::encode_value;
use tabula_core::{Row, Value};

/// What a transform hands to the rest of the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
	/// The value passed to the next transform.
	Continue(Value),
	/// Skip every remaining transform except the last registered one, which
	/// runs on the value this transform received.
	DeferToLast,
}

impl From<Value> for TransformOutcome {
	fn from(value: Value) -> Self {
		Self::Continue(value)
	}
}

/// A display transform: `(value, column, original row) -> outcome`.
///
/// Transforms receive the raw, un-encoded value and the row as fetched.
/// Consecutive transforms must agree on the shape of the values they pass
/// along; the pipeline does not check it.
pub type Transform = Arc<dyn Fn(&Value, &Column, &Row) -> TransformOutcome + Send + Sync>;

/// Wraps a value-producing closure as a [`Transform`].
pub fn transform<F>(f: F) -> Transform
where
	F: Fn(&Value, &Column, &Row) -> Value + Send + Sync + 'static,
{
	Arc::new(move |value: &Value, column: &Column, row: &Row| {
		TransformOutcome::Continue(f(value, column, row))
	})
}

/// Runs a chain over a raw value.
///
/// The result is entity-encoded when the column escapes its output.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::sync::Arc;
/// use tabula_columns::transform::{Transform, run_chain, transform};
/// use tabula_columns::{Column, TransformOutcome};
/// use tabula_core::{Row, Value};
///
/// let column = Column::new("status", "");
/// let defer: Transform = Arc::new(|_: &Value, _: &Column, _: &Row| TransformOutcome::DeferToLast);
/// let chain = vec![
///     defer,
///     transform(|_, _, _| json!("skipped")),
///     transform(|value, _, _| json!(format!("[{}]", value.as_str().unwrap_or("")))),
/// ];
///
/// let out = run_chain(&column, &chain, json!("<ok>"), &Default::default());
/// assert_eq!(out, json!("[&lt;ok&gt;]"));
/// ```
pub fn run_chain(column: &Column, chain: &[Transform], raw: Value, row: &Row) -> Value {
	let mut value = raw;
	for (index, step) in chain.iter().enumerate() {
		match step(&value, column, row) {
			TransformOutcome::Continue(next) => value = next,
			TransformOutcome::DeferToLast => {
				let last = chain.len() - 1;
				if index < last {
					if let TransformOutcome::Continue(next) = chain[last](&value, column, row) {
						value = next;
					}
				}
				break;
			}
		}
	}

	if column.is_escaped() {
		encode_value(&value)
	} else {
		value
	}
}
