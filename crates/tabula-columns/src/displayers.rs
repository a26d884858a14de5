//! Built-in displayers
//!
//! | Name | Arguments | Output |
//! |---|---|---|
//! | `label` | style (`success`) | `<span class='label label-{style}'>` per value |
//! | `badge` | style (`red`) | `<span class='badge bg-{style}'>` per value |
//! | `link` | href (the value), target (`_blank`) | `<a>` element |
//! | `icon` | value → icon map, default icon | `<i class="fa fa-{icon}">` |
//! | `bool` | value → bool map, default | check or cross icon |
//! | `limit` | length (`100`), end (`...`) | truncated text |
//! | `upper` / `lower` | | case-converted text |
//! | `join` | separator (`,`) | list joined into text |
//!
//! Markup displayers escape the values they embed and turn off the column's
//! output escaping.

use crate::column::Column;
use crate::error::{ColumnError, ColumnResult};
use crate::transform::{Transform, TransformOutcome};
use std::sync::Arc;
use tabula_core::html::escape;
use tabula_core::value::{as_number, display_string, key_string};
use tabula_core::{Row, Value};

/// Builds a displayer from call arguments.
pub type DisplayerFactory = Arc<dyn Fn(&[Value]) -> ColumnResult<Displayer> + Send + Sync>;

/// A transform produced by a displayer call.
#[derive(Clone)]
pub struct Displayer {
	transform: Transform,
	markup: bool,
}

impl Displayer {
	/// A displayer producing plain text; the column keeps escaping.
	pub fn text<F>(f: F) -> Self
	where
		F: Fn(&Value, &Column, &Row) -> Value + Send + Sync + 'static,
	{
		Self {
			transform: wrap(f),
			markup: false,
		}
	}

	/// A displayer producing HTML; the column stops escaping.
	pub fn markup<F>(f: F) -> Self
	where
		F: Fn(&Value, &Column, &Row) -> Value + Send + Sync + 'static,
	{
		Self {
			transform: wrap(f),
			markup: true,
		}
	}

	/// The transform appended to the column chain.
	pub fn transform(&self) -> &Transform {
		&self.transform
	}

	/// Returns true when the output is HTML.
	pub fn is_markup(&self) -> bool {
		self.markup
	}

	pub(crate) fn into_parts(self) -> (Transform, bool) {
		(self.transform, self.markup)
	}
}

impl std::fmt::Debug for Displayer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Displayer")
			.field("markup", &self.markup)
			.finish_non_exhaustive()
	}
}

fn wrap<F>(f: F) -> Transform
where
	F: Fn(&Value, &Column, &Row) -> Value + Send + Sync + 'static,
{
	Arc::new(move |value: &Value, column: &Column, row: &Row| {
		TransformOutcome::Continue(f(value, column, row))
	})
}

fn factory<F>(f: F) -> DisplayerFactory
where
	F: Fn(&[Value]) -> ColumnResult<Displayer> + Send + Sync + 'static,
{
	Arc::new(f)
}

pub(crate) fn builtin_displayers() -> Vec<(&'static str, DisplayerFactory)> {
	vec![
		("label", factory(|args| Ok(label(args)))),
		("badge", factory(|args| Ok(badge(args)))),
		("link", factory(|args| Ok(link(args)))),
		("icon", factory(icon)),
		("bool", factory(boolean)),
		("limit", factory(limit)),
		("upper", factory(|_| Ok(Displayer::text(|value, _, _| map_text(value, str::to_uppercase))))),
		("lower", factory(|_| Ok(Displayer::text(|value, _, _| map_text(value, str::to_lowercase))))),
		("join", factory(|args| Ok(join(args)))),
	]
}

fn arg_string(args: &[Value], index: usize, default: &str) -> String {
	args.get(index)
		.map(display_string)
		.filter(|s| !s.is_empty())
		.unwrap_or_else(|| default.to_string())
}

fn items(value: &Value) -> Vec<String> {
	match value {
		Value::Array(items) => items.iter().map(display_string).collect(),
		Value::Null => Vec::new(),
		other => vec![display_string(other)],
	}
}

fn label(args: &[Value]) -> Displayer {
	let style = arg_string(args, 0, "success");
	Displayer::markup(move |value, _, _| {
		let spans: Vec<String> = items(value)
			.iter()
			.map(|item| format!("<span class='label label-{}'>{}</span>", escape(&style), escape(item)))
			.collect();
		Value::String(spans.join("&nbsp;"))
	})
}

fn badge(args: &[Value]) -> Displayer {
	let style = arg_string(args, 0, "red");
	Displayer::markup(move |value, _, _| {
		let spans: Vec<String> = items(value)
			.iter()
			.map(|item| format!("<span class='badge bg-{}'>{}</span>", escape(&style), escape(item)))
			.collect();
		Value::String(spans.join("&nbsp;"))
	})
}

fn link(args: &[Value]) -> Displayer {
	let href = arg_string(args, 0, "");
	let target = arg_string(args, 1, "_blank");
	Displayer::markup(move |value, _, _| {
		let text = display_string(value);
		let href = if href.is_empty() { text.clone() } else { href.clone() };
		Value::String(format!(
			"<a href='{}' target='{}'>{}</a>",
			escape(&href),
			escape(&target),
			escape(&text)
		))
	})
}

fn icon(args: &[Value]) -> ColumnResult<Displayer> {
	let mapping = match args.first() {
		None | Some(Value::Null) => Default::default(),
		Some(Value::Object(mapping)) => mapping.clone(),
		Some(_) => {
			return Err(ColumnError::InvalidArguments {
				displayer: "icon".to_string(),
				reason: "expected an object mapping values to icon names".to_string(),
			});
		}
	};
	let default = arg_string(args, 1, "");
	Ok(Displayer::markup(move |value, _, _| {
		let name = key_string(value)
			.and_then(|key| mapping.get(&key).map(display_string))
			.unwrap_or_else(|| default.clone());
		Value::String(format!("<i class=\"fa fa-{}\"></i>", escape(&name)))
	}))
}

fn boolean(args: &[Value]) -> ColumnResult<Displayer> {
	let mapping = match args.first() {
		None | Some(Value::Null) => None,
		Some(Value::Object(mapping)) if mapping.is_empty() => None,
		Some(Value::Object(mapping)) => Some(mapping.clone()),
		Some(_) => {
			return Err(ColumnError::InvalidArguments {
				displayer: "bool".to_string(),
				reason: "expected an object mapping values to booleans".to_string(),
			});
		}
	};
	let default = args.get(1).is_some_and(truthy);
	Ok(Displayer::markup(move |value, _, _| {
		let on = match &mapping {
			None => truthy(value),
			Some(mapping) => key_string(value)
				.and_then(|key| mapping.get(&key).map(truthy))
				.unwrap_or(default),
		};
		let html = if on {
			"<i class=\"fa fa-check text-green\"></i>"
		} else {
			"<i class=\"fa fa-close text-red\"></i>"
		};
		Value::String(html.to_string())
	}))
}

fn limit(args: &[Value]) -> ColumnResult<Displayer> {
	let length = match args.first() {
		None | Some(Value::Null) => 100,
		Some(arg) => as_number(arg)
			.filter(|n| *n >= 0.0)
			.map(|n| n as usize)
			.ok_or_else(|| ColumnError::InvalidArguments {
				displayer: "limit".to_string(),
				reason: format!("length must be a non-negative number, got {arg}"),
			})?,
	};
	let end = arg_string(args, 1, "...");
	Ok(Displayer::text(move |value, _, _| match value {
		Value::String(text) if text.chars().count() > length => {
			let cut: String = text.chars().take(length).collect();
			Value::String(format!("{}{end}", cut.trim_end()))
		}
		other => other.clone(),
	}))
}

fn join(args: &[Value]) -> Displayer {
	let separator = arg_string(args, 0, ",");
	Displayer::text(move |value, _, _| match value {
		Value::Array(_) => Value::String(items(value).join(&separator)),
		other => other.clone(),
	})
}

fn map_text(value: &Value, f: fn(&str) -> String) -> Value {
	match value {
		Value::String(text) => Value::String(f(text)),
		other => other.clone(),
	}
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::String(s) => !s.is_empty() && s != "0",
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transform::run_chain;
	use rstest::rstest;
	use serde_json::json;

	fn render(displayer: Displayer, value: Value) -> Value {
		let mut column = Column::new("cell", "");
		let (transform, markup) = displayer.into_parts();
		column.escape(!markup);
		run_chain(&column, &[transform], value, &Row::new())
	}

	#[rstest]
	#[case(vec![], json!("ok"), "<span class='label label-success'>ok</span>")]
	#[case(vec![json!("info")], json!(["a", "b"]), "<span class='label label-info'>a</span>&nbsp;<span class='label label-info'>b</span>")]
	#[case(vec![], json!("<x>"), "<span class='label label-success'>&lt;x&gt;</span>")]
	fn test_label(#[case] args: Vec<Value>, #[case] value: Value, #[case] expected: &str) {
		assert_eq!(render(label(&args), value), json!(expected));
	}

	#[rstest]
	fn test_link_defaults_to_value() {
		let out = render(link(&[]), json!("https://example.com"));

		assert_eq!(
			out,
			json!("<a href='https://example.com' target='_blank'>https://example.com</a>")
		);
	}

	#[rstest]
	#[case(json!(1), "check")]
	#[case(json!("0"), "close")]
	#[case(json!(null), "close")]
	fn test_bool_truthiness(#[case] value: Value, #[case] icon: &str) {
		let out = render(boolean(&[]).unwrap(), value);

		assert!(out.as_str().unwrap().contains(&format!("fa-{icon}")));
	}

	#[rstest]
	fn test_bool_with_mapping() {
		let displayer = boolean(&[json!({"yes": true, "no": false})]).unwrap();

		assert!(render(displayer.clone(), json!("yes")).as_str().unwrap().contains("fa-check"));
		assert!(render(displayer, json!("maybe")).as_str().unwrap().contains("fa-close"));
	}

	#[rstest]
	#[case(vec![json!(5)], json!("Hello world"), json!("Hello..."))]
	#[case(vec![json!(5), json!("!")], json!("Hi"), json!("Hi"))]
	#[case(vec![json!(3)], json!(42), json!(42))]
	fn test_limit(#[case] args: Vec<Value>, #[case] value: Value, #[case] expected: Value) {
		assert_eq!(render(limit(&args).unwrap(), value), expected);
	}

	#[rstest]
	fn test_limit_rejects_bad_length() {
		assert!(matches!(
			limit(&[json!("many")]),
			Err(ColumnError::InvalidArguments { .. })
		));
	}

	#[rstest]
	fn test_icon_mapping_and_default() {
		let displayer = icon(&[json!({"1": "check"}), json!("question")]).unwrap();

		assert_eq!(render(displayer.clone(), json!(1)), json!("<i class=\"fa fa-check\"></i>"));
		assert_eq!(render(displayer, json!(2)), json!("<i class=\"fa fa-question\"></i>"));
	}

	#[rstest]
	fn test_join_lists_only() {
		assert_eq!(render(join(&[json!(" | ")]), json!(["a", 1])), json!("a | 1"));
		assert_eq!(render(join(&[]), json!("solo")), json!("solo"));
	}
}
