//! Grid columns

use crate::displayers::Displayer;
use crate::error::ColumnResult;
use crate::registry::{self, DisplayerRegistry};
use crate::transform::{Transform, TransformOutcome, transform};
use std::fmt;
use std::sync::Arc;
use tabula_core::label::humanize;
use tabula_core::value::key_string;
use tabula_core::{Direction, QueryBuilder, Row, Value};

/// Orders a query for a column sorted by a custom rule.
pub type SortCallback = Arc<dyn Fn(&mut dyn QueryBuilder, Direction) + Send + Sync>;

/// One output column: where its value comes from, how it is displayed and
/// how it sorts.
///
/// Configuration methods take `&mut self` and return it, so a column can be
/// set up in one chain after [`ColumnPipeline::column`](crate::ColumnPipeline::column).
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_columns::Column;
///
/// let mut column = Column::new("user_name", "");
/// column.sortable().using([("a", "Admin")], json!("Guest"));
///
/// assert_eq!(column.label(), "User name");
/// assert!(column.is_sortable());
/// assert_eq!(column.transforms().len(), 1);
/// ```
#[derive(Clone)]
pub struct Column {
	name: String,
	label: String,
	relation: Option<String>,
	relation_column: Option<String>,
	sortable: bool,
	sort_name: Option<String>,
	cast: Option<String>,
	sort_callback: Option<SortCallback>,
	transforms: Vec<Transform>,
	escape: bool,
}

impl Column {
	/// Creates a column reading `name`, a dotted path for nested values.
	///
	/// An empty label is derived from the name.
	pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
		let name = name.into();
		let label = format_label(&name, label.into());
		Self {
			name,
			label,
			relation: None,
			relation_column: None,
			sortable: false,
			sort_name: None,
			cast: None,
			sort_callback: None,
			transforms: Vec::new(),
			escape: true,
		}
	}

	/// Creates a column over a related record.
	///
	/// Without a sub-column, the first [`call`](Self::call) names it: the
	/// column then reads `relation.{name}`.
	///
	/// # Examples
	///
	/// ```
	/// use tabula_columns::Column;
	///
	/// let mut column = Column::relation("author", None);
	/// column.call("name", vec![]).unwrap();
	///
	/// assert_eq!(column.name(), "author.name");
	/// assert_eq!(column.label(), "Author name");
	/// assert!(column.transforms().is_empty());
	/// ```
	pub fn relation(relation: impl Into<String>, column: Option<&str>) -> Self {
		let relation = relation.into();
		let name = match column {
			Some(sub) => format!("{relation}.{sub}"),
			None => relation.clone(),
		};
		let mut built = Self::new(name, "");
		built.relation = Some(relation);
		built.relation_column = column.map(str::to_string);
		built
	}

	/// Path the value is read from.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Header text.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Replaces the header text; an empty label is derived from the name.
	pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
		self.label = format_label(&self.name, label.into());
		self
	}

	/// Relation name for relation columns.
	pub fn relation_name(&self) -> Option<&str> {
		self.relation.as_deref()
	}

	/// Sub-column of the relation, once bound.
	pub fn relation_column(&self) -> Option<&str> {
		self.relation_column.as_deref()
	}

	/// Calls a displayer by name from the process-wide registry.
	///
	/// For a relation column without a sub-column the first call binds
	/// `name` as the sub-column instead; its first argument, when present,
	/// becomes the label.
	pub fn call(&mut self, name: &str, args: Vec<Value>) -> ColumnResult<&mut Self> {
		self.call_with(registry::global(), name, args)
	}

	/// Like [`call`](Self::call), resolving displayers in `registry`.
	pub fn call_with(
		&mut self,
		registry: &DisplayerRegistry,
		name: &str,
		args: Vec<Value>,
	) -> ColumnResult<&mut Self> {
		if let Some(relation) = &self.relation {
			if self.relation_column.is_none() {
				self.name = format!("{relation}.{name}");
				let label = args.first().and_then(Value::as_str).unwrap_or_default();
				self.label = format_label(&self.name, label.to_string());
				self.relation_column = Some(name.to_string());
				return Ok(self);
			}
		}

		let displayer = registry.resolve(name, &args)?;
		Ok(self.push_displayer(displayer))
	}

	/// Appends a displayer; markup displayers turn escaping off.
	pub fn push_displayer(&mut self, displayer: Displayer) -> &mut Self {
		let (transform, markup) = displayer.into_parts();
		self.transforms.push(transform);
		if markup {
			self.escape = false;
		}
		self
	}

	/// Appends a value-producing transform.
	pub fn display<F>(&mut self, f: F) -> &mut Self
	where
		F: Fn(&Value, &Column, &Row) -> Value + Send + Sync + 'static,
	{
		self.transforms.push(transform(f));
		self
	}

	/// Appends a transform that may short-circuit the chain.
	pub fn display_with<F>(&mut self, f: F) -> &mut Self
	where
		F: Fn(&Value, &Column, &Row) -> TransformOutcome + Send + Sync + 'static,
	{
		self.transforms.push(Arc::new(f));
		self
	}

	/// Appends a prepared transform.
	pub fn push_transform(&mut self, transform: Transform) -> &mut Self {
		self.transforms.push(transform);
		self
	}

	/// Maps values through a table; `null` and unknown values become
	/// `default`.
	pub fn using<I, K, V>(&mut self, values: I, default: Value) -> &mut Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		let table = collect_map(values);
		self.display(move |value, _, _| {
			key_string(value)
				.and_then(|key| table.get(&key).cloned())
				.unwrap_or_else(|| default.clone())
		})
	}

	/// Replaces values found in the table and keeps the others.
	pub fn replace<I, K, V>(&mut self, replacements: I) -> &mut Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		let table = collect_map(replacements);
		self.display(move |value, _, _| {
			key_string(value)
				.and_then(|key| table.get(&key).cloned())
				.unwrap_or_else(|| value.clone())
		})
	}

	/// Sets whether the chain output is entity-encoded.
	pub fn escape(&mut self, escape: bool) -> &mut Self {
		self.escape = escape;
		self
	}

	/// Returns true when the chain output is entity-encoded.
	pub fn is_escaped(&self) -> bool {
		self.escape
	}

	/// Registered transforms, in order.
	pub fn transforms(&self) -> &[Transform] {
		&self.transforms
	}

	/// Drops every registered transform.
	pub fn clear_transforms(&mut self) -> &mut Self {
		self.transforms.clear();
		self
	}

	/// Marks the column sortable.
	pub fn sortable(&mut self) -> &mut Self {
		self.sortable = true;
		self
	}

	/// Sets whether the column is sortable.
	pub fn sort(&mut self, sortable: bool) -> &mut Self {
		self.sortable = sortable;
		self
	}

	/// Returns true when the column can be sorted.
	pub fn is_sortable(&self) -> bool {
		self.sortable
	}

	/// Sorts by another column than the one displayed.
	pub fn sort_name(&mut self, name: impl Into<String>) -> &mut Self {
		self.sort_name = Some(name.into());
		self
	}

	/// Column the query is ordered by.
	pub fn sort_column(&self) -> &str {
		self.sort_name.as_deref().unwrap_or(&self.name)
	}

	/// Returns true when an explicit sort column was set.
	pub fn has_sort_name(&self) -> bool {
		self.sort_name.is_some()
	}

	/// Casts the column to `cast` before ordering, e.g. `unsigned`.
	pub fn cast(&mut self, cast: impl Into<String>) -> &mut Self {
		self.cast = Some(cast.into());
		self
	}

	/// The sort cast, if any.
	pub fn get_cast(&self) -> Option<&str> {
		self.cast.as_deref()
	}

	/// Orders the query with a custom rule instead of by column.
	pub fn sort_callback<F>(&mut self, callback: F) -> &mut Self
	where
		F: Fn(&mut dyn QueryBuilder, Direction) + Send + Sync + 'static,
	{
		self.sort_callback = Some(Arc::new(callback));
		self
	}

	/// The custom sort rule, if any.
	pub fn get_sort_callback(&self) -> Option<&SortCallback> {
		self.sort_callback.as_ref()
	}
}

impl fmt::Debug for Column {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Column")
			.field("name", &self.name)
			.field("label", &self.label)
			.field("relation", &self.relation)
			.field("relation_column", &self.relation_column)
			.field("sortable", &self.sortable)
			.field("sort_name", &self.sort_name)
			.field("cast", &self.cast)
			.field("transforms", &self.transforms.len())
			.field("escape", &self.escape)
			.finish_non_exhaustive()
	}
}

fn format_label(name: &str, label: String) -> String {
	if label.is_empty() {
		humanize(name)
	} else {
		label
	}
}

fn collect_map<I, K, V>(entries: I) -> std::collections::HashMap<String, Value>
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<Value>,
{
	entries
		.into_iter()
		.map(|(key, value)| (key.into(), value.into()))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transform::run_chain;
	use rstest::rstest;
	use serde_json::json;

	fn render(column: &Column, value: Value) -> Value {
		run_chain(column, column.transforms(), value, &Row::new())
	}

	#[rstest]
	#[case("", "created_at", "Created at")]
	#[case("", "author.name", "Author name")]
	#[case("Posted", "created_at", "Posted")]
	fn test_label_formatting(#[case] label: &str, #[case] name: &str, #[case] expected: &str) {
		assert_eq!(Column::new(name, label).label(), expected);
	}

	#[rstest]
	fn test_relation_binds_once() {
		// Arrange
		let mut column = Column::relation("author", None);

		// Act
		column.call("name", vec![json!("Writer")]).unwrap();
		column.call("upper", vec![]).unwrap();

		// Assert
		assert_eq!(column.name(), "author.name");
		assert_eq!(column.label(), "Writer");
		assert_eq!(column.relation_column(), Some("name"));
		assert_eq!(column.transforms().len(), 1);
	}

	#[rstest]
	fn test_unknown_displayer_fails() {
		let mut column = Column::new("title", "");

		let result = column.call("sparkle", vec![]);

		assert!(result.is_err());
	}

	#[rstest]
	fn test_markup_displayer_disables_escape() {
		let mut column = Column::new("status", "");

		column.call("badge", vec![json!("green")]).unwrap();

		assert!(!column.is_escaped());
	}

	#[rstest]
	#[case(json!(1), json!("On"))]
	#[case(json!("0"), json!("Off"))]
	#[case(json!(null), json!("Unknown"))]
	#[case(json!(7), json!("Unknown"))]
	fn test_using(#[case] value: Value, #[case] expected: Value) {
		let mut column = Column::new("state", "");
		column.using([("1", "On"), ("0", "Off")], json!("Unknown"));

		assert_eq!(render(&column, value), expected);
	}

	#[rstest]
	fn test_replace_keeps_unmatched() {
		let mut column = Column::new("state", "");
		column.replace([("draft", "Draft")]);

		assert_eq!(render(&column, json!("draft")), json!("Draft"));
		assert_eq!(render(&column, json!("live")), json!("live"));
	}

	#[rstest]
	fn test_sort_column() {
		let mut column = Column::new("author.name", "");
		assert_eq!(column.sort_column(), "author.name");

		column.sort_name("author_name");

		assert_eq!(column.sort_column(), "author_name");
		assert!(column.has_sort_name());
	}
}
