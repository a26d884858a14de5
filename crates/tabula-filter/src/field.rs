//! Filter fields
//!
//! A [`FilterField`] is one control of the filter panel. Given the request
//! parameters it produces at most one [`Condition`].

use crate::condition::{Condition, Operator, RawPredicate};
use std::fmt;
use std::sync::Arc;
use tabula_core::label::humanize;
use tabula_core::value::is_blank;
use tabula_core::{Connector, QueryBuilder, QueryParams, Value};

/// How a field turns its request value into a condition.
#[derive(Clone)]
pub enum FilterKind {
	/// A single-operator comparison (`equal`, `like`, `in`, `year`, ...).
	Compare(Operator),
	/// A range read from `{column}.start` / `{column}.end`.
	Between,
	/// A caller predicate receiving the request value.
	Where(RawPredicate),
	/// Nested fields bracketed together and joined by a connector.
	Group {
		/// Member fields, in declaration order.
		members: Vec<FilterField>,
		/// Connector joining the member conditions.
		connector: Connector,
	},
	/// A fixed value rendered as a hidden input; never filters.
	Hidden(Value),
}

impl fmt::Debug for FilterKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FilterKind::Compare(op) => f.debug_tuple("Compare").field(op).finish(),
			FilterKind::Between => f.write_str("Between"),
			FilterKind::Where(_) => f.write_str("Where"),
			FilterKind::Group { members, connector } => f
				.debug_struct("Group")
				.field("members", members)
				.field("connector", connector)
				.finish(),
			FilterKind::Hidden(value) => f.debug_tuple("Hidden").field(value).finish(),
		}
	}
}

/// One named, typed filter control.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::QueryParams;
/// use tabula_filter::{FilterField, Operator};
///
/// let field = FilterField::like("author.name").label("Author");
/// let params = QueryParams::from_query_str("author[name]=ada").unwrap();
///
/// let condition = field.condition(&params).unwrap();
/// assert_eq!(field.id(), "author_name");
/// assert_eq!(condition.operator(), Operator::Like);
/// assert_eq!(condition.value(), &json!("ada"));
///
/// assert!(field.condition(&QueryParams::from_query_str("author[name]=").unwrap()).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FilterField {
	id: String,
	column: String,
	label: String,
	kind: FilterKind,
	default: Option<Value>,
	layout_only: bool,
	placeholder: Option<String>,
}

macro_rules! compare_constructors {
	($($(#[$doc:meta])* $name:ident => $op:expr;)*) => {
		$(
			$(#[$doc])*
			pub fn $name(column: impl Into<String>) -> Self {
				Self::new(column, FilterKind::Compare($op))
			}
		)*
	};
}

impl FilterField {
	/// Creates a field; the label defaults to the humanized column name.
	pub fn new(column: impl Into<String>, kind: FilterKind) -> Self {
		let column = column.into();
		Self {
			id: field_id(&column),
			label: humanize(&column),
			column,
			kind,
			default: None,
			layout_only: false,
			placeholder: None,
		}
	}

	compare_constructors! {
		/// `column = value`
		equal => Operator::Eq;
		/// `column != value`
		not_equal => Operator::Neq;
		/// `column LIKE %value%`
		like => Operator::Like;
		/// Alias of [`FilterField::like`].
		contains => Operator::Like;
		/// `column ILIKE %value%`
		ilike => Operator::ILike;
		/// `column LIKE value%`
		starts_with => Operator::StartsWith;
		/// `column LIKE %value`
		ends_with => Operator::EndsWith;
		/// `column > value`
		gt => Operator::Gt;
		/// `column < value`
		lt => Operator::Lt;
		/// `column IN (values)`
		is_in => Operator::In;
		/// `column NOT IN (values)`
		not_in => Operator::NotIn;
		/// Calendar date equality.
		date => Operator::DateEq;
		/// Day-of-month equality.
		day => Operator::DateDay;
		/// Month equality.
		month => Operator::DateMonth;
		/// Year equality.
		year => Operator::DateYear;
	}

	/// Range filter reading `{column}[start]` and `{column}[end]`.
	pub fn between(column: impl Into<String>) -> Self {
		Self::new(column, FilterKind::Between)
	}

	/// Custom filter: the predicate receives the request value of `column`.
	pub fn custom<F>(column: impl Into<String>, predicate: F) -> Self
	where
		F: Fn(&mut dyn QueryBuilder, &Value) + Send + Sync + 'static,
	{
		Self::new(column, FilterKind::Where(Arc::new(predicate)))
	}

	/// Group filter over `column` joined with `AND`.
	pub fn group(column: impl Into<String>, members: Vec<FilterField>) -> Self {
		Self::new(
			column,
			FilterKind::Group {
				members,
				connector: Connector::And,
			},
		)
	}

	/// Hidden input carrying a fixed value.
	pub fn hidden(column: impl Into<String>, value: Value) -> Self {
		Self::new(column, FilterKind::Hidden(value))
	}

	/// Sets the label.
	pub fn label(mut self, label: impl Into<String>) -> Self {
		let label = label.into();
		if !label.is_empty() {
			self.label = label;
		}
		self
	}

	/// Sets the value shown when the request carries none.
	pub fn default_value(mut self, value: Value) -> Self {
		self.default = Some(value);
		self
	}

	/// Marks the field as layout-only: it shows the request value but never filters.
	pub fn layout_only(mut self) -> Self {
		self.layout_only = true;
		self
	}

	/// Sets the input placeholder.
	pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
		self.placeholder = Some(placeholder.into());
		self
	}

	/// Joins group members with `OR` instead of `AND`.
	pub fn or(mut self) -> Self {
		if let FilterKind::Group { connector, .. } = &mut self.kind {
			*connector = Connector::Or;
		}
		self
	}

	/// The element id: the column with `.` replaced by `_`.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// The filtered column.
	pub fn column(&self) -> &str {
		&self.column
	}

	/// The display label.
	pub fn get_label(&self) -> &str {
		&self.label
	}

	/// How the field filters.
	pub fn kind(&self) -> &FilterKind {
		&self.kind
	}

	/// The default value, if any.
	pub fn get_default(&self) -> Option<&Value> {
		self.default.as_ref()
	}

	/// The placeholder, if any.
	pub fn get_placeholder(&self) -> Option<&str> {
		self.placeholder.as_deref()
	}

	/// Returns true for layout-only fields.
	pub fn is_layout_only(&self) -> bool {
		self.layout_only
	}

	/// The request key selecting one member of a group field.
	pub fn group_key(&self) -> String {
		format!("{}_group", self.id)
	}

	/// Value to render in the control: the default, or the hidden value.
	pub fn value(&self) -> Option<&Value> {
		match &self.kind {
			FilterKind::Hidden(value) => Some(value),
			_ => self.default.as_ref(),
		}
	}

	pub(crate) fn set_default(&mut self, value: Option<Value>) {
		self.default = value;
	}

	/// Builds the field's condition from the request parameters.
	///
	/// Returns `None` when the value is absent or blank, when the value shape
	/// does not fit the operator, and always for layout-only and hidden
	/// fields.
	pub fn condition(&self, params: &QueryParams) -> Option<Condition> {
		if self.layout_only {
			return None;
		}
		match &self.kind {
			FilterKind::Hidden(_) => None,
			FilterKind::Compare(operator) => {
				let value = present(params, &self.column)?;
				let value = match (operator, value) {
					(Operator::In | Operator::NotIn, Value::Array(items)) => {
						let items: Vec<Value> = items.into_iter().filter(|v| !is_blank(v)).collect();
						if items.is_empty() {
							return None;
						}
						Value::Array(items)
					}
					(Operator::In | Operator::NotIn, scalar) => Value::Array(vec![scalar]),
					(_, value) => value,
				};
				Condition::new(&self.column, *operator, value).ok()
			}
			FilterKind::Between => {
				let start = present(params, &format!("{}.start", self.column));
				let end = present(params, &format!("{}.end", self.column));
				if start.is_none() && end.is_none() {
					return None;
				}
				let bounds = Value::Array(vec![
					start.unwrap_or(Value::Null),
					end.unwrap_or(Value::Null),
				]);
				Condition::new(&self.column, Operator::Between, bounds).ok()
			}
			FilterKind::Where(predicate) => {
				let value = present(params, &self.column)?;
				Some(Condition::raw(&self.column, value, Arc::clone(predicate)))
			}
			FilterKind::Group { members, connector } => {
				self.group_condition(params, members, *connector)
			}
		}
	}

	fn group_condition(
		&self,
		params: &QueryParams,
		members: &[FilterField],
		connector: Connector,
	) -> Option<Condition> {
		let selected = params
			.get(&self.group_key())
			.and_then(|v| tabula_core::value::display_string(v).trim().parse::<usize>().ok());
		let conditions: Vec<Condition> = members
			.iter()
			.enumerate()
			.filter(|(index, _)| selected.is_none_or(|s| s == *index))
			.filter_map(|(_, member)| member.condition(params))
			.collect();
		if conditions.is_empty() {
			return None;
		}
		let value = params.get(&self.column).cloned().unwrap_or(Value::Null);
		let predicate: RawPredicate = Arc::new(move |query: &mut dyn QueryBuilder, _: &Value| {
			query.where_group(connector, &mut |group: &mut dyn QueryBuilder| {
				for condition in &conditions {
					condition.apply(group);
				}
			});
		});
		Some(Condition::raw(&self.column, value, predicate))
	}
}

/// The element id of a column: `.` replaced by `_`.
pub fn field_id(column: &str) -> String {
	column.replace('.', "_")
}

fn present(params: &QueryParams, path: &str) -> Option<Value> {
	params.get(path).filter(|v| !is_blank(v)).cloned()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use tabula_core::SqlBuilder;

	fn params(query: &str) -> QueryParams {
		QueryParams::from_query_str(query).unwrap()
	}

	fn render(condition: &Condition) -> Option<String> {
		let mut sql = SqlBuilder::new();
		condition.apply(&mut sql);
		sql.where_sql()
	}

	#[rstest]
	#[case("")]
	#[case("name=")]
	#[case("other=x")]
	fn test_absent_or_empty_yields_nothing(#[case] query: &str) {
		assert!(FilterField::equal("name").condition(&params(query)).is_none());
	}

	#[rstest]
	fn test_list_for_scalar_operator_yields_nothing() {
		let field = FilterField::equal("id");

		assert!(field.condition(&params("id[]=1&id[]=2")).is_none());
	}

	#[rstest]
	#[case("status=open", json!(["open"]))]
	#[case("status[]=open&status[]=closed", json!(["open", "closed"]))]
	#[case("status[]=&status[]=closed", json!(["closed"]))]
	fn test_in_accepts_scalar_or_list(#[case] query: &str, #[case] expected: Value) {
		let condition = FilterField::is_in("status").condition(&params(query)).unwrap();

		assert_eq!(condition.value(), &expected);
	}

	#[rstest]
	#[case("created_at[start]=2024-01-01&created_at[end]=2024-02-01", json!(["2024-01-01", "2024-02-01"]))]
	#[case("created_at[start]=2024-01-01", json!(["2024-01-01", null]))]
	#[case("created_at[start]=&created_at[end]=2024-02-01", json!([null, "2024-02-01"]))]
	fn test_between_reads_start_and_end(#[case] query: &str, #[case] expected: Value) {
		let condition = FilterField::between("created_at").condition(&params(query)).unwrap();

		assert_eq!(condition.operator(), Operator::Between);
		assert_eq!(condition.value(), &expected);
	}

	#[rstest]
	fn test_between_without_bounds_yields_nothing() {
		let field = FilterField::between("created_at");

		assert!(field.condition(&params("created_at[start]=&created_at[end]=")).is_none());
	}

	#[rstest]
	fn test_layout_only_and_hidden_never_filter() {
		let layout = FilterField::equal("name").layout_only();
		let hidden = FilterField::hidden("tenant", json!("acme"));

		assert!(layout.condition(&params("name=bob")).is_none());
		assert!(hidden.condition(&params("tenant=acme")).is_none());
		assert_eq!(hidden.value(), Some(&json!("acme")));
	}

	#[rstest]
	fn test_custom_predicate() {
		// Arrange
		let field = FilterField::custom("q", |query, value| {
			query.where_raw("title || body LIKE ?", vec![value.clone()]);
		});

		// Act
		let condition = field.condition(&params("q=rust")).unwrap();

		// Assert
		assert_eq!(condition.operator(), Operator::RawWhere);
		assert_eq!(render(&condition).as_deref(), Some("(title || body LIKE ?)"));
	}

	#[rstest]
	fn test_group_joins_members() {
		// Arrange
		let field = FilterField::group(
			"rate",
			vec![FilterField::gt("rate"), FilterField::lt("rate")],
		)
		.or();

		// Act
		let condition = field.condition(&params("rate=5")).unwrap();

		// Assert
		assert_eq!(render(&condition).as_deref(), Some("(\"rate\" > ? OR \"rate\" < ?)"));
	}

	#[rstest]
	fn test_group_selector_activates_one_member() {
		let field = FilterField::group(
			"rate",
			vec![FilterField::gt("rate"), FilterField::lt("rate")],
		);

		let condition = field.condition(&params("rate=5&rate_group=1")).unwrap();

		assert_eq!(render(&condition).as_deref(), Some("(\"rate\" < ?)"));
	}

	#[rstest]
	fn test_label_defaults_to_humanized_column() {
		let field = FilterField::equal("author.first_name");

		assert_eq!(field.id(), "author_first_name");
		assert_eq!(field.get_label(), "Author first name");
		assert_eq!(field.clone().label("").get_label(), "Author first name");
	}
}
