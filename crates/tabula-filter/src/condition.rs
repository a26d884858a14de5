//! Predicate units
//!
//! A [`Condition`] is an immutable `(column, operator, value)` triple that
//! knows how to append itself to any [`QueryBuilder`]. The value shape is
//! checked once, at construction.

use crate::error::{FilterError, FilterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabula_core::{Comparison, DatePart, QueryBuilder, Value};

/// Predicate supplied by the caller for [`Operator::RawWhere`].
///
/// Receives the builder and the request value the condition was built from.
pub type RawPredicate = Arc<dyn Fn(&mut dyn QueryBuilder, &Value) + Send + Sync>;

/// Comparison performed by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
	/// `column = value`
	Eq,
	/// `column != value`
	Neq,
	/// `column LIKE %value%`
	Like,
	/// `column ILIKE %value%`
	ILike,
	/// `column LIKE value%`
	StartsWith,
	/// `column LIKE %value`
	EndsWith,
	/// `column > value`
	Gt,
	/// `column < value`
	Lt,
	/// `column BETWEEN low AND high`
	Between,
	/// `column IN (values)`
	In,
	/// `column NOT IN (values)`
	NotIn,
	/// Calendar date of the column equals the value.
	DateEq,
	/// Day of month of the column equals the value.
	DateDay,
	/// Month of the column equals the value.
	DateMonth,
	/// Year of the column equals the value.
	DateYear,
	/// Caller-supplied predicate.
	RawWhere,
}

/// Value shape an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	/// A single scalar.
	Scalar,
	/// A sequence of exactly two scalars.
	Pair,
	/// A non-empty sequence of scalars.
	List,
	/// Anything; interpreted by the raw predicate.
	Any,
}

impl Operator {
	/// The value shape the operator accepts.
	pub fn arity(&self) -> Arity {
		match self {
			Operator::Between => Arity::Pair,
			Operator::In | Operator::NotIn => Arity::List,
			Operator::RawWhere => Arity::Any,
			_ => Arity::Scalar,
		}
	}

	/// Upper snake case name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Operator::Eq => "EQ",
			Operator::Neq => "NEQ",
			Operator::Like => "LIKE",
			Operator::ILike => "ILIKE",
			Operator::StartsWith => "STARTS_WITH",
			Operator::EndsWith => "ENDS_WITH",
			Operator::Gt => "GT",
			Operator::Lt => "LT",
			Operator::Between => "BETWEEN",
			Operator::In => "IN",
			Operator::NotIn => "NOT_IN",
			Operator::DateEq => "DATE_EQ",
			Operator::DateDay => "DATE_DAY",
			Operator::DateMonth => "DATE_MONTH",
			Operator::DateYear => "DATE_YEAR",
			Operator::RawWhere => "RAW_WHERE",
		}
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An immutable predicate on one column.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::SqlBuilder;
/// use tabula_filter::{Condition, Operator};
///
/// let condition = Condition::new("name", Operator::Like, json!("50%_off")).unwrap();
/// let mut sql = SqlBuilder::new();
/// condition.apply(&mut sql);
///
/// assert_eq!(sql.bindings(), &[json!("%50\\%\\_off%")]);
///
/// assert!(Condition::new("id", Operator::In, json!([])).is_err());
/// ```
#[derive(Clone)]
pub struct Condition {
	column: String,
	operator: Operator,
	value: Value,
	raw: Option<RawPredicate>,
}

impl Condition {
	/// Builds a condition, validating the value shape against the operator.
	///
	/// [`Operator::RawWhere`] needs a predicate; use [`Condition::raw`].
	pub fn new(column: impl Into<String>, operator: Operator, value: Value) -> FilterResult<Self> {
		let column = column.into();
		if operator == Operator::RawWhere {
			return Err(FilterError::MissingPredicate(column));
		}
		check_arity(&column, operator, &value)?;
		Ok(Self {
			column,
			operator,
			value,
			raw: None,
		})
	}

	/// Builds a [`Operator::RawWhere`] condition around a caller predicate.
	pub fn raw(column: impl Into<String>, value: Value, predicate: RawPredicate) -> Self {
		Self {
			column: column.into(),
			operator: Operator::RawWhere,
			value,
			raw: Some(predicate),
		}
	}

	/// The filtered column (a dotted path for relation columns).
	pub fn column(&self) -> &str {
		&self.column
	}

	/// The operator.
	pub fn operator(&self) -> Operator {
		self.operator
	}

	/// The request value the condition compares against.
	pub fn value(&self) -> &Value {
		&self.value
	}

	/// Appends the predicate to a query builder.
	pub fn apply(&self, query: &mut dyn QueryBuilder) {
		let column = self.column.as_str();
		match self.operator {
			Operator::Eq => query.where_cmp(column, Comparison::Eq, self.value.clone()),
			Operator::Neq => query.where_cmp(column, Comparison::Ne, self.value.clone()),
			Operator::Gt => query.where_cmp(column, Comparison::Gt, self.value.clone()),
			Operator::Lt => query.where_cmp(column, Comparison::Lt, self.value.clone()),
			Operator::Like => query.where_cmp(column, Comparison::Like, self.pattern(true, true)),
			Operator::ILike => query.where_cmp(column, Comparison::ILike, self.pattern(true, true)),
			Operator::StartsWith => {
				query.where_cmp(column, Comparison::Like, self.pattern(false, true))
			}
			Operator::EndsWith => {
				query.where_cmp(column, Comparison::Like, self.pattern(true, false))
			}
			Operator::Between => self.apply_between(query),
			Operator::In => query.where_in(column, self.list(), false),
			Operator::NotIn => query.where_in(column, self.list(), true),
			Operator::DateEq => query.where_date_part(column, DatePart::Date, self.value.clone()),
			Operator::DateDay => query.where_date_part(column, DatePart::Day, self.value.clone()),
			Operator::DateMonth => {
				query.where_date_part(column, DatePart::Month, self.value.clone())
			}
			Operator::DateYear => query.where_date_part(column, DatePart::Year, self.value.clone()),
			Operator::RawWhere => {
				if let Some(predicate) = &self.raw {
					predicate(query, &self.value);
				}
			}
		}
	}

	fn pattern(&self, leading: bool, trailing: bool) -> Value {
		let text = escape_like_pattern(&tabula_core::value::display_string(&self.value));
		let mut pattern = String::with_capacity(text.len() + 2);
		if leading {
			pattern.push('%');
		}
		pattern.push_str(&text);
		if trailing {
			pattern.push('%');
		}
		Value::String(pattern)
	}

	fn list(&self) -> Vec<Value> {
		match &self.value {
			Value::Array(items) => items.clone(),
			other => vec![other.clone()],
		}
	}

	fn apply_between(&self, query: &mut dyn QueryBuilder) {
		let (low, high) = match &self.value {
			Value::Array(bounds) if bounds.len() == 2 => (bounds[0].clone(), bounds[1].clone()),
			_ => return,
		};
		match (low.is_null(), high.is_null()) {
			(false, false) => query.where_between(&self.column, low, high),
			(false, true) => query.where_cmp(&self.column, Comparison::Gte, low),
			(true, false) => query.where_cmp(&self.column, Comparison::Lte, high),
			(true, true) => {}
		}
	}
}

impl fmt::Debug for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Condition")
			.field("column", &self.column)
			.field("operator", &self.operator)
			.field("value", &self.value)
			.field("raw", &self.raw.is_some())
			.finish()
	}
}

impl PartialEq for Condition {
	fn eq(&self, other: &Self) -> bool {
		let same_predicate = match (&self.raw, &other.raw) {
			(None, None) => true,
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			_ => false,
		};
		same_predicate
			&& self.column == other.column
			&& self.operator == other.operator
			&& self.value == other.value
	}
}

/// Escapes `LIKE` metacharacters so user input matches literally.
pub fn escape_like_pattern(input: &str) -> String {
	input
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_")
}

fn is_scalar(value: &Value) -> bool {
	!matches!(value, Value::Array(_) | Value::Object(_))
}

fn check_arity(column: &str, operator: Operator, value: &Value) -> FilterResult<()> {
	let (valid, expected) = match operator.arity() {
		Arity::Scalar => (is_scalar(value), "a scalar"),
		Arity::Pair => (
			matches!(value, Value::Array(items) if items.len() == 2 && items.iter().all(is_scalar)),
			"a sequence of exactly two scalars",
		),
		Arity::List => (
			matches!(value, Value::Array(items) if !items.is_empty() && items.iter().all(is_scalar)),
			"a non-empty sequence of scalars",
		),
		Arity::Any => (true, "any value"),
	};
	if valid {
		Ok(())
	} else {
		Err(FilterError::Arity {
			column: column.to_string(),
			operator,
			expected,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use tabula_core::{Connector, SqlBuilder};

	fn render(condition: &Condition) -> (Option<String>, Vec<Value>) {
		let mut sql = SqlBuilder::new();
		condition.apply(&mut sql);
		(sql.where_sql(), sql.bindings().to_vec())
	}

	#[rstest]
	#[case(Operator::Eq, json!("x"), true)]
	#[case(Operator::Eq, json!(["x"]), false)]
	#[case(Operator::Gt, json!({"a": 1}), false)]
	#[case(Operator::Between, json!([1, 2]), true)]
	#[case(Operator::Between, json!([1, null]), true)]
	#[case(Operator::Between, json!([1]), false)]
	#[case(Operator::Between, json!([1, 2, 3]), false)]
	#[case(Operator::Between, json!(1), false)]
	#[case(Operator::In, json!([1]), true)]
	#[case(Operator::In, json!([]), false)]
	#[case(Operator::NotIn, json!("a"), false)]
	#[case(Operator::In, json!([[1]]), false)]
	fn test_arity_validation(#[case] operator: Operator, #[case] value: Value, #[case] ok: bool) {
		assert_eq!(Condition::new("c", operator, value).is_ok(), ok);
	}

	#[rstest]
	fn test_raw_where_requires_predicate() {
		let result = Condition::new("c", Operator::RawWhere, json!(1));

		assert!(matches!(result, Err(FilterError::MissingPredicate(_))));
	}

	#[rstest]
	#[case(Operator::Like, "LIKE", "%a\\_b%")]
	#[case(Operator::ILike, "ILIKE", "%a\\_b%")]
	#[case(Operator::StartsWith, "LIKE", "a\\_b%")]
	#[case(Operator::EndsWith, "LIKE", "%a\\_b")]
	fn test_like_wrapping(#[case] operator: Operator, #[case] keyword: &str, #[case] pattern: &str) {
		// Arrange
		let condition = Condition::new("name", operator, json!("a_b")).unwrap();

		// Act
		let (clause, bindings) = render(&condition);

		// Assert
		assert_eq!(clause, Some(format!("\"name\" {keyword} ? ESCAPE '\\'")));
		assert_eq!(bindings, vec![json!(pattern)]);
	}

	#[rstest]
	#[case(json!(["1", "9"]), "\"n\" BETWEEN ? AND ?")]
	#[case(json!(["1", null]), "\"n\" >= ?")]
	#[case(json!([null, "9"]), "\"n\" <= ?")]
	fn test_between_bounds(#[case] value: Value, #[case] expected: &str) {
		let condition = Condition::new("n", Operator::Between, value).unwrap();

		let (clause, _) = render(&condition);

		assert_eq!(clause.as_deref(), Some(expected));
	}

	#[rstest]
	#[case(Operator::DateEq, "CAST(\"d\" AS DATE) = ?")]
	#[case(Operator::DateDay, "EXTRACT(DAY FROM \"d\") = ?")]
	#[case(Operator::DateMonth, "EXTRACT(MONTH FROM \"d\") = ?")]
	#[case(Operator::DateYear, "EXTRACT(YEAR FROM \"d\") = ?")]
	fn test_date_parts(#[case] operator: Operator, #[case] expected: &str) {
		let condition = Condition::new("d", operator, json!("2024")).unwrap();

		let (clause, _) = render(&condition);

		assert_eq!(clause.as_deref(), Some(expected));
	}

	#[rstest]
	fn test_raw_predicate_receives_value() {
		// Arrange
		let predicate: RawPredicate = Arc::new(|query: &mut dyn QueryBuilder, value: &Value| {
			query.where_group(Connector::Or, &mut |q: &mut dyn QueryBuilder| {
				q.where_cmp("first_name", Comparison::Eq, value.clone());
				q.where_cmp("last_name", Comparison::Eq, value.clone());
			});
		});
		let condition = Condition::raw("full_name", json!("Ada"), predicate);

		// Act
		let (clause, bindings) = render(&condition);

		// Assert
		assert_eq!(condition.operator(), Operator::RawWhere);
		assert_eq!(
			clause.as_deref(),
			Some("(\"first_name\" = ? OR \"last_name\" = ?)")
		);
		assert_eq!(bindings, vec![json!("Ada"), json!("Ada")]);
	}

	#[rstest]
	fn test_escape_like_pattern() {
		assert_eq!(escape_like_pattern("100%"), "100\\%");
		assert_eq!(escape_like_pattern("a\\b"), "a\\\\b");
		assert_eq!(escape_like_pattern("plain"), "plain");
	}
}
