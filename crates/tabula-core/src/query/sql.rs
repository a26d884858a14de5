//! Parameterized SQL rendering

use super::{Comparison, Connector, DatePart, Direction, QueryBuilder};
use crate::value::Value;

/// Renders predicates as a parameterized SQL fragment.
///
/// Identifiers are double-quoted, values are never inlined: every value is
/// pushed to [`SqlBuilder::bindings`] and represented by a `?` placeholder.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::{Comparison, QueryBuilder, SqlBuilder};
///
/// let mut sql = SqlBuilder::new();
/// sql.where_cmp("name", Comparison::Like, json!("%bob%"));
/// sql.where_in("status", vec![json!("a"), json!("b")], false);
///
/// assert_eq!(
///     sql.where_sql().as_deref(),
///     Some("\"name\" LIKE ? ESCAPE '\\' AND \"status\" IN (?, ?)")
/// );
/// assert_eq!(sql.bindings().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
	clauses: Vec<String>,
	bindings: Vec<Value>,
	orders: Vec<String>,
}

impl SqlBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// The predicates joined with `AND`, or `None` when there are none.
	pub fn where_sql(&self) -> Option<String> {
		if self.clauses.is_empty() {
			None
		} else {
			Some(self.clauses.join(" AND "))
		}
	}

	/// The `ORDER BY` body, or `None` when no ordering was added.
	pub fn order_sql(&self) -> Option<String> {
		if self.orders.is_empty() {
			None
		} else {
			Some(self.orders.join(", "))
		}
	}

	/// Positional bindings, in placeholder order.
	pub fn bindings(&self) -> &[Value] {
		&self.bindings
	}

	/// Renders a complete `SELECT` statement.
	pub fn to_select(&self, table: &str, offset: usize, limit: Option<usize>) -> String {
		let mut sql = format!("SELECT * FROM {}", quote_ident(table));
		if let Some(clause) = self.where_sql() {
			sql.push_str(" WHERE ");
			sql.push_str(&clause);
		}
		if let Some(order) = self.order_sql() {
			sql.push_str(" ORDER BY ");
			sql.push_str(&order);
		}
		if let Some(limit) = limit {
			sql.push_str(&format!(" LIMIT {limit}"));
		}
		if offset > 0 {
			sql.push_str(&format!(" OFFSET {offset}"));
		}
		sql
	}

	fn push(&mut self, clause: String, bindings: impl IntoIterator<Item = Value>) {
		self.clauses.push(clause);
		self.bindings.extend(bindings);
	}
}

/// Quotes a possibly dotted identifier (`author.name` → `"author"."name"`).
pub fn quote_ident(ident: &str) -> String {
	ident
		.split('.')
		.map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
		.collect::<Vec<_>>()
		.join(".")
}

fn placeholders(count: usize) -> String {
	vec!["?"; count].join(", ")
}

impl QueryBuilder for SqlBuilder {
	fn where_cmp(&mut self, column: &str, op: Comparison, value: Value) {
		let col = quote_ident(column);
		let clause = match (op, &value) {
			(Comparison::Eq, Value::Null) => format!("{col} IS NULL"),
			(Comparison::Ne, Value::Null) => format!("{col} IS NOT NULL"),
			(Comparison::Like | Comparison::ILike, _) => {
				format!("{col} {} ? ESCAPE '\\'", op.as_sql())
			}
			_ => format!("{col} {} ?", op.as_sql()),
		};
		if value.is_null() && matches!(op, Comparison::Eq | Comparison::Ne) {
			self.push(clause, None);
		} else {
			self.push(clause, Some(value));
		}
	}

	fn where_between(&mut self, column: &str, low: Value, high: Value) {
		let clause = format!("{} BETWEEN ? AND ?", quote_ident(column));
		self.push(clause, [low, high]);
	}

	fn where_in(&mut self, column: &str, values: Vec<Value>, negated: bool) {
		let keyword = if negated { "NOT IN" } else { "IN" };
		let clause = format!(
			"{} {keyword} ({})",
			quote_ident(column),
			placeholders(values.len())
		);
		self.push(clause, values);
	}

	fn where_date_part(&mut self, column: &str, part: DatePart, value: Value) {
		let col = quote_ident(column);
		let clause = match part {
			DatePart::Date => format!("CAST({col} AS DATE) = ?"),
			DatePart::Day => format!("EXTRACT(DAY FROM {col}) = ?"),
			DatePart::Month => format!("EXTRACT(MONTH FROM {col}) = ?"),
			DatePart::Year => format!("EXTRACT(YEAR FROM {col}) = ?"),
		};
		self.push(clause, Some(value));
	}

	fn where_raw(&mut self, expr: &str, bindings: Vec<Value>) {
		self.push(format!("({expr})"), bindings);
	}

	fn where_group(&mut self, connector: Connector, build: &mut dyn FnMut(&mut dyn QueryBuilder)) {
		let mut group = SqlBuilder::new();
		build(&mut group);
		if group.clauses.is_empty() {
			return;
		}
		let joined = group
			.clauses
			.join(&format!(" {} ", connector.as_sql()));
		self.push(format!("({joined})"), group.bindings);
	}

	fn order_by(&mut self, column: &str, direction: Direction) {
		self.orders.push(format!(
			"{} {}",
			quote_ident(column),
			direction.as_str().to_uppercase()
		));
	}

	fn order_by_raw(&mut self, expr: &str) {
		self.orders.push(expr.to_string());
	}
}
