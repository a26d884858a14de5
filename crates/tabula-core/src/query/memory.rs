//! In-memory query evaluation

use super::{Comparison, Connector, DatePart, Direction, QueryBuilder, QueryExecutor};
use crate::error::{QueryError, QueryResult};
use crate::value::{Row, Value, as_number, display_string, row_get};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
	Cmp {
		column: String,
		op: Comparison,
		value: Value,
	},
	Between {
		column: String,
		low: Value,
		high: Value,
	},
	In {
		column: String,
		values: Vec<Value>,
		negated: bool,
	},
	DatePart {
		column: String,
		part: DatePart,
		value: Value,
	},
	Raw {
		expr: String,
	},
	Group {
		connector: Connector,
		members: Vec<Predicate>,
	},
}

#[derive(Debug, Clone, PartialEq)]
enum Order {
	Column(String, Direction),
	Raw(String),
}

/// A query evaluated by [`MemoryTable`].
///
/// Raw predicates are recorded but cannot be evaluated; fetching a query that
/// contains one fails with [`QueryError::UnsupportedRaw`]. Raw orderings are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuery {
	predicates: Vec<Predicate>,
	orders: Vec<Order>,
}

impl MemoryQuery {
	/// Creates an unconstrained query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true when no predicate was added.
	pub fn is_unconstrained(&self) -> bool {
		self.predicates.is_empty()
	}

	/// Number of top-level predicates.
	pub fn predicate_count(&self) -> usize {
		self.predicates.len()
	}

	/// Evaluates the predicates against one row.
	pub fn matches(&self, row: &Row) -> QueryResult<bool> {
		for predicate in &self.predicates {
			if !evaluate(predicate, row)? {
				return Ok(false);
			}
		}
		Ok(true)
	}

	fn sort(&self, rows: &mut [Row]) {
		let columns: Vec<(&str, Direction)> = self
			.orders
			.iter()
			.filter_map(|order| match order {
				Order::Column(column, direction) => Some((column.as_str(), *direction)),
				Order::Raw(expr) => {
					tracing::debug!(expr = %expr, "raw ordering ignored by in-memory executor");
					None
				}
			})
			.collect();
		if columns.is_empty() {
			return;
		}
		rows.sort_by(|a, b| {
			for (column, direction) in &columns {
				let ordering = compare_optional(row_get(a, column), row_get(b, column));
				let ordering = match direction {
					Direction::Asc => ordering,
					Direction::Desc => ordering.reverse(),
				};
				if ordering != Ordering::Equal {
					return ordering;
				}
			}
			Ordering::Equal
		});
	}
}

impl QueryBuilder for MemoryQuery {
	fn where_cmp(&mut self, column: &str, op: Comparison, value: Value) {
		self.predicates.push(Predicate::Cmp {
			column: column.to_string(),
			op,
			value,
		});
	}

	fn where_between(&mut self, column: &str, low: Value, high: Value) {
		self.predicates.push(Predicate::Between {
			column: column.to_string(),
			low,
			high,
		});
	}

	fn where_in(&mut self, column: &str, values: Vec<Value>, negated: bool) {
		self.predicates.push(Predicate::In {
			column: column.to_string(),
			values,
			negated,
		});
	}

	fn where_date_part(&mut self, column: &str, part: DatePart, value: Value) {
		self.predicates.push(Predicate::DatePart {
			column: column.to_string(),
			part,
			value,
		});
	}

	fn where_raw(&mut self, expr: &str, _bindings: Vec<Value>) {
		self.predicates.push(Predicate::Raw {
			expr: expr.to_string(),
		});
	}

	fn where_group(&mut self, connector: Connector, build: &mut dyn FnMut(&mut dyn QueryBuilder)) {
		let mut group = MemoryQuery::new();
		build(&mut group);
		if group.predicates.is_empty() {
			return;
		}
		self.predicates.push(Predicate::Group {
			connector,
			members: group.predicates,
		});
	}

	fn order_by(&mut self, column: &str, direction: Direction) {
		self.orders
			.push(Order::Column(column.to_string(), direction));
	}

	fn order_by_raw(&mut self, expr: &str) {
		self.orders.push(Order::Raw(expr.to_string()));
	}
}

/// Rows held in memory, queried through [`MemoryQuery`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::{Comparison, MemoryTable, QueryBuilder, QueryExecutor};
///
/// let table = MemoryTable::from_values(vec![
///     json!({"id": 1, "name": "alice"}),
///     json!({"id": 2, "name": "bob"}),
/// ]);
/// let mut query = table.query();
/// query.where_cmp("name", Comparison::Like, json!("%ob%"));
///
/// let rows = table.fetch(&query, 0, None).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0]["id"], json!(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
	rows: Vec<Row>,
}

impl MemoryTable {
	/// Creates a table over the given rows.
	pub fn new(rows: Vec<Row>) -> Self {
		Self { rows }
	}

	/// Creates a table from JSON values; non-object values are skipped.
	pub fn from_values(values: Vec<Value>) -> Self {
		let rows = values
			.into_iter()
			.filter_map(|value| match value {
				Value::Object(row) => Some(row),
				_ => None,
			})
			.collect();
		Self { rows }
	}

	/// Appends a row.
	pub fn push(&mut self, row: Row) {
		self.rows.push(row);
	}

	/// All rows in insertion order.
	pub fn rows(&self) -> &[Row] {
		&self.rows
	}

	fn matching(&self, query: &MemoryQuery) -> QueryResult<Vec<Row>> {
		let mut matched = Vec::new();
		for row in &self.rows {
			if query.matches(row)? {
				matched.push(row.clone());
			}
		}
		Ok(matched)
	}
}

impl QueryExecutor for MemoryTable {
	type Query = MemoryQuery;

	fn query(&self) -> MemoryQuery {
		MemoryQuery::new()
	}

	fn fetch(&self, query: &MemoryQuery, offset: usize, limit: Option<usize>) -> QueryResult<Vec<Row>> {
		let mut rows = self.matching(query)?;
		query.sort(&mut rows);
		let rows = rows.into_iter().skip(offset);
		Ok(match limit {
			Some(limit) => rows.take(limit).collect(),
			None => rows.collect(),
		})
	}

	fn count(&self, query: &MemoryQuery) -> QueryResult<usize> {
		let mut count = 0;
		for row in &self.rows {
			if query.matches(row)? {
				count += 1;
			}
		}
		Ok(count)
	}
}

fn evaluate(predicate: &Predicate, row: &Row) -> QueryResult<bool> {
	Ok(match predicate {
		Predicate::Cmp { column, op, value } => compare(row_get(row, column), *op, value),
		Predicate::Between { column, low, high } => match row_get(row, column) {
			Some(actual) if !actual.is_null() => {
				compare_values(actual, low) != Ordering::Less
					&& compare_values(actual, high) != Ordering::Greater
			}
			_ => false,
		},
		Predicate::In {
			column,
			values,
			negated,
		} => {
			let found = row_get(row, column)
				.is_some_and(|actual| values.iter().any(|v| loose_eq(actual, v)));
			found != *negated
		}
		Predicate::DatePart {
			column,
			part,
			value,
		} => row_get(row, column).is_some_and(|actual| date_part_matches(actual, *part, value)),
		Predicate::Raw { expr } => return Err(QueryError::UnsupportedRaw(expr.clone())),
		Predicate::Group { connector, members } => {
			let mut result = matches!(connector, Connector::And);
			for member in members {
				let hit = evaluate(member, row)?;
				match connector {
					Connector::And if !hit => {
						result = false;
						break;
					}
					Connector::Or if hit => {
						result = true;
						break;
					}
					_ => {}
				}
			}
			result
		}
	})
}

fn compare(actual: Option<&Value>, op: Comparison, expected: &Value) -> bool {
	let actual = actual.unwrap_or(&Value::Null);
	match op {
		Comparison::Eq => loose_eq(actual, expected),
		Comparison::Ne => !loose_eq(actual, expected),
		Comparison::Like => like_match(&display_string(expected), &display_string(actual), false),
		Comparison::ILike => like_match(&display_string(expected), &display_string(actual), true),
		_ if actual.is_null() || expected.is_null() => false,
		Comparison::Gt => compare_values(actual, expected) == Ordering::Greater,
		Comparison::Gte => compare_values(actual, expected) != Ordering::Less,
		Comparison::Lt => compare_values(actual, expected) == Ordering::Less,
		Comparison::Lte => compare_values(actual, expected) != Ordering::Greater,
	}
}

fn loose_eq(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Null, Value::Null) => true,
		(Value::Null, _) | (_, Value::Null) => false,
		_ => match (as_number(a), as_number(b)) {
			(Some(x), Some(y)) => x == y,
			_ => display_string(a) == display_string(b),
		},
	}
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
	match (as_number(a), as_number(b)) {
		(Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
		_ => display_string(a).cmp(&display_string(b)),
	}
}

fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
	let a = a.filter(|v| !v.is_null());
	let b = b.filter(|v| !v.is_null());
	match (a, b) {
		(None, None) => Ordering::Equal,
		(None, Some(_)) => Ordering::Less,
		(Some(_), None) => Ordering::Greater,
		(Some(a), Some(b)) => compare_values(a, b),
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
	Literal(char),
	AnyOne,
	AnyMany,
}

fn tokenize_like(pattern: &str) -> Vec<LikeToken> {
	let mut tokens = Vec::new();
	let mut chars = pattern.chars();
	while let Some(ch) = chars.next() {
		tokens.push(match ch {
			'\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
			'%' => LikeToken::AnyMany,
			'_' => LikeToken::AnyOne,
			other => LikeToken::Literal(other),
		});
	}
	tokens
}

/// Matches `text` against a SQL `LIKE` pattern with `\` as escape character.
pub(crate) fn like_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
	let fold = |ch: char| {
		if case_insensitive {
			ch.to_lowercase().next().unwrap_or(ch)
		} else {
			ch
		}
	};
	let tokens = tokenize_like(pattern);
	let text: Vec<char> = text.chars().map(fold).collect();

	// matched[j]: the tokens consumed so far match text[..j]
	let mut matched = vec![false; text.len() + 1];
	matched[0] = true;
	for token in tokens {
		let mut next = vec![false; text.len() + 1];
		match token {
			LikeToken::AnyMany => {
				let mut reachable = false;
				for j in 0..=text.len() {
					reachable |= matched[j];
					next[j] = reachable;
				}
			}
			LikeToken::AnyOne => {
				for j in 1..=text.len() {
					next[j] = matched[j - 1];
				}
			}
			LikeToken::Literal(ch) => {
				let ch = fold(ch);
				for j in 1..=text.len() {
					next[j] = matched[j - 1] && text[j - 1] == ch;
				}
			}
		}
		matched = next;
	}
	matched[text.len()]
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
	let text = value.as_str()?.trim();
	if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
		return Some(dt.date_naive());
	}
	for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
		if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
			return Some(dt.date());
		}
	}
	NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn date_part_matches(actual: &Value, part: DatePart, expected: &Value) -> bool {
	let Some(date) = parse_date(actual) else {
		return false;
	};
	match part {
		DatePart::Date => parse_date(expected) == Some(date),
		DatePart::Day => as_number(expected) == Some(f64::from(date.day())),
		DatePart::Month => as_number(expected) == Some(f64::from(date.month())),
		DatePart::Year => as_number(expected) == Some(f64::from(date.year())),
	}
}
