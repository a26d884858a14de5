//! Query-builder and executor interface
//!
//! Filter conditions never talk to a database directly. They append
//! predicates to a [`QueryBuilder`], and a [`QueryExecutor`] turns the built
//! query into rows. Two implementations ship with this crate:
//!
//! - [`SqlBuilder`] renders a parameterized `WHERE`/`ORDER BY` clause
//! - [`MemoryTable`] / [`MemoryQuery`] evaluate predicates against rows held
//!   in memory

mod memory;
mod sql;

pub use memory::{MemoryQuery, MemoryTable};
pub use sql::{SqlBuilder, quote_ident};

use crate::error::QueryResult;
use crate::value::{Row, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary comparison used by [`QueryBuilder::where_cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
	/// `=`
	Eq,
	/// `!=`
	Ne,
	/// `>`
	Gt,
	/// `>=`
	Gte,
	/// `<`
	Lt,
	/// `<=`
	Lte,
	/// `LIKE` (the value is a pattern)
	Like,
	/// `ILIKE` (case-insensitive pattern)
	ILike,
}

impl Comparison {
	/// SQL spelling of the comparison.
	pub fn as_sql(&self) -> &'static str {
		match self {
			Comparison::Eq => "=",
			Comparison::Ne => "!=",
			Comparison::Gt => ">",
			Comparison::Gte => ">=",
			Comparison::Lt => "<",
			Comparison::Lte => "<=",
			Comparison::Like => "LIKE",
			Comparison::ILike => "ILIKE",
		}
	}
}

/// Component of a date column compared by [`QueryBuilder::where_date_part`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePart {
	/// The calendar date, ignoring the time of day.
	Date,
	/// Day of month.
	Day,
	/// Month of year.
	Month,
	/// Year.
	Year,
}

/// Boolean connector joining the members of a predicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connector {
	/// All members must hold.
	#[default]
	And,
	/// Any member may hold.
	Or,
}

impl Connector {
	/// SQL keyword for the connector.
	pub fn as_sql(&self) -> &'static str {
		match self {
			Connector::And => "AND",
			Connector::Or => "OR",
		}
	}
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	/// Ascending.
	#[default]
	Asc,
	/// Descending.
	Desc,
}

impl Direction {
	/// Parses `asc`/`desc` (case-insensitive).
	pub fn parse(input: &str) -> Option<Self> {
		match input.to_ascii_lowercase().as_str() {
			"asc" => Some(Direction::Asc),
			"desc" => Some(Direction::Desc),
			_ => None,
		}
	}

	/// The opposite direction.
	pub fn toggled(&self) -> Self {
		match self {
			Direction::Asc => Direction::Desc,
			Direction::Desc => Direction::Asc,
		}
	}

	/// Lowercase name as used in request parameters.
	pub fn as_str(&self) -> &'static str {
		match self {
			Direction::Asc => "asc",
			Direction::Desc => "desc",
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Receives predicates and ordering clauses.
///
/// The trait is object safe so conditions can be applied through
/// `&mut dyn QueryBuilder`.
pub trait QueryBuilder {
	/// Appends `column <op> value`.
	fn where_cmp(&mut self, column: &str, op: Comparison, value: Value);

	/// Appends `column BETWEEN low AND high`.
	fn where_between(&mut self, column: &str, low: Value, high: Value);

	/// Appends `column IN (values)` or `column NOT IN (values)`.
	fn where_in(&mut self, column: &str, values: Vec<Value>, negated: bool);

	/// Compares one component of a date column.
	fn where_date_part(&mut self, column: &str, part: DatePart, value: Value);

	/// Appends a raw predicate with positional bindings.
	fn where_raw(&mut self, expr: &str, bindings: Vec<Value>);

	/// Appends a bracketed group of predicates joined by `connector`.
	fn where_group(&mut self, connector: Connector, build: &mut dyn FnMut(&mut dyn QueryBuilder));

	/// Appends an ordering on a column.
	fn order_by(&mut self, column: &str, direction: Direction);

	/// Appends a raw ordering expression.
	fn order_by_raw(&mut self, expr: &str);
}

/// Executes queries built through [`QueryBuilder`].
pub trait QueryExecutor {
	/// The builder this executor understands.
	type Query: QueryBuilder;

	/// Starts a new, unconstrained query.
	fn query(&self) -> Self::Query;

	/// Fetches matching rows, skipping `offset` and returning at most `limit`.
	fn fetch(&self, query: &Self::Query, offset: usize, limit: Option<usize>)
	-> QueryResult<Vec<Row>>;

	/// Counts matching rows.
	fn count(&self, query: &Self::Query) -> QueryResult<usize>;
}
