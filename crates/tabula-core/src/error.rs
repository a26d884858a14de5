//! Error types for request parsing and query execution.

use thiserror::Error;

/// Errors raised while parsing request parameters or executing a query.
#[derive(Debug, Error)]
pub enum QueryError {
	/// The query string could not be decoded.
	#[error("Invalid query string: {0}")]
	InvalidQueryString(String),

	/// The executor cannot evaluate a raw SQL fragment.
	#[error("Raw expression is not supported by this executor: {0}")]
	UnsupportedRaw(String),

	/// The backing store failed.
	#[error("Execution error: {0}")]
	Execution(String),
}

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
