//! Filter error types

use crate::condition::Operator;
use tabula_core::QueryError;
use thiserror::Error;

/// Errors raised while configuring filters or running filtered queries.
#[derive(Debug, Error)]
pub enum FilterError {
	/// The value does not have the shape the operator requires.
	#[error("Operator {operator} on column {column} expects {expected}")]
	Arity {
		/// Filtered column.
		column: String,
		/// Operator being constructed.
		operator: Operator,
		/// Description of the accepted shape.
		expected: &'static str,
	},

	/// A raw condition was built without a predicate.
	#[error("Raw condition on column {0} requires a predicate")]
	MissingPredicate(String),

	/// No filter kind is registered under the name.
	#[error("Unknown filter kind: {0}")]
	UnknownFilterKind(String),

	/// Two fields of the same set share an id.
	#[error("Duplicate filter id: {0}")]
	DuplicateField(String),

	/// The registry no longer accepts registrations.
	#[error("Filter registry is frozen, cannot register {0}")]
	RegistryFrozen(String),

	/// A URL could not be parsed.
	#[error("Invalid URL: {0}")]
	InvalidUrl(String),

	/// The query executor failed.
	#[error(transparent)]
	Query(#[from] QueryError),
}

/// Result type alias for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
