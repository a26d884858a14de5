//! Grid error types

use tabula_core::{QueryError, SettingsError};
use thiserror::Error;

/// Errors raised while rendering a grid or handling a tree request.
#[derive(Debug, Error)]
pub enum GridError {
	/// Building the filter set or a reset link failed.
	#[cfg(feature = "filter")]
	#[error(transparent)]
	Filter(#[from] tabula_filter::FilterError),

	/// Reordering or deleting tree nodes failed.
	#[cfg(feature = "tree")]
	#[error(transparent)]
	Tree(#[from] tabula_tree::TreeError),

	/// Configuring columns or building sort links failed.
	#[cfg(feature = "columns")]
	#[error(transparent)]
	Column(#[from] tabula_columns::ColumnError),

	/// The query executor failed.
	#[error(transparent)]
	Query(#[from] QueryError),

	/// Settings could not be loaded.
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// The export parameter is not `all`, `page:{n}` or `selected:{ids}`.
	#[error("Invalid export scope: {0}")]
	InvalidExportScope(String),
}

/// Result type alias for grid operations.
pub type GridResult<T> = Result<T, GridError>;

impl GridError {
	/// Returns true for errors caused by the request rather than by the
	/// grid configuration or the executor.
	pub fn is_bad_request(&self) -> bool {
		matches!(self, GridError::InvalidExportScope(_))
	}
}
