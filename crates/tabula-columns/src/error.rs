//! Column error types

use thiserror::Error;

/// Errors raised while configuring columns or building sort links.
#[derive(Debug, Error)]
pub enum ColumnError {
	/// No displayer is registered under the name.
	#[error("Unknown displayer: {0}")]
	UnknownDisplayer(String),

	/// A displayer was called with arguments it cannot use.
	#[error("Invalid arguments for displayer {displayer}: {reason}")]
	InvalidArguments {
		/// Displayer name.
		displayer: String,
		/// What was wrong.
		reason: String,
	},

	/// The pipeline has no column of that name.
	#[error("Unknown column: {0}")]
	UnknownColumn(String),

	/// Registration attempted after the registry was frozen.
	#[error("Displayer registry is frozen, cannot register {0}")]
	RegistryFrozen(String),

	/// The URL to build a sort link from could not be parsed.
	#[error("Invalid URL: {0}")]
	InvalidUrl(String),
}

/// Result type alias for column operations.
pub type ColumnResult<T> = Result<T, ColumnError>;
