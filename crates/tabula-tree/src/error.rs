//! Tree error types

use tabula_core::QueryError;
use thiserror::Error;

/// Errors raised while building, reordering or deleting tree nodes.
#[derive(Debug, Error)]
pub enum TreeError {
	/// A node was submitted as its own parent.
	#[error("Node {0} cannot be its own parent")]
	SelfParent(String),

	/// A submitted node does not exist in the store.
	#[error("Node not found: {0}")]
	NodeNotFound(String),

	/// The serialized order could not be decoded.
	#[error("Invalid order payload: {0}")]
	InvalidOrderPayload(String),

	/// The row store failed.
	#[error("Store error: {0}")]
	Store(String),

	/// Loading the rows failed.
	#[error(transparent)]
	Query(#[from] QueryError),
}

/// Result type alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
