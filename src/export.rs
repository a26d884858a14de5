//! Export scopes
//!
//! An export request names which rows to export in the `_export_`
//! parameter: `all`, `page:{n}` or `selected:{id},{id},...`.

use crate::error::{GridError, GridResult};
use std::fmt;
use std::str::FromStr;

/// Which rows an export covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
	/// Every row matching the filters.
	All,
	/// One page of the filtered rows, 1-based.
	Page(usize),
	/// The rows with the given primary keys, still subject to the filters.
	Selected(Vec<String>),
}

impl ExportScope {
	/// The `(parameter, value)` pair requesting this scope.
	///
	/// # Examples
	///
	/// ```
	/// use tabula::export::ExportScope;
	///
	/// let (key, value) = ExportScope::Selected(vec!["3".into(), "5".into()]).to_query("_export_");
	/// assert_eq!((key.as_str(), value.as_str()), ("_export_", "selected:3,5"));
	/// ```
	pub fn to_query(&self, key: &str) -> (String, String) {
		(key.to_string(), self.to_string())
	}
}

impl fmt::Display for ExportScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExportScope::All => f.write_str("all"),
			ExportScope::Page(page) => write!(f, "page:{page}"),
			ExportScope::Selected(ids) => write!(f, "selected:{}", ids.join(",")),
		}
	}
}

impl FromStr for ExportScope {
	type Err = GridError;

	fn from_str(input: &str) -> GridResult<Self> {
		let invalid = || GridError::InvalidExportScope(input.to_string());
		let (scope, args) = match input.split_once(':') {
			Some((scope, args)) => (scope, Some(args)),
			None => (input, None),
		};

		match (scope, args) {
			("all", None) => Ok(ExportScope::All),
			("page", Some(page)) => page
				.trim()
				.parse::<usize>()
				.ok()
				.filter(|page| *page > 0)
				.map(ExportScope::Page)
				.ok_or_else(invalid),
			("selected", Some(ids)) => {
				let ids: Vec<String> = ids
					.split(',')
					.map(str::trim)
					.filter(|id| !id.is_empty())
					.map(str::to_string)
					.collect();
				if ids.is_empty() {
					Err(invalid())
				} else {
					Ok(ExportScope::Selected(ids))
				}
			}
			_ => Err(invalid()),
		}
	}
}
