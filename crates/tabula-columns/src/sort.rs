//! Column sorting
//!
//! The sort request travels in one bracketed parameter (`_sort` by default):
//!
//! ```text
//! _sort[column]=created_at&_sort[type]=desc
//! _sort[column]=price&_sort[type]=asc&_sort[cast]=unsigned
//! _sort[column]=score&_sort[type]=asc&_sort[callback]=1
//! _sort[column]=author_id&_sort[type]=asc&_sort[direct]=1
//! ```

use crate::column::Column;
use crate::error::{ColumnError, ColumnResult};
use serde::{Deserialize, Serialize};
use tabula_core::params::parse_key;
use tabula_core::query::quote_ident;
use tabula_core::value::{display_string, key_string};
use tabula_core::{Direction, QueryBuilder, QueryParams};
use url::Url;

const RELATIVE_BASE: &str = "http://localhost";

/// A parsed sort request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
	/// Column name, or the explicit sort column when `direct` is set.
	pub column: String,
	/// Requested direction.
	pub direction: Direction,
	/// Cast requested by the link; the column's own cast is what gets applied.
	pub cast: Option<String>,
	/// The column sorts through its callback.
	pub callback: bool,
	/// `column` names the sort column rather than the displayed one.
	pub direct: bool,
}

impl SortSpec {
	/// Creates a plain column sort.
	pub fn new(column: impl Into<String>, direction: Direction) -> Self {
		Self {
			column: column.into(),
			direction,
			cast: None,
			callback: false,
			direct: false,
		}
	}

	/// Reads the sort request stored under `key`.
	///
	/// Returns `None` when the column is missing or the type is not
	/// `asc`/`desc`.
	///
	/// # Examples
	///
	/// ```
	/// use tabula_columns::SortSpec;
	/// use tabula_core::{Direction, QueryParams};
	///
	/// let params = QueryParams::from_query_str("_sort[column]=title&_sort[type]=desc").unwrap();
	/// let spec = SortSpec::from_params(&params, "_sort").unwrap();
	///
	/// assert_eq!(spec.column, "title");
	/// assert_eq!(spec.direction, Direction::Desc);
	/// ```
	pub fn from_params(params: &QueryParams, key: &str) -> Option<Self> {
		let column = params
			.get(&format!("{key}.column"))
			.map(display_string)
			.filter(|column| !column.is_empty())?;
		let direction = params
			.get_str(&format!("{key}.type"))
			.and_then(Direction::parse)?;
		let flag = |name: &str| {
			params
				.get(&format!("{key}.{name}"))
				.and_then(key_string)
				.is_some_and(|value| !value.is_empty() && value != "0")
		};

		Some(Self {
			column,
			direction,
			cast: params
				.get(&format!("{key}.cast"))
				.map(display_string)
				.filter(|cast| !cast.is_empty()),
			callback: flag("callback"),
			direct: flag("direct"),
		})
	}

	/// The request parameters carrying this sort, with bracket keys.
	pub fn to_pairs(&self, key: &str) -> Vec<(String, String)> {
		let mut pairs = vec![
			(format!("{key}[column]"), self.column.clone()),
			(format!("{key}[type]"), self.direction.as_str().to_string()),
		];
		if self.direct {
			pairs.push((format!("{key}[direct]"), "1".to_string()));
		}
		if self.callback {
			pairs.push((format!("{key}[callback]"), "1".to_string()));
		} else if let Some(cast) = &self.cast {
			pairs.push((format!("{key}[cast]"), cast.clone()));
		}
		pairs
	}

	/// Returns true when the request sorts by `column`.
	pub fn targets(&self, column: &Column) -> bool {
		self.column == column.name() || (column.has_sort_name() && self.column == column.sort_column())
	}
}

/// Link of a column header that sorts by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortLink {
	/// The current URL with the sort parameter replaced.
	pub url: String,
	/// Direction the column is sorted by in the current request.
	pub current: Option<Direction>,
	/// Direction the link sorts by.
	pub next: Direction,
}

impl SortLink {
	/// Font Awesome class of the header icon.
	pub fn icon(&self) -> String {
		match self.current {
			Some(direction) => format!("fa-sort-amount-{direction}"),
			None => "fa-sort".to_string(),
		}
	}
}

/// Orders `query` by the requested column.
///
/// Only sortable columns take part; a request for any other column is
/// ignored. Returns true when an ordering was applied.
pub fn apply_sort(columns: &[Column], query: &mut dyn QueryBuilder, spec: &SortSpec) -> bool {
	let Some(column) = columns
		.iter()
		.find(|column| column.is_sortable() && spec.targets(column))
	else {
		tracing::warn!(column = %spec.column, "ignoring sort on unknown or unsortable column");
		return false;
	};

	if let Some(callback) = column.get_sort_callback() {
		callback(query, spec.direction);
		return true;
	}

	match column.get_cast() {
		Some(cast) if is_cast_type(cast) => {
			query.order_by_raw(&format!(
				"CAST({} AS {}) {}",
				quote_ident(column.sort_column()),
				cast,
				spec.direction.as_str().to_uppercase()
			));
		}
		Some(cast) => {
			tracing::warn!(column = %column.name(), cast, "ignoring sort with invalid cast");
			return false;
		}
		None => query.order_by(column.sort_column(), spec.direction),
	}
	true
}

fn is_cast_type(cast: &str) -> bool {
	!cast.trim().is_empty()
		&& cast
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '(' | ')' | ','))
}

/// Builds the header link of a sortable column.
///
/// The link sorts descending, or reverses the direction when the current
/// request already sorts by the column. Returns `None` for columns that are
/// not sortable.
///
/// # Examples
///
/// ```
/// use tabula_columns::Column;
/// use tabula_columns::sort::{SortSpec, sort_link};
/// use tabula_core::Direction;
///
/// let mut column = Column::new("title", "");
/// column.sortable();
/// let current = SortSpec::new("title", Direction::Desc);
///
/// let link = sort_link(&column, "/posts?page=2", Some(&current), "_sort").unwrap().unwrap();
///
/// assert_eq!(link.url, "/posts?page=2&_sort%5Bcolumn%5D=title&_sort%5Btype%5D=asc");
/// assert_eq!(link.icon(), "fa-sort-amount-desc");
/// ```
pub fn sort_link(
	column: &Column,
	url: &str,
	current: Option<&SortSpec>,
	key: &str,
) -> ColumnResult<Option<SortLink>> {
	if !column.is_sortable() {
		return Ok(None);
	}

	let active = current
		.filter(|spec| spec.targets(column))
		.map(|spec| spec.direction);
	let next = active.map(|direction| direction.toggled()).unwrap_or(Direction::Desc);

	let spec = SortSpec {
		column: column.sort_column().to_string(),
		direction: next,
		cast: column.get_cast().map(str::to_string),
		callback: column.get_sort_callback().is_some(),
		direct: column.has_sort_name(),
	};

	Ok(Some(SortLink {
		url: replace_parameter(url, key, spec.to_pairs(key))?,
		current: active,
		next,
	}))
}

fn replace_parameter(url: &str, key: &str, pairs: Vec<(String, String)>) -> ColumnResult<String> {
	let invalid = |e: url::ParseError| ColumnError::InvalidUrl(format!("{url}: {e}"));
	let (mut parsed, relative) = match Url::parse(url) {
		Ok(parsed) => (parsed, false),
		Err(url::ParseError::RelativeUrlWithoutBase) => {
			let base = Url::parse(RELATIVE_BASE).map_err(invalid)?;
			(base.join(url).map_err(invalid)?, true)
		}
		Err(e) => return Err(invalid(e)),
	};

	let mut kept: Vec<(String, String)> = parsed
		.query_pairs()
		.filter(|(name, _)| parse_key(name).first().map(String::as_str) != Some(key))
		.map(|(name, value)| (name.into_owned(), value.into_owned()))
		.collect();
	kept.extend(pairs);

	parsed.set_query(None);
	parsed.query_pairs_mut().extend_pairs(kept);

	if !relative {
		return Ok(parsed.to_string());
	}
	let mut out = parsed.path().to_string();
	if let Some(query) = parsed.query() {
		out.push('?');
		out.push_str(query);
	}
	Ok(out)
}
