//! Grids: filters, sorting, pagination and column rendering in one request

use crate::error::GridResult;
use crate::export::ExportScope;
use indexmap::IndexMap;
use serde::Serialize;
use tabula_columns::{ColumnPipeline, SortLink};
use tabula_core::value::as_number;
use tabula_core::{QueryBuilder, QueryExecutor, QueryParams, Row, TabulaSettings, Value};
use tabula_filter::FilterSet;

/// What a grid hands to the presentation layer for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridOutput {
	/// Rendered rows of the current page.
	pub rows: Vec<Row>,
	/// Rows matching the filters, over all pages.
	pub total: usize,
	/// Current page, 1-based.
	pub page: usize,
	/// Rows per page.
	pub per_page: usize,
	/// Number of pages; at least 1.
	pub total_pages: usize,
	/// Header sort links, keyed by column name.
	pub sort_links: IndexMap<String, SortLink>,
	/// The current URL with every filter removed.
	pub reset_url: String,
	/// Whether the filter panel starts open.
	pub expanded: bool,
}

/// A filterable, sortable, paginated listing.
///
/// A named grid namespaces all of its request parameters with `{name}_`
/// so several grids can share a page.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula::{FilterField, Grid};
/// use tabula_core::{MemoryTable, QueryParams};
///
/// let table = MemoryTable::from_values(vec![
///     json!({"id": 1, "title": "Rust <3"}),
///     json!({"id": 2, "title": "Go"}),
/// ]);
/// let mut grid = Grid::new("posts");
/// grid.filters_mut().push(FilterField::like("title")).unwrap();
/// grid.columns_mut().column("title").sortable();
///
/// let params = QueryParams::from_query_str("posts_title=Rust").unwrap();
/// let output = grid.rows("/admin/posts?posts_title=Rust", &params, &table).unwrap();
///
/// assert_eq!(output.total, 1);
/// assert_eq!(output.rows[0]["title"], json!("Rust &lt;3"));
/// assert_eq!(output.reset_url, "/admin/posts");
/// assert!(output.expanded);
/// ```
#[derive(Debug)]
pub struct Grid {
	name: Option<String>,
	filters: FilterSet,
	columns: ColumnPipeline,
	settings: TabulaSettings,
}

impl Grid {
	/// Creates a grid keyed by `id`; an empty name leaves parameters
	/// un-namespaced.
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_settings(name, "id", TabulaSettings::default())
	}

	/// Creates a grid with a primary key and settings.
	pub fn with_settings(
		name: impl Into<String>,
		primary_key: impl Into<String>,
		settings: TabulaSettings,
	) -> Self {
		let name = Some(name.into()).filter(|name| !name.is_empty());
		let mut filters = FilterSet::new(primary_key).with_reserved_keys(settings.reserved.clone());
		if let Some(name) = &name {
			filters.set_name(name.clone());
		}
		Self {
			name,
			filters,
			columns: ColumnPipeline::new(),
			settings,
		}
	}

	/// The grid name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Settings in use.
	pub fn settings(&self) -> &TabulaSettings {
		&self.settings
	}

	/// The filter set.
	pub fn filters(&self) -> &FilterSet {
		&self.filters
	}

	/// The filter set, for configuration.
	pub fn filters_mut(&mut self) -> &mut FilterSet {
		&mut self.filters
	}

	/// The output columns.
	pub fn columns(&self) -> &ColumnPipeline {
		&self.columns
	}

	/// The output columns, for configuration.
	pub fn columns_mut(&mut self) -> &mut ColumnPipeline {
		&mut self.columns
	}

	/// Replaces the output columns, e.g. with a pipeline using its own
	/// displayer registry.
	pub fn set_columns(&mut self, columns: ColumnPipeline) -> &mut Self {
		self.columns = columns;
		self
	}

	/// A reserved parameter name as this grid reads it.
	pub fn request_key(&self, key: &str) -> String {
		match &self.name {
			Some(name) => format!("{name}_{key}"),
			None => key.to_string(),
		}
	}

	/// Renders the page of rows a request asks for.
	pub fn rows<E: QueryExecutor>(
		&mut self,
		url: &str,
		params: &QueryParams,
		executor: &E,
	) -> GridResult<GridOutput> {
		let mut query = executor.query();
		self.filters.apply(params, &mut query);
		let sort_key = self.request_key(&self.settings.reserved.sort);
		self.columns.apply_sort(&mut query, params, &sort_key);

		let total = executor.count(&query)?;
		let per_page = self.per_page(params);
		let total_pages = total.div_ceil(per_page).max(1);
		let page = self.page(params).min(total_pages);

		let rows = executor.fetch(&query, (page - 1) * per_page, Some(per_page))?;
		tracing::debug!(
			grid = self.name.as_deref().unwrap_or_default(),
			total,
			page,
			fetched = rows.len(),
			"grid page fetched"
		);

		Ok(GridOutput {
			rows: self.columns.apply(rows),
			total,
			page,
			per_page,
			total_pages,
			sort_links: self.columns.sort_links(url, params, &sort_key)?,
			reset_url: self.filters.url_without_filters(url)?,
			expanded: self.filters.is_expanded(),
		})
	}

	/// The export scope the request asks for, if any.
	pub fn export_scope(&self, params: &QueryParams) -> GridResult<Option<ExportScope>> {
		let key = self.request_key(&self.settings.reserved.export);
		match params.get_str(&key) {
			None | Some("") => Ok(None),
			Some(scope) => scope.parse().map(Some),
		}
	}

	/// Streams the rows of an export scope to `callback` in batches.
	///
	/// Rows are filtered and sorted like [`rows`](Self::rows) but not
	/// rendered. Returns `false` when the callback stopped the export.
	pub fn export<E, F>(
		&mut self,
		scope: &ExportScope,
		params: &QueryParams,
		executor: &E,
		mut callback: F,
	) -> GridResult<bool>
	where
		E: QueryExecutor,
		F: FnMut(Vec<Row>) -> bool,
	{
		let mut query = executor.query();
		self.filters.apply(params, &mut query);
		if let ExportScope::Selected(ids) = scope {
			let ids = ids.iter().cloned().map(Value::String).collect();
			query.where_in(self.filters.primary_key(), ids, false);
		}
		let sort_key = self.request_key(&self.settings.reserved.sort);
		self.columns.apply_sort(&mut query, params, &sort_key);

		let (mut offset, end) = match scope {
			ExportScope::Page(page) => {
				let per_page = self.per_page(params);
				// A page beyond addressable offsets holds no rows.
				let Some(start) = page.saturating_sub(1).checked_mul(per_page) else {
					return Ok(true);
				};
				(start, Some(start.saturating_add(per_page)))
			}
			ExportScope::All | ExportScope::Selected(_) => (0, None),
		};
		let chunk_size = self.settings.pagination.chunk_size.max(1);

		loop {
			let limit = match end {
				Some(end) if offset >= end => return Ok(true),
				Some(end) => chunk_size.min(end - offset),
				None => chunk_size,
			};
			let batch = executor.fetch(&query, offset, Some(limit))?;
			let fetched = batch.len();
			if fetched == 0 {
				return Ok(true);
			}
			tracing::debug!(scope = %scope, offset, fetched, "export batch fetched");
			if !callback(batch) {
				return Ok(false);
			}
			if fetched < limit {
				return Ok(true);
			}
			offset += fetched;
		}
	}

	fn per_page(&self, params: &QueryParams) -> usize {
		let key = self.request_key(&self.settings.reserved.per_page);
		let requested = params
			.get(&key)
			.and_then(as_number)
			.filter(|n| *n >= 1.0)
			.map(|n| n as usize);
		self.settings.pagination.clamp(requested)
	}

	fn page(&self, params: &QueryParams) -> usize {
		let key = self.settings.reserved.page_key(self.name());
		params
			.get(&key)
			.and_then(as_number)
			.filter(|n| *n >= 1.0)
			.map(|n| n as usize)
			.unwrap_or(1)
	}
}
