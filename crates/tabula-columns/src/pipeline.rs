//! Applying column display chains to fetched rows

use crate::column::Column;
use crate::error::{ColumnError, ColumnResult};
use crate::registry::{self, DisplayerRegistry};
use crate::sort::{SortLink, SortSpec, apply_sort, sort_link};
use crate::transform::{Transform, run_chain};
use indexmap::IndexMap;
use std::sync::Arc;
use tabula_core::html::encode_value;
use tabula_core::value::{row_get, row_set};
use tabula_core::{QueryBuilder, QueryParams, Row, Value};

/// The ordered output columns of a grid.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_columns::ColumnPipeline;
/// use tabula_core::Row;
///
/// let mut pipeline = ColumnPipeline::new();
/// pipeline.column("title");
/// pipeline
///     .column("author.name")
///     .display(|value, _, _| json!(format!("by {}", value.as_str().unwrap_or("?"))));
///
/// let row: Row = json!({"title": "<Rust>", "author": {"name": "Ann"}})
///     .as_object()
///     .cloned()
///     .unwrap();
/// let rows = pipeline.apply(vec![row]);
///
/// assert_eq!(rows[0]["title"], json!("&lt;Rust&gt;"));
/// assert_eq!(rows[0]["author"]["name"], json!("by Ann"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnPipeline {
	columns: Vec<Column>,
	registry: Option<Arc<DisplayerRegistry>>,
}

impl ColumnPipeline {
	/// Creates an empty pipeline resolving displayers and column definitions
	/// in the process-wide registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolves displayers and column definitions in `registry` instead.
	pub fn with_registry(registry: Arc<DisplayerRegistry>) -> Self {
		Self {
			columns: Vec::new(),
			registry: Some(registry),
		}
	}

	/// The registry displayers are resolved in.
	pub fn registry(&self) -> &DisplayerRegistry {
		self.registry.as_deref().unwrap_or_else(|| registry::global())
	}

	/// Returns the column reading `name`, adding it first when missing.
	pub fn column(&mut self, name: &str) -> &mut Column {
		let index = match self.position(name) {
			Some(index) => index,
			None => {
				self.columns.push(Column::new(name, ""));
				self.columns.len() - 1
			}
		};
		&mut self.columns[index]
	}

	/// Adds a relation column, see [`Column::relation`].
	pub fn relation(&mut self, relation: &str, column: Option<&str>) -> &mut Column {
		self.push(Column::relation(relation, column))
	}

	/// Adds a configured column.
	pub fn push(&mut self, column: Column) -> &mut Column {
		self.columns.push(column);
		let last = self.columns.len() - 1;
		&mut self.columns[last]
	}

	/// Columns in output order.
	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	/// Looks a column up by name.
	pub fn get(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Appends a transform to an existing column's chain.
	pub fn register_transform(&mut self, column: &str, transform: Transform) -> ColumnResult<()> {
		let index = self
			.position(column)
			.ok_or_else(|| ColumnError::UnknownColumn(column.to_string()))?;
		self.columns[index].push_transform(transform);
		Ok(())
	}

	/// Calls a displayer on a column through this pipeline's registry.
	pub fn call(&mut self, column: &str, displayer: &str, args: Vec<Value>) -> ColumnResult<()> {
		let index = self
			.position(column)
			.ok_or_else(|| ColumnError::UnknownColumn(column.to_string()))?;
		let registry = self.registry.clone();
		let registry = registry.as_deref().unwrap_or_else(|| registry::global());
		self.columns[index].call_with(registry, displayer, args)?;
		Ok(())
	}

	/// Renders every column of every row.
	///
	/// Each cell starts as the entity-encoded raw value. When the column has
	/// a chain (or a registered definition, which replaces the chain), the
	/// chain runs on the raw value and its output replaces the cell. Every
	/// transform sees the row as it was before rendering.
	pub fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
		let registry = self.registry();
		let chains: Vec<Vec<Transform>> = self
			.columns
			.iter()
			.map(|column| match registry.definition(column.name()) {
				Some(definition) => vec![definition],
				None => column.transforms().to_vec(),
			})
			.collect();

		let mut rendered = rows.clone();
		for (row, original) in rendered.iter_mut().zip(&rows) {
			for (column, chain) in self.columns.iter().zip(&chains) {
				let raw = row_get(original, column.name()).cloned().unwrap_or(Value::Null);
				row_set(row, column.name(), encode_value(&raw));
				if !chain.is_empty() {
					row_set(row, column.name(), run_chain(column, chain, raw, original));
				}
			}
		}

		tracing::debug!(
			rows = rendered.len(),
			columns = self.columns.len(),
			"applied column pipeline"
		);
		rendered
	}

	/// Orders `query` by the sort request under `key`, if it names a
	/// sortable column. Returns the applied request.
	pub fn apply_sort(
		&self,
		query: &mut dyn QueryBuilder,
		params: &QueryParams,
		key: &str,
	) -> Option<SortSpec> {
		let spec = SortSpec::from_params(params, key)?;
		apply_sort(&self.columns, query, &spec).then_some(spec)
	}

	/// Header sort links of the sortable columns, keyed by column name.
	pub fn sort_links(
		&self,
		url: &str,
		params: &QueryParams,
		key: &str,
	) -> ColumnResult<IndexMap<String, SortLink>> {
		let current = SortSpec::from_params(params, key);
		let mut links = IndexMap::new();
		for column in &self.columns {
			if let Some(link) = sort_link(column, url, current.as_ref(), key)? {
				links.insert(column.name().to_string(), link);
			}
		}
		Ok(links)
	}

	fn position(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|column| column.name() == name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::displayers::Displayer;
	use crate::transform::{TransformOutcome, transform};
	use rstest::{fixture, rstest};
	use serde_json::json;
	use tabula_core::{Direction, MemoryTable, QueryExecutor};

	fn row(value: Value) -> Row {
		value.as_object().cloned().unwrap_or_default()
	}

	#[fixture]
	fn local_registry() -> Arc<DisplayerRegistry> {
		Arc::new(DisplayerRegistry::with_builtins())
	}

	#[rstest]
	fn test_escaped_column_without_transforms() {
		// Arrange
		let mut pipeline = ColumnPipeline::new();
		pipeline.column("body");

		// Act
		let rows = pipeline.apply(vec![row(json!({"body": "<b>x</b>"}))]);

		// Assert
		assert_eq!(rows[0]["body"], json!("&lt;b&gt;x&lt;/b&gt;"));
	}

	#[rstest]
	fn test_unescaped_transform_output_is_verbatim() {
		// Arrange
		let mut pipeline = ColumnPipeline::new();
		pipeline
			.column("body")
			.escape(false)
			.display(|_, _, _| json!("<i>y</i>"));

		// Act
		let rows = pipeline.apply(vec![row(json!({"body": "<b>x</b>"}))]);

		// Assert
		assert_eq!(rows[0]["body"], json!("<i>y</i>"));
	}

	#[rstest]
	fn test_transforms_see_raw_value_and_original_row() {
		// Arrange
		let mut pipeline = ColumnPipeline::new();
		pipeline.column("name");
		pipeline.column("email").display(|value, _, row| {
			json!(format!("{} <{}>", row["name"].as_str().unwrap_or(""), value.as_str().unwrap_or("")))
		});

		// Act
		let rows = pipeline.apply(vec![row(json!({"name": "A&B", "email": "ab@x.io"}))]);

		// Assert
		assert_eq!(rows[0]["name"], json!("A&amp;B"));
		assert_eq!(rows[0]["email"], json!("A&amp;B &lt;ab@x.io&gt;"));
	}

	#[rstest]
	fn test_defer_to_last_in_pipeline() {
		// Arrange
		let mut pipeline = ColumnPipeline::new();
		pipeline
			.column("status")
			.display_with(|value, _, _| {
				if value == &json!("raw") {
					TransformOutcome::DeferToLast
				} else {
					TransformOutcome::Continue(value.clone())
				}
			})
			.display(|_, _, _| json!("middle"))
			.display(|value, _, _| json!(format!("<{}>", value.as_str().unwrap_or(""))));

		// Act
		let rows = pipeline.apply(vec![row(json!({"status": "raw"})), row(json!({"status": "x"}))]);

		// Assert
		assert_eq!(rows[0]["status"], json!("&lt;raw&gt;"));
		assert_eq!(rows[1]["status"], json!("&lt;middle&gt;"));
	}

	#[rstest]
	fn test_definition_replaces_chain(local_registry: Arc<DisplayerRegistry>) {
		// Arrange
		local_registry
			.define("price", transform(|value, _, _| json!(format!("${value}"))))
			.unwrap();
		let mut pipeline = ColumnPipeline::with_registry(local_registry);
		pipeline.column("price").display(|_, _, _| json!("ignored"));

		// Act
		let rows = pipeline.apply(vec![row(json!({"price": 5}))]);

		// Assert
		assert_eq!(rows[0]["price"], json!("$5"));
	}

	#[rstest]
	fn test_call_resolves_in_pipeline_registry(local_registry: Arc<DisplayerRegistry>) {
		// Arrange
		local_registry
			.extend("stars", |_| {
				Ok(Displayer::markup(|value, _, _| {
					json!("★".repeat(value.as_u64().unwrap_or(0) as usize))
				}))
			})
			.unwrap();
		let mut pipeline = ColumnPipeline::with_registry(local_registry);
		pipeline.column("rating");

		// Act
		pipeline.call("rating", "stars", vec![]).unwrap();
		let rows = pipeline.apply(vec![row(json!({"rating": 3}))]);

		// Assert
		assert_eq!(rows[0]["rating"], json!("★★★"));
		assert!(matches!(
			pipeline.call("missing", "stars", vec![]),
			Err(ColumnError::UnknownColumn(_))
		));
	}

	#[rstest]
	fn test_array_indexed_columns_keep_neighbours() {
		// Arrange
		let mut pipeline = ColumnPipeline::new();
		pipeline.column("tags.0");
		pipeline
			.column("tags.2")
			.display(|value, _, _| json!(value.as_str().unwrap_or("").to_uppercase()));

		// Act
		let rows = pipeline.apply(vec![row(json!({"tags": ["<a>", "b", "c"]}))]);

		// Assert
		assert_eq!(rows[0]["tags"], json!(["&lt;a&gt;", "b", "C"]));
	}

	#[rstest]
	fn test_register_transform_requires_column() {
		let mut pipeline = ColumnPipeline::new();

		let result = pipeline.register_transform("ghost", transform(|value, _, _| value.clone()));

		assert!(matches!(result, Err(ColumnError::UnknownColumn(name)) if name == "ghost"));
	}

	#[rstest]
	fn test_apply_sort_and_links() {
		// Arrange
		let table = MemoryTable::from_values(vec![
			json!({"id": 1, "title": "b"}),
			json!({"id": 2, "title": "a"}),
		]);
		let mut pipeline = ColumnPipeline::new();
		pipeline.column("id");
		pipeline.column("title").sortable();
		let params = QueryParams::from_query_str("_sort[column]=title&_sort[type]=asc").unwrap();
		let mut query = table.query();

		// Act
		let applied = pipeline.apply_sort(&mut query, &params, "_sort");
		let rows = table.fetch(&query, 0, None).unwrap();
		let links = pipeline.sort_links("/posts", &params, "_sort").unwrap();

		// Assert
		assert_eq!(applied.map(|spec| spec.direction), Some(Direction::Asc));
		assert_eq!(rows[0]["id"], json!(2));
		assert_eq!(links.len(), 1);
		assert_eq!(links["title"].next, Direction::Desc);
	}
}
