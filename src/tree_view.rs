//! Tree views: listing, reordering and editing a hierarchical resource

use crate::error::GridResult;
use indexmap::IndexMap;
use tabula_core::value::row_get;
use tabula_core::{QueryBuilder, QueryExecutor, QueryParams, Row, TabulaSettings, Value};
use tabula_tree::{RowStore, TreeBuilder, TreeNode, order};

/// Request handling for a self-referential resource.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula::TreeView;
/// use tabula_core::QueryParams;
/// use tabula_tree::MemoryStore;
///
/// let mut store = MemoryStore::from_values("id", vec![
///     json!({"id": 1, "parent_id": 0, "order": 0, "title": "Docs"}),
///     json!({"id": 2, "parent_id": 0, "order": 0, "title": "Guide"}),
/// ]);
/// let view = TreeView::default();
///
/// let params = QueryParams::from_query_str(r#"_order=[{"id":2,"children":[{"id":1}]}]"#).unwrap();
/// assert_eq!(view.handle_order(&mut store, &params).unwrap(), Some(2));
///
/// let tree = view.tree(&store.table()).unwrap();
/// assert_eq!(tree[0].title, "Guide");
/// assert_eq!(tree[0].children[0].title, "Docs");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeView {
	builder: TreeBuilder,
	settings: TabulaSettings,
}

impl TreeView {
	/// Creates a view using the tree columns and reserved keys of `settings`.
	pub fn new(settings: TabulaSettings) -> Self {
		Self {
			builder: TreeBuilder::new(settings.tree.clone()),
			settings,
		}
	}

	/// Adds constraints to every load.
	pub fn with_query<F>(mut self, callback: F) -> Self
	where
		F: Fn(&mut dyn QueryBuilder) + Send + Sync + 'static,
	{
		self.builder = self.builder.with_query(callback);
		self
	}

	/// The underlying builder.
	pub fn builder(&self) -> &TreeBuilder {
		&self.builder
	}

	/// Loads and nests every row.
	pub fn tree<E: QueryExecutor>(&self, executor: &E) -> GridResult<Vec<TreeNode>> {
		Ok(self.builder.load_tree(executor)?)
	}

	/// Loads every row as indented `{key: label}` select options, the root
	/// entry first.
	pub fn options<E: QueryExecutor>(&self, executor: &E) -> GridResult<IndexMap<String, String>> {
		let rows = self.builder.load(executor)?;
		Ok(self.builder.to_indented_options(&rows))
	}

	/// Persists the reordered tree carried by the order parameter.
	///
	/// Returns `None` when the request has no order parameter, otherwise
	/// the number of rows saved.
	pub fn handle_order<S: RowStore + ?Sized>(
		&self,
		store: &mut S,
		params: &QueryParams,
	) -> GridResult<Option<usize>> {
		let payload = match params.get_str(&self.settings.reserved.order) {
			Some(payload) if !payload.trim().is_empty() => payload,
			_ => return Ok(None),
		};
		let tree = order::parse_order_payload(payload)?;
		let saved = order::save_order(store, &self.settings.tree, &tree, &self.settings.tree.root_id)?;
		Ok(Some(saved))
	}

	/// Saves a record edited through a form, refusing to make it its own
	/// parent.
	pub fn save<S: RowStore + ?Sized>(&self, store: &mut S, id: &Value, values: Row) -> GridResult<()> {
		if let Some(parent) = row_get(&values, &self.settings.tree.parent_column) {
			order::guard_parent(id, parent)?;
		}
		store.save(id, values)?;
		Ok(())
	}

	/// Deletes a node and its direct children; returns the rows removed.
	pub fn delete<S: RowStore + ?Sized>(&self, store: &mut S, id: &Value) -> GridResult<usize> {
		Ok(order::delete(store, &self.settings.tree, id)?)
	}
}
