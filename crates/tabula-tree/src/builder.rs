//! Hierarchy reconstruction from flat, ordered rows

use crate::error::TreeResult;
use crate::node::TreeNode;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tabula_core::query::quote_ident;
use tabula_core::value::{as_number, display_string, key_string, row_get};
use tabula_core::{QueryBuilder, QueryExecutor, Row, TreeSettings};

/// Extra constraints applied when loading tree rows.
pub type QueryCallback = Arc<dyn Fn(&mut dyn QueryBuilder) + Send + Sync>;

/// Builds nested trees and indented select options from self-referential
/// rows.
///
/// Rows are expected in fetch order: positive `order` values first, in
/// ascending order, followed by unranked (`order = 0`) rows. Sibling order in
/// every output is the order in which rows appear in the input.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::MemoryTable;
/// use tabula_tree::TreeBuilder;
///
/// let table = MemoryTable::from_values(vec![
///     json!({"id": 1, "parent_id": 0, "order": 2, "title": "Docs"}),
///     json!({"id": 2, "parent_id": 0, "order": 1, "title": "Blog"}),
///     json!({"id": 3, "parent_id": 1, "order": 0, "title": "Guide"}),
/// ]);
///
/// let builder = TreeBuilder::default();
/// let rows = builder.load(&table).unwrap();
/// let tree = builder.to_nested_tree(&rows);
///
/// assert_eq!(tree[0].title, "Blog");
/// assert_eq!(tree[1].children[0].title, "Guide");
/// ```
#[derive(Clone, Default)]
pub struct TreeBuilder {
	settings: TreeSettings,
	query_callback: Option<QueryCallback>,
}

impl TreeBuilder {
	/// Creates a builder using the given column names and root sentinel.
	pub fn new(settings: TreeSettings) -> Self {
		Self {
			settings,
			query_callback: None,
		}
	}

	/// Adds constraints to every [`load`](Self::load).
	pub fn with_query<F>(mut self, callback: F) -> Self
	where
		F: Fn(&mut dyn QueryBuilder) + Send + Sync + 'static,
	{
		self.query_callback = Some(Arc::new(callback));
		self
	}

	/// Column names, root sentinel and indentation glyphs in use.
	pub fn settings(&self) -> &TreeSettings {
		&self.settings
	}

	/// Stable-sorts rows so that ranked rows come first by ascending order
	/// and unranked rows keep their relative position at the end.
	pub fn sort_nodes(&self, rows: &mut [Row]) {
		rows.sort_by_key(|row| {
			let order = self.order_of(row);
			(order == 0, order)
		});
	}

	/// Fetches every row ordered by `order = 0, order`.
	pub fn load<E: QueryExecutor>(&self, executor: &E) -> TreeResult<Vec<Row>> {
		let mut query = executor.query();
		if let Some(callback) = &self.query_callback {
			let builder: &mut dyn QueryBuilder = &mut query;
			callback(builder);
		}
		let order = quote_ident(&self.settings.order_column);
		query.order_by_raw(&format!("{order} = 0, {order}"));

		let mut rows = executor.fetch(&query, 0, None)?;
		// Executors that cannot evaluate the raw clause still get the same order.
		self.sort_nodes(&mut rows);
		tracing::debug!(rows = rows.len(), "loaded tree rows");
		Ok(rows)
	}

	/// Loads the rows and nests them.
	pub fn load_tree<E: QueryExecutor>(&self, executor: &E) -> TreeResult<Vec<TreeNode>> {
		let rows = self.load(executor)?;
		Ok(self.to_nested_tree(&rows))
	}

	/// Nests rows under their parents, starting from the root sentinel.
	///
	/// A `null` parent counts as the root. Rows without a key, rows whose key
	/// repeats an earlier row and rows not reachable from the root (orphans
	/// and cycles) are skipped.
	///
	/// Runs in O(n) over the rows. Nesting recurses once per level, so a
	/// single chain tens of thousands of levels deep can exhaust the stack.
	pub fn to_nested_tree(&self, rows: &[Row]) -> Vec<TreeNode> {
		let mut by_parent: HashMap<Option<String>, Vec<usize>> = HashMap::new();
		for (index, row) in rows.iter().enumerate() {
			by_parent
				.entry(self.parent_key(row))
				.or_default()
				.push(index);
		}

		let mut visited = HashSet::new();
		let tree = self.nest(rows, &by_parent, &self.root_key(), &mut visited);

		let skipped = rows.len() - visited.len();
		if skipped > 0 {
			tracing::warn!(skipped, "tree rows unreachable from the root were skipped");
		}
		tree
	}

	fn nest(
		&self,
		rows: &[Row],
		by_parent: &HashMap<Option<String>, Vec<usize>>,
		parent: &Option<String>,
		visited: &mut HashSet<String>,
	) -> Vec<TreeNode> {
		let Some(children) = by_parent.get(parent) else {
			return Vec::new();
		};

		let mut nodes = Vec::with_capacity(children.len());
		for &index in children {
			let row = &rows[index];
			let Some(id) = self.key_of(row) else {
				tracing::warn!(index, "tree row without a key was skipped");
				continue;
			};
			if !visited.insert(id.clone()) {
				tracing::warn!(id = %id, "duplicate tree row was skipped");
				continue;
			}

			let children = self.nest(rows, by_parent, &Some(id), visited);
			nodes.push(self.node(row, children));
		}
		nodes
	}

	fn node(&self, row: &Row, children: Vec<TreeNode>) -> TreeNode {
		let settings = &self.settings;
		TreeNode {
			id: row_get(row, &settings.key_column).cloned().unwrap_or_default(),
			parent_id: row_get(row, &settings.parent_column)
				.filter(|value| !value.is_null())
				.cloned()
				.unwrap_or_else(|| settings.root_id.clone()),
			order: self.order_of(row),
			title: row_get(row, &settings.title_column)
				.map(display_string)
				.unwrap_or_default(),
			row: row.clone(),
			children,
		}
	}

	/// Flattens rows into `id => label` pairs for a parent-selection input.
	///
	/// The root entry comes first. Each label is `prefix + unit + title`; the
	/// first level prefix is the branch glyph followed by one unit, and each
	/// deeper level shifts the glyph right by six units.
	///
	/// Same complexity and recursion depth as
	/// [`to_nested_tree`](Self::to_nested_tree).
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use tabula_core::{Row, TreeSettings};
	/// use tabula_tree::TreeBuilder;
	///
	/// let mut settings = TreeSettings::default();
	/// settings.indent_unit = " ".to_string();
	/// let builder = TreeBuilder::new(settings);
	/// let rows: Vec<Row> = [
	///     json!({"id": 1, "parent_id": 0, "title": "Docs"}),
	///     json!({"id": 2, "parent_id": 1, "title": "Guide"}),
	/// ]
	/// .into_iter()
	/// .filter_map(|value| value.as_object().cloned())
	/// .collect();
	///
	/// let options = builder.to_indented_options(&rows);
	///
	/// assert_eq!(options["0"], "ROOT");
	/// assert_eq!(options["1"], "┝  Docs");
	/// assert_eq!(options["2"], "       ┝ Guide");
	/// ```
	pub fn to_indented_options(&self, rows: &[Row]) -> IndexMap<String, String> {
		let mut options = IndexMap::new();
		if let Some(root) = self.root_key() {
			options.insert(root, self.settings.root_text.clone());
		}

		let unit = &self.settings.indent_unit;
		let glyph = &self.settings.branch_glyph;
		let prefix = format!("{glyph}{unit}");
		self.collect_options(&self.to_nested_tree(rows), &prefix, &mut options);
		options
	}

	fn collect_options(
		&self,
		nodes: &[TreeNode],
		prefix: &str,
		options: &mut IndexMap<String, String>,
	) {
		let unit = &self.settings.indent_unit;
		let glyph = &self.settings.branch_glyph;
		let child_prefix = format!(
			"{}{glyph}{}",
			prefix.replace(glyph.as_str(), &unit.repeat(6)),
			prefix.replace(glyph.as_str(), "").replace(unit.as_str(), ""),
		);

		for node in nodes {
			let Some(id) = key_string(&node.id) else {
				continue;
			};
			options
				.entry(id)
				.or_insert_with(|| format!("{prefix}{unit}{}", node.title));
			self.collect_options(&node.children, &child_prefix, options);
		}
	}

	fn root_key(&self) -> Option<String> {
		key_string(&self.settings.root_id)
	}

	fn key_of(&self, row: &Row) -> Option<String> {
		row_get(row, &self.settings.key_column).and_then(key_string)
	}

	fn parent_key(&self, row: &Row) -> Option<String> {
		row_get(row, &self.settings.parent_column)
			.and_then(key_string)
			.or_else(|| self.root_key())
	}

	fn order_of(&self, row: &Row) -> i64 {
		row_get(row, &self.settings.order_column)
			.and_then(as_number)
			.map(|order| order as i64)
			.unwrap_or(0)
	}
}

impl fmt::Debug for TreeBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TreeBuilder")
			.field("settings", &self.settings)
			.field("query_callback", &self.query_callback.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::{Value, json};
	use tabula_core::{Comparison, MemoryTable};

	fn rows(values: Vec<Value>) -> Vec<Row> {
		values
			.into_iter()
			.filter_map(|value| value.as_object().cloned())
			.collect()
	}

	#[fixture]
	fn menu() -> Vec<Row> {
		rows(vec![
			json!({"id": 1, "parent_id": 0, "order": 1, "title": "Index"}),
			json!({"id": 2, "parent_id": 0, "order": 2, "title": "Admin"}),
			json!({"id": 3, "parent_id": 2, "order": 3, "title": "Users"}),
			json!({"id": 4, "parent_id": 2, "order": 4, "title": "Roles"}),
			json!({"id": 5, "parent_id": 4, "order": 5, "title": "Permissions"}),
		])
	}

	#[rstest]
	fn test_sort_nodes_puts_unranked_rows_last() {
		// Arrange
		let builder = TreeBuilder::default();
		let mut rows = rows(vec![
			json!({"id": 1, "order": 0}),
			json!({"id": 2, "order": 3}),
			json!({"id": 3, "order": 0}),
			json!({"id": 4, "order": 1}),
		]);

		// Act
		builder.sort_nodes(&mut rows);

		// Assert
		let ids: Vec<_> = rows.iter().map(|row| row["id"].clone()).collect();
		assert_eq!(ids, vec![json!(4), json!(2), json!(1), json!(3)]);
	}

	#[rstest]
	fn test_nested_tree_follows_parent_links(menu: Vec<Row>) {
		let tree = TreeBuilder::default().to_nested_tree(&menu);

		assert_eq!(tree.len(), 2);
		assert_eq!(tree[1].title, "Admin");
		assert_eq!(tree[1].children.len(), 2);
		assert_eq!(tree[1].children[1].children[0].title, "Permissions");
		assert_eq!(tree.iter().map(TreeNode::size).sum::<usize>(), 5);
	}

	#[rstest]
	fn test_orphans_cycles_and_duplicates_are_skipped() {
		// Arrange
		let rows = rows(vec![
			json!({"id": 1, "parent_id": 0, "title": "a"}),
			json!({"id": 1, "parent_id": 0, "title": "a again"}),
			json!({"id": 2, "parent_id": 99, "title": "orphan"}),
			json!({"id": 3, "parent_id": 4, "title": "cycle"}),
			json!({"id": 4, "parent_id": 3, "title": "cycle"}),
			json!({"id": 5, "parent_id": null, "title": "null parent"}),
		]);

		// Act
		let tree = TreeBuilder::default().to_nested_tree(&rows);

		// Assert
		let titles: Vec<_> = tree.iter().map(|node| node.title.as_str()).collect();
		assert_eq!(titles, vec!["a", "null parent"]);
		assert_eq!(tree[1].parent_id, json!(0));
	}

	#[rstest]
	fn test_indented_options(menu: Vec<Row>) {
		// Arrange
		let mut settings = TreeSettings::default();
		settings.indent_unit = "_".to_string();
		settings.root_text = "Top".to_string();
		let builder = TreeBuilder::new(settings);

		// Act
		let options = builder.to_indented_options(&menu);

		// Assert
		let expected = vec![
			("0", "Top"),
			("1", "┝__Index"),
			("2", "┝__Admin"),
			("3", "_______┝_Users"),
			("4", "_______┝_Roles"),
			("5", "_____________┝_Permissions"),
		];
		let actual: Vec<_> = options
			.iter()
			.map(|(id, label)| (id.as_str(), label.as_str()))
			.collect();
		assert_eq!(actual, expected);
	}

	#[rstest]
	fn test_load_applies_callback_and_order(menu: Vec<Row>) {
		// Arrange
		let mut reversed = menu;
		reversed.reverse();
		let table = MemoryTable::new(reversed);
		let builder = TreeBuilder::default().with_query(|query: &mut dyn QueryBuilder| {
			query.where_cmp("id", Comparison::Ne, json!(1));
		});

		// Act
		let rows = builder.load(&table).unwrap();

		// Assert
		let ids: Vec<_> = rows.iter().map(|row| row["id"].clone()).collect();
		assert_eq!(ids, vec![json!(2), json!(3), json!(4), json!(5)]);
	}

	#[rstest]
	fn test_deep_chain_is_nested_in_one_pass() {
		// Arrange
		let builder = TreeBuilder::default();
		let chain = rows(
			(1..=200)
				.map(|id| json!({"id": id, "parent_id": id - 1, "order": id, "title": format!("n{id}")}))
				.collect(),
		);

		// Act
		let tree = builder.to_nested_tree(&chain);
		let options = builder.to_indented_options(&chain);

		// Assert
		let mut depth = 0;
		let mut level = &tree;
		while let Some(node) = level.first() {
			depth += 1;
			level = &node.children;
		}
		assert_eq!(depth, 200);
		assert_eq!(options.len(), 201);
	}
}
