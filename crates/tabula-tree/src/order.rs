//! Persisting a client-submitted ordering and deleting nodes

use crate::error::{TreeError, TreeResult};
use crate::node::{OrderNode, flatten_order};
use crate::store::RowStore;
use std::collections::HashMap;
use tabula_core::value::key_string;
use tabula_core::{Row, TreeSettings, Value};

/// Decodes the serialized tree carried by the reorder request parameter.
///
/// # Examples
///
/// ```
/// use tabula_tree::order::parse_order_payload;
///
/// let tree = parse_order_payload(r#"[{"id":1,"children":[{"id":2}]},{"id":3}]"#).unwrap();
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree[0].children.len(), 1);
/// ```
pub fn parse_order_payload(payload: &str) -> TreeResult<Vec<OrderNode>> {
	serde_json::from_str(payload).map_err(|e| TreeError::InvalidOrderPayload(e.to_string()))
}

/// Rejects a record whose submitted parent is the record itself.
pub fn guard_parent(id: &Value, submitted_parent: &Value) -> TreeResult<()> {
	match (key_string(id), key_string(submitted_parent)) {
		(Some(id), Some(parent)) if id == parent => Err(TreeError::SelfParent(id)),
		_ => Ok(()),
	}
}

/// Persists `{parent, order}` for every node of a submitted tree.
///
/// Ranks are the 1-based positions of the depth-first flattening of `tree`;
/// a node listed twice keeps its last position. Every node is validated
/// before anything is written, then all rows go to the store in one
/// [`save_batch`](RowStore::save_batch). Returns the number of rows saved.
pub fn save_order<S: RowStore + ?Sized>(
	store: &mut S,
	settings: &TreeSettings,
	tree: &[OrderNode],
	parent_id: &Value,
) -> TreeResult<usize> {
	let ranks: HashMap<String, i64> = flatten_order(tree)
		.iter()
		.enumerate()
		.filter_map(|(index, id)| key_string(id).map(|key| (key, index as i64 + 1)))
		.collect();

	let mut updates = Vec::new();
	collect_updates(settings, tree, parent_id, &ranks, &mut updates)?;

	for (id, _) in &updates {
		if store.find(id)?.is_none() {
			return Err(TreeError::NodeNotFound(key_string(id).unwrap_or_default()));
		}
	}

	let saved = updates.len();
	store.save_batch(updates)?;
	tracing::debug!(saved, "saved tree order");
	Ok(saved)
}

fn collect_updates(
	settings: &TreeSettings,
	nodes: &[OrderNode],
	parent_id: &Value,
	ranks: &HashMap<String, i64>,
	updates: &mut Vec<(Value, Row)>,
) -> TreeResult<()> {
	for node in nodes {
		guard_parent(&node.id, parent_id)?;

		let order = key_string(&node.id)
			.and_then(|key| ranks.get(&key).copied())
			.unwrap_or(0);
		let mut values = Row::new();
		values.insert(settings.parent_column.clone(), parent_id.clone());
		values.insert(settings.order_column.clone(), Value::from(order));
		updates.push((node.id.clone(), values));

		collect_updates(settings, &node.children, &node.id, ranks, updates)?;
	}
	Ok(())
}

/// Deletes a node and its direct children.
///
/// Grandchildren are left in place and keep pointing at the deleted child.
/// Returns the number of rows removed.
pub fn delete<S: RowStore + ?Sized>(
	store: &mut S,
	settings: &TreeSettings,
	id: &Value,
) -> TreeResult<usize> {
	let children = store.delete_children(&settings.parent_column, id)?;
	let removed = children + usize::from(store.delete(id)?);
	tracing::debug!(id = %id, removed, "deleted tree node");
	Ok(removed)
}
