//! Tree nodes and submitted orderings

use serde::{Deserialize, Serialize};
use tabula_core::{Row, Value};

/// A row placed in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
	/// Primary-key value.
	pub id: Value,
	/// Parent key; the root sentinel for top-level nodes.
	pub parent_id: Value,
	/// Stored sibling rank; `0` means unranked.
	pub order: i64,
	/// Label taken from the title column.
	pub title: String,
	/// The full row.
	pub row: Row,
	/// Children in fetch order.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<TreeNode>,
}

impl TreeNode {
	/// Ids of this node and its descendants, parent before children.
	pub fn flatten_ids(&self) -> Vec<Value> {
		let mut ids = Vec::new();
		self.collect_ids(&mut ids);
		ids
	}

	fn collect_ids(&self, ids: &mut Vec<Value>) {
		ids.push(self.id.clone());
		for child in &self.children {
			child.collect_ids(ids);
		}
	}

	/// Number of nodes in this subtree.
	pub fn size(&self) -> usize {
		1 + self.children.iter().map(TreeNode::size).sum::<usize>()
	}

	/// Converts the subtree to the shape a reorder request submits.
	pub fn to_order_node(&self) -> OrderNode {
		OrderNode {
			id: self.id.clone(),
			children: self.children.iter().map(TreeNode::to_order_node).collect(),
		}
	}
}

/// One node of a client-submitted ordering: `{"id": .., "children": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNode {
	/// Primary-key value.
	pub id: Value,
	/// Children in their new order.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<OrderNode>,
}

impl OrderNode {
	/// Creates a leaf.
	pub fn leaf(id: impl Into<Value>) -> Self {
		Self {
			id: id.into(),
			children: Vec::new(),
		}
	}

	/// Creates a node with children.
	pub fn branch(id: impl Into<Value>, children: Vec<OrderNode>) -> Self {
		Self {
			id: id.into(),
			children,
		}
	}
}

/// Ids of a submitted ordering, depth-first, parent before children.
pub fn flatten_order(tree: &[OrderNode]) -> Vec<Value> {
	fn walk(nodes: &[OrderNode], out: &mut Vec<Value>) {
		for node in nodes {
			out.push(node.id.clone());
			walk(&node.children, out);
		}
	}
	let mut out = Vec::new();
	walk(tree, &mut out);
	out
}

/// Ids of built trees, depth-first, parent before children.
pub fn flatten_tree(tree: &[TreeNode]) -> Vec<Value> {
	tree.iter().flat_map(TreeNode::flatten_ids).collect()
}
