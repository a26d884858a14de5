//! Reordering, deletion and nesting properties of tree resources

use proptest::prelude::*;
use rstest::{fixture, rstest};
use serde_json::json;
use std::collections::BTreeSet;
use tabula_core::{Row, TreeSettings, Value};
use tabula_tree::{
	MemoryStore, OrderNode, RowStore, TreeBuilder, TreeError, delete, flatten_tree, save_order,
};

#[fixture]
fn store() -> MemoryStore {
	MemoryStore::from_values(
		"id",
		vec![
			json!({"id": 1, "parent_id": 0, "order": 4, "title": "a"}),
			json!({"id": 2, "parent_id": 0, "order": 3, "title": "b"}),
			json!({"id": 3, "parent_id": 0, "order": 2, "title": "c"}),
			json!({"id": 4, "parent_id": 0, "order": 1, "title": "d"}),
		],
	)
}

fn parent_and_order(store: &MemoryStore, id: i64) -> (Value, Value) {
	let row = store.find(&json!(id)).unwrap().unwrap();
	(row["parent_id"].clone(), row["order"].clone())
}

#[rstest]
fn test_save_order_assigns_dense_ranks(mut store: MemoryStore) {
	// Arrange
	let tree = vec![
		OrderNode::branch(1, vec![OrderNode::leaf(2), OrderNode::leaf(3)]),
		OrderNode::leaf(4),
	];

	// Act
	let saved = save_order(&mut store, &TreeSettings::default(), &tree, &json!(0)).unwrap();

	// Assert
	assert_eq!(saved, 4);
	assert_eq!(parent_and_order(&store, 1), (json!(0), json!(1)));
	assert_eq!(parent_and_order(&store, 2), (json!(1), json!(2)));
	assert_eq!(parent_and_order(&store, 3), (json!(1), json!(3)));
	assert_eq!(parent_and_order(&store, 4), (json!(0), json!(4)));
}

#[rstest]
fn test_self_parent_aborts_before_any_write(mut store: MemoryStore) {
	// Arrange
	let before = store.rows().to_vec();
	let tree = vec![
		OrderNode::leaf(1),
		OrderNode::branch(2, vec![OrderNode::leaf(2)]),
	];

	// Act
	let result = save_order(&mut store, &TreeSettings::default(), &tree, &json!(0));

	// Assert
	assert!(matches!(result, Err(TreeError::SelfParent(id)) if id == "2"));
	assert_eq!(store.rows(), before.as_slice());
}

#[rstest]
fn test_delete_is_single_level() {
	// Arrange
	let mut store = MemoryStore::from_values(
		"id",
		vec![
			json!({"id": 1, "parent_id": 0}),
			json!({"id": 2, "parent_id": 1}),
			json!({"id": 3, "parent_id": 2}),
			json!({"id": 4, "parent_id": 0}),
		],
	);

	// Act
	let removed = delete(&mut store, &TreeSettings::default(), &json!(1)).unwrap();

	// Assert
	assert_eq!(removed, 2);
	let remaining: Vec<_> = store.rows().iter().map(|row| row["id"].clone()).collect();
	assert_eq!(remaining, vec![json!(3), json!(4)]);
}

#[rstest]
fn test_custom_columns_round_trip() {
	// Arrange
	let settings = TreeSettings {
		key_column: "code".to_string(),
		parent_column: "up".to_string(),
		title_column: "name".to_string(),
		order_column: "rank".to_string(),
		root_id: json!(""),
		..TreeSettings::default()
	};
	let mut store = MemoryStore::from_values(
		"code",
		vec![
			json!({"code": "x", "up": "", "rank": 0, "name": "X"}),
			json!({"code": "y", "up": "", "rank": 0, "name": "Y"}),
		],
	);
	let tree = vec![OrderNode::branch("y", vec![OrderNode::leaf("x")])];

	// Act
	save_order(&mut store, &settings, &tree, &json!("")).unwrap();
	let nested = TreeBuilder::new(settings).load_tree(&store.table()).unwrap();

	// Assert
	assert_eq!(nested.len(), 1);
	assert_eq!(nested[0].title, "Y");
	assert_eq!(nested[0].children[0].title, "X");
	assert_eq!(nested[0].children[0].order, 2);
}

/// A random forest: each row picks an earlier row (or the root) as parent.
fn forest() -> impl Strategy<Value = Vec<Row>> {
	(1usize..30)
		.prop_flat_map(|size| (0..size).map(|index| 0..=index).collect::<Vec<_>>())
		.prop_map(|parents| {
			parents
				.into_iter()
				.enumerate()
				.filter_map(|(index, parent)| {
					json!({
						"id": index + 1,
						"parent_id": parent,
						"order": 0,
						"title": format!("node {}", index + 1),
					})
					.as_object()
					.cloned()
				})
				.collect::<Vec<Row>>()
		})
		.prop_shuffle()
}

proptest! {
	#[test]
	fn nesting_preserves_every_row(rows in forest()) {
		let tree = TreeBuilder::default().to_nested_tree(&rows);

		let flattened = flatten_tree(&tree);
		let unique: BTreeSet<String> = flattened.iter().map(Value::to_string).collect();
		let expected: BTreeSet<String> = rows.iter().map(|row| row["id"].to_string()).collect();

		prop_assert_eq!(flattened.len(), rows.len());
		prop_assert_eq!(unique, expected);
	}

	#[test]
	fn nesting_then_saving_is_stable(rows in forest()) {
		let builder = TreeBuilder::default();
		let tree = builder.to_nested_tree(&rows);
		let order: Vec<OrderNode> = tree.iter().map(|node| node.to_order_node()).collect();
		let mut store = MemoryStore::new("id", rows);

		save_order(&mut store, builder.settings(), &order, &json!(0)).unwrap();
		let mut saved = store.rows().to_vec();
		saved.reverse();
		builder.sort_nodes(&mut saved);
		let rebuilt = builder.to_nested_tree(&saved);

		prop_assert_eq!(flatten_tree(&rebuilt), flatten_tree(&tree));
	}
}
