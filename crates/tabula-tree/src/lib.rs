//! Hierarchical views of self-referential rows
//!
//! A tree resource stores its hierarchy in three columns of a flat table: a
//! parent key, a sibling rank and a title. This crate provides:
//!
//! - [`TreeBuilder`]: loads rows in rank order and nests them into
//!   [`TreeNode`]s or indented select options
//! - [`order`]: persists a reordered tree submitted by the client and deletes
//!   nodes with a single-level cascade
//! - [`RowStore`]: the persistence interface, with [`MemoryStore`] as the
//!   in-memory implementation
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabula_core::TreeSettings;
//! use tabula_tree::{MemoryStore, RowStore, TreeBuilder, order};
//!
//! let mut store = MemoryStore::from_values("id", vec![
//!     json!({"id": 1, "parent_id": 0, "order": 1, "title": "Docs"}),
//!     json!({"id": 2, "parent_id": 0, "order": 2, "title": "Guide"}),
//! ]);
//!
//! let tree = order::parse_order_payload(r#"[{"id": 1, "children": [{"id": 2}]}]"#).unwrap();
//! order::save_order(&mut store, &TreeSettings::default(), &tree, &json!(0)).unwrap();
//!
//! let nested = TreeBuilder::default().load_tree(&store.table()).unwrap();
//! assert_eq!(nested.len(), 1);
//! assert_eq!(nested[0].children[0].title, "Guide");
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod node;
pub mod order;
pub mod store;

pub use builder::{QueryCallback, TreeBuilder};
pub use error::{TreeError, TreeResult};
pub use node::{OrderNode, TreeNode, flatten_order, flatten_tree};
pub use order::{delete, guard_parent, parse_order_payload, save_order};
pub use store::{MemoryStore, RowStore};
