//! # Tabula
//!
//! An admin data-grid pipeline: request parameters come in, filtered,
//! sorted and paginated rows go out, each cell rendered through a chain of
//! displayers.
//!
//! ## Architecture
//!
//! ```text
//! QueryParams ──► FilterSet ──► QueryBuilder ──► QueryExecutor ──► ColumnPipeline ──► GridOutput
//!                 (Condition)   (sort, page)                       (displayers)
//! ```
//!
//! - **tabula_core**: rows, [`QueryParams`], the [`QueryBuilder`] /
//!   [`QueryExecutor`] seam and [`TabulaSettings`]
//! - **filter**: [`Condition`]s, [`FilterField`]s, scopes and [`FilterSet`]
//! - **tree**: [`TreeBuilder`] and order persistence for self-referential rows
//! - **columns**: [`Column`] display chains, the displayer registry and
//!   header sorting
//! - **grid**: [`Grid`], the three combined for one listing request, and
//!   batched exports
//!
//! ## Feature Flags
//!
//! - `filter` - request filters
//! - `tree` - tree views
//! - `columns` - column displayers and sorting
//! - `logging` - the `tracing-subscriber` bootstrap in [`logging`]
//! - `full` (default) - all of the above
//!
//! ## Quick Example
//!
//! ```
//! use serde_json::json;
//! use tabula::prelude::*;
//!
//! let table = MemoryTable::from_values(vec![
//!     json!({"id": 1, "name": "Ada", "role": "admin"}),
//!     json!({"id": 2, "name": "Linus", "role": "user"}),
//! ]);
//!
//! let mut grid = Grid::new("");
//! grid.filters_mut().push(FilterField::equal("role")).unwrap();
//! grid.columns_mut().column("name").sortable();
//! grid.columns_mut().call("name", "upper", vec![]).unwrap();
//!
//! let params = QueryParams::from_query_str("role=admin").unwrap();
//! let output = grid.rows("/users?role=admin", &params, &table).unwrap();
//!
//! assert_eq!(output.total, 1);
//! assert_eq!(output.rows[0]["name"], json!("ADA"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod export;
#[cfg(all(feature = "filter", feature = "columns"))]
pub mod grid;
#[cfg(feature = "tree")]
pub mod tree_view;

/// Request filters.
#[cfg(feature = "filter")]
pub mod filter {
	pub use tabula_filter::*;
}

/// Hierarchical views of self-referential rows.
#[cfg(feature = "tree")]
pub mod tree {
	pub use tabula_tree::*;
}

/// Column display chains and header sorting.
#[cfg(feature = "columns")]
pub mod columns {
	pub use tabula_columns::*;
}

#[cfg(feature = "logging")]
pub use tabula_core::logging;

pub use error::{GridError, GridResult};
pub use tabula_core::{
	Direction, MemoryTable, QueryBuilder, QueryExecutor, QueryParams, Row, SqlBuilder,
	TabulaSettings, Value,
};

pub use export::ExportScope;
#[cfg(feature = "filter")]
pub use tabula_filter::{Condition, FilterField, FilterKind, FilterSet, Operator, Scope};

#[cfg(all(feature = "filter", feature = "columns"))]
pub use grid::{Grid, GridOutput};

#[cfg(feature = "tree")]
pub use tabula_tree::{MemoryStore, OrderNode, RowStore, TreeBuilder, TreeNode};
#[cfg(feature = "tree")]
pub use tree_view::TreeView;

#[cfg(feature = "columns")]
pub use tabula_columns::{Column, ColumnPipeline, Displayer, DisplayerRegistry, SortLink};

/// Common imports.
pub mod prelude {
	pub use crate::{
		Direction, ExportScope, GridError, GridResult, MemoryTable, QueryBuilder, QueryExecutor,
		QueryParams, Row, TabulaSettings, Value,
	};

	#[cfg(feature = "filter")]
	pub use crate::{Condition, FilterField, FilterSet, Operator, Scope};

	#[cfg(all(feature = "filter", feature = "columns"))]
	pub use crate::{Grid, GridOutput};

	#[cfg(feature = "tree")]
	pub use crate::{MemoryStore, RowStore, TreeBuilder, TreeNode, TreeView};

	#[cfg(feature = "columns")]
	pub use crate::{Column, ColumnPipeline, Displayer, DisplayerRegistry};
}
