//! Request-driven filtering for tabula grids
//!
//! This crate turns ad-hoc request parameters into a composed predicate:
//!
//! - [`Condition`]: an immutable `(column, operator, value)` predicate that
//!   applies itself to a [`QueryBuilder`](tabula_core::QueryBuilder)
//! - [`FilterField`]: one typed filter control producing at most one
//!   condition from the request
//! - [`Scope`]: a named preset of conditions selected by `_scope_`
//! - [`FilterSet`]: the ordered fields and scopes of a grid, with namespace
//!   handling, streaming execution and reset links
//! - [`registry`]: the process-wide filter-kind registry
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabula_core::{MemoryTable, QueryParams};
//! use tabula_filter::{FilterField, FilterSet};
//!
//! let table = MemoryTable::from_values(vec![
//!     json!({"id": 1, "title": "Rust tips", "year": 2023}),
//!     json!({"id": 2, "title": "Rust macros", "year": 2024}),
//!     json!({"id": 3, "title": "Go channels", "year": 2024}),
//! ]);
//!
//! let mut filters = FilterSet::new("id");
//! filters.push(FilterField::starts_with("title")).unwrap();
//! filters.push(FilterField::equal("year")).unwrap();
//!
//! let params = QueryParams::from_query_str("title=Rust&year=2024").unwrap();
//! let rows = filters.execute(&params, &table).unwrap();
//!
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0]["id"], json!(2));
//! ```

#![warn(missing_docs)]

pub mod condition;
pub mod error;
pub mod field;
pub mod registry;
pub mod reset;
pub mod scope;
pub mod set;

pub use condition::{Arity, Condition, Operator, RawPredicate, escape_like_pattern};
pub use error::{FilterError, FilterResult};
pub use field::{FilterField, FilterKind};
pub use registry::FilterRegistry;
pub use reset::url_without_keys;
pub use scope::Scope;
pub use set::FilterSet;
