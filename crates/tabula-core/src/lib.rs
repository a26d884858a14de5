//! Shared building blocks for the tabula grid pipeline
//!
//! This crate holds everything the filter, tree and column crates have in
//! common:
//!
//! - **Rows and paths**: dynamic rows as JSON objects, dotted relation paths
//!   (`author.name`) and row identity normalization
//! - **Request parameters**: [`QueryParams`], a nested parameter bag built
//!   from bracket-style query strings (`created_at[start]=...`)
//! - **Query interface**: the [`QueryBuilder`] / [`QueryExecutor`] seam that
//!   conditions are applied to, with a parameterized SQL renderer and an
//!   in-memory executor
//! - **HTML escaping** for cell values
//! - **Settings** and the logging bootstrap
//!
//! # Architecture
//!
//! ```text
//! query string ──► QueryParams ──► (filters) ──► QueryBuilder ──► QueryExecutor ──► rows
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod html;
pub mod label;
#[cfg(feature = "logging")]
pub mod logging;
pub mod params;
pub mod query;
pub mod settings;
pub mod value;

pub use error::{QueryError, QueryResult};
pub use params::QueryParams;
pub use query::{
	Comparison, Connector, DatePart, Direction, MemoryQuery, MemoryTable, QueryBuilder,
	QueryExecutor, SqlBuilder,
};
pub use settings::{
	LoggingSettings, PaginationSettings, ReservedKeys, SettingsError, TabulaSettings,
	TreeSettings,
};
pub use value::{Row, Value};
