//! Column display pipeline for tabula grids
//!
//! Every output column owns an ordered chain of display transforms. The
//! pipeline reads each cell by its (possibly dotted) column path, encodes the
//! raw value as the cell's baseline, and replaces it with the chain's output
//! when the column has transforms:
//!
//! - [`Column`]: name, label, relation binding, sorting options, chain and
//!   escaping policy
//! - [`Transform`] / [`TransformOutcome`]: chain steps, with an explicit
//!   "defer to the last transform" outcome
//! - [`registry`]: named displayers (`label`, `badge`, `link`, ...) and
//!   per-name column definitions
//! - [`ColumnPipeline`]: applies the chains to rows and handles sorting
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabula_columns::ColumnPipeline;
//! use tabula_core::Row;
//!
//! let mut pipeline = ColumnPipeline::new();
//! pipeline.column("status").call("label", vec![json!("info")]).unwrap();
//! pipeline.column("note");
//!
//! let row: Row = json!({"status": "new", "note": "a < b"}).as_object().cloned().unwrap();
//! let rows = pipeline.apply(vec![row]);
//!
//! assert_eq!(rows[0]["status"], json!("<span class='label label-info'>new</span>"));
//! assert_eq!(rows[0]["note"], json!("a &lt; b"));
//! ```

#![warn(missing_docs)]

pub mod column;
pub mod displayers;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod sort;
pub mod transform;

pub use column::{Column, SortCallback};
pub use displayers::{Displayer, DisplayerFactory};
pub use error::{ColumnError, ColumnResult};
pub use pipeline::ColumnPipeline;
pub use registry::DisplayerRegistry;
pub use sort::{SortLink, SortSpec};
pub use transform::{Transform, TransformOutcome};
