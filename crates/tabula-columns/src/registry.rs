//! Displayer and column-definition registry
//!
//! Displayers are looked up by name from [`Column::call`](crate::Column::call).
//! Column definitions replace the whole display chain of every column with a
//! given name. Both tables live in a process-wide registry that is populated
//! at startup and sealed with [`freeze`].

use crate::displayers::{Displayer, DisplayerFactory, builtin_displayers};
use crate::error::{ColumnError, ColumnResult};
use crate::transform::Transform;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tabula_core::Value;

/// Name → displayer factories plus column definitions.
pub struct DisplayerRegistry {
	displayers: RwLock<HashMap<String, DisplayerFactory>>,
	defined: RwLock<HashMap<String, Transform>>,
	frozen: AtomicBool,
}

impl DisplayerRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self {
			displayers: RwLock::new(HashMap::new()),
			defined: RwLock::new(HashMap::new()),
			frozen: AtomicBool::new(false),
		}
	}

	/// Creates a registry holding the built-in displayers.
	pub fn with_builtins() -> Self {
		let registry = Self::new();
		{
			let mut displayers = registry.displayers.write();
			for (name, factory) in builtin_displayers() {
				displayers.insert(name.to_string(), factory);
			}
		}
		registry
	}

	/// Registers a displayer, replacing any previous one of the same name.
	pub fn extend<F>(&self, name: impl Into<String>, factory: F) -> ColumnResult<()>
	where
		F: Fn(&[Value]) -> ColumnResult<Displayer> + Send + Sync + 'static,
	{
		let name = name.into();
		self.ensure_open(&name)?;
		tracing::debug!(displayer = %name, "registering displayer");
		self.displayers.write().insert(name, Arc::new(factory));
		Ok(())
	}

	/// Defines the display chain of every column named `column`.
	pub fn define(&self, column: impl Into<String>, transform: Transform) -> ColumnResult<()> {
		let column = column.into();
		self.ensure_open(&column)?;
		tracing::debug!(column = %column, "defining column");
		self.defined.write().insert(column, transform);
		Ok(())
	}

	/// Seals the registry; later registrations fail.
	pub fn freeze(&self) {
		self.frozen.store(true, Ordering::Release);
	}

	/// Returns true once [`DisplayerRegistry::freeze`] was called.
	pub fn is_frozen(&self) -> bool {
		self.frozen.load(Ordering::Acquire)
	}

	/// Builds the named displayer with call arguments.
	pub fn resolve(&self, name: &str, args: &[Value]) -> ColumnResult<Displayer> {
		let factory = self
			.displayers
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| ColumnError::UnknownDisplayer(name.to_string()))?;
		factory(args)
	}

	/// The definition registered for a column name.
	pub fn definition(&self, column: &str) -> Option<Transform> {
		self.defined.read().get(column).cloned()
	}

	/// Returns true when a displayer is registered under the name.
	pub fn contains(&self, name: &str) -> bool {
		self.displayers.read().contains_key(name)
	}

	/// Registered displayer names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.displayers.read().keys().cloned().collect();
		names.sort();
		names
	}

	fn ensure_open(&self, name: &str) -> ColumnResult<()> {
		if self.is_frozen() {
			return Err(ColumnError::RegistryFrozen(name.to_string()));
		}
		Ok(())
	}
}

impl Default for DisplayerRegistry {
	fn default() -> Self {
		Self::with_builtins()
	}
}

impl std::fmt::Debug for DisplayerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DisplayerRegistry")
			.field("displayers", &self.names())
			.field("defined", &self.defined.read().len())
			.field("frozen", &self.is_frozen())
			.finish()
	}
}

static GLOBAL_REGISTRY: Lazy<DisplayerRegistry> = Lazy::new(DisplayerRegistry::with_builtins);

/// The process-wide registry.
pub fn global() -> &'static DisplayerRegistry {
	&GLOBAL_REGISTRY
}

/// Registers a displayer in the process-wide registry.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_columns::{Column, Displayer, registry};
///
/// registry::extend("shout", |_| {
///     Ok(Displayer::text(|value, _, _| json!(format!("{}!", value.as_str().unwrap_or("")))))
/// })
/// .unwrap();
///
/// let mut column = Column::new("greeting", "");
/// column.call("shout", vec![]).unwrap();
/// assert_eq!(column.transforms().len(), 1);
/// ```
pub fn extend<F>(name: impl Into<String>, factory: F) -> ColumnResult<()>
where
	F: Fn(&[Value]) -> ColumnResult<Displayer> + Send + Sync + 'static,
{
	GLOBAL_REGISTRY.extend(name, factory)
}

/// Defines a column in the process-wide registry.
pub fn define(column: impl Into<String>, transform: Transform) -> ColumnResult<()> {
	GLOBAL_REGISTRY.define(column, transform)
}

/// Seals the process-wide registry.
pub fn freeze() {
	GLOBAL_REGISTRY.freeze();
}
