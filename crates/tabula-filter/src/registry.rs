//! Filter-kind registry
//!
//! Filter kinds are looked up by name when a field is added with
//! [`FilterSet::add`](crate::FilterSet::add). The process-wide registry is
//! populated with the built-in kinds; applications register their own with
//! [`extend`] at startup and seal the registry with [`freeze`].

use crate::error::{FilterError, FilterResult};
use crate::field::FilterField;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tabula_core::Value;

/// Builds a field for a column.
pub type FieldFactory = Arc<dyn Fn(&str) -> FilterField + Send + Sync>;

/// A name → factory table of filter kinds.
pub struct FilterRegistry {
	kinds: RwLock<HashMap<String, FieldFactory>>,
	frozen: AtomicBool,
}

impl FilterRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self {
			kinds: RwLock::new(HashMap::new()),
			frozen: AtomicBool::new(false),
		}
	}

	/// Creates a registry holding the built-in kinds.
	pub fn with_builtins() -> Self {
		let registry = Self::new();
		{
			let mut kinds = registry.kinds.write();
			for (name, factory) in builtin_kinds() {
				kinds.insert(name.to_string(), factory);
			}
		}
		registry
	}

	/// Registers a kind, replacing any previous one of the same name.
	pub fn extend<F>(&self, name: impl Into<String>, factory: F) -> FilterResult<()>
	where
		F: Fn(&str) -> FilterField + Send + Sync + 'static,
	{
		let name = name.into();
		if self.is_frozen() {
			return Err(FilterError::RegistryFrozen(name));
		}
		tracing::debug!(kind = %name, "registering filter kind");
		self.kinds.write().insert(name, Arc::new(factory));
		Ok(())
	}

	/// Seals the registry; later registrations fail.
	pub fn freeze(&self) {
		self.frozen.store(true, Ordering::Release);
	}

	/// Returns true once [`FilterRegistry::freeze`] was called.
	pub fn is_frozen(&self) -> bool {
		self.frozen.load(Ordering::Acquire)
	}

	/// Builds a field of the named kind.
	pub fn build(&self, kind: &str, column: &str) -> FilterResult<FilterField> {
		let factory = self
			.kinds
			.read()
			.get(kind)
			.cloned()
			.ok_or_else(|| FilterError::UnknownFilterKind(kind.to_string()))?;
		Ok(factory(column))
	}

	/// Returns true when a kind is registered under the name.
	pub fn contains(&self, kind: &str) -> bool {
		self.kinds.read().contains_key(kind)
	}

	/// Registered kind names, sorted.
	pub fn kinds(&self) -> Vec<String> {
		let mut names: Vec<String> = self.kinds.read().keys().cloned().collect();
		names.sort();
		names
	}
}

impl Default for FilterRegistry {
	fn default() -> Self {
		Self::with_builtins()
	}
}

static GLOBAL_REGISTRY: Lazy<FilterRegistry> = Lazy::new(FilterRegistry::with_builtins);

/// The process-wide registry.
pub fn global() -> &'static FilterRegistry {
	&GLOBAL_REGISTRY
}

/// Registers a kind in the process-wide registry.
///
/// # Examples
///
/// ```
/// use tabula_filter::{FilterField, registry};
///
/// registry::extend("exact_title", |column| FilterField::equal(column).label("Title")).unwrap();
/// assert!(registry::global().contains("exact_title"));
/// ```
pub fn extend<F>(name: impl Into<String>, factory: F) -> FilterResult<()>
where
	F: Fn(&str) -> FilterField + Send + Sync + 'static,
{
	GLOBAL_REGISTRY.extend(name, factory)
}

/// Seals the process-wide registry.
pub fn freeze() {
	GLOBAL_REGISTRY.freeze();
}

fn factory<F>(f: F) -> FieldFactory
where
	F: Fn(&str) -> FilterField + Send + Sync + 'static,
{
	Arc::new(f)
}

fn builtin_kinds() -> Vec<(&'static str, FieldFactory)> {
	vec![
		("equal", factory(|c| FilterField::equal(c))),
		("notEqual", factory(|c| FilterField::not_equal(c))),
		("like", factory(|c| FilterField::like(c))),
		("contains", factory(|c| FilterField::contains(c))),
		("ilike", factory(|c| FilterField::ilike(c))),
		("startsWith", factory(|c| FilterField::starts_with(c))),
		("endsWith", factory(|c| FilterField::ends_with(c))),
		("gt", factory(|c| FilterField::gt(c))),
		("lt", factory(|c| FilterField::lt(c))),
		("between", factory(|c| FilterField::between(c))),
		("in", factory(|c| FilterField::is_in(c))),
		("notIn", factory(|c| FilterField::not_in(c))),
		("date", factory(|c| FilterField::date(c))),
		("day", factory(|c| FilterField::day(c))),
		("month", factory(|c| FilterField::month(c))),
		("year", factory(|c| FilterField::year(c))),
		("hidden", factory(|c| FilterField::hidden(c, Value::Null))),
	]
}
