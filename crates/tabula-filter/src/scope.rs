//! Named condition presets

use crate::condition::Condition;
use std::fmt;
use std::sync::Arc;

type ConditionSource = Arc<dyn Fn() -> Vec<Condition> + Send + Sync>;

/// A preset bundle of conditions selected by the reserved scope parameter.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_filter::{Condition, Operator, Scope};
///
/// let scope = Scope::new("published", "Published")
///     .condition(Condition::new("status", Operator::Eq, json!("published")).unwrap());
///
/// assert_eq!(scope.key(), "published");
/// assert_eq!(scope.conditions().len(), 1);
/// ```
#[derive(Clone)]
pub struct Scope {
	key: String,
	label: String,
	fixed: Vec<Condition>,
	source: Option<ConditionSource>,
}

impl Scope {
	/// Creates an empty scope.
	pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			label: label.into(),
			fixed: Vec::new(),
			source: None,
		}
	}

	/// Creates a scope whose conditions are computed each time it is applied.
	pub fn dynamic<F>(key: impl Into<String>, label: impl Into<String>, source: F) -> Self
	where
		F: Fn() -> Vec<Condition> + Send + Sync + 'static,
	{
		Self {
			source: Some(Arc::new(source)),
			..Self::new(key, label)
		}
	}

	/// Adds a fixed condition.
	pub fn condition(mut self, condition: Condition) -> Self {
		self.fixed.push(condition);
		self
	}

	/// The request value selecting this scope.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// The display label.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Fixed conditions followed by the computed ones.
	pub fn conditions(&self) -> Vec<Condition> {
		let mut conditions = self.fixed.clone();
		if let Some(source) = &self.source {
			conditions.extend(source());
		}
		conditions
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scope")
			.field("key", &self.key)
			.field("label", &self.label)
			.field("fixed", &self.fixed)
			.field("dynamic", &self.source.is_some())
			.finish()
	}
}
