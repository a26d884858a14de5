//! Filter sets
//!
//! A [`FilterSet`] owns the fields and scopes of one grid's filter panel and
//! turns request parameters into the list of conditions applied to the
//! grid's query.

use crate::condition::Condition;
use crate::error::{FilterError, FilterResult};
use crate::field::FilterField;
use crate::registry::{self, FilterRegistry};
use crate::scope::Scope;
use tabula_core::value::is_blank;
use tabula_core::{QueryBuilder, QueryExecutor, QueryParams, ReservedKeys, Row};

const DEFAULT_FILTER_ID: &str = "filter-box";

/// Ordered filter fields and scopes of one grid.
///
/// An equality filter on the primary key is always present at index 0
/// unless [`FilterSet::disable_id_filter`] is called.
///
/// # Examples
///
/// ```
/// use tabula_core::QueryParams;
/// use tabula_filter::{FilterSet, Operator};
///
/// let mut filters = FilterSet::new("id");
/// filters.add("like", "name", "Name").unwrap();
///
/// let params = QueryParams::from_query_str("name=bob&page=2").unwrap();
/// let conditions = filters.extract_conditions(&params);
///
/// assert_eq!(conditions.len(), 1);
/// assert_eq!(conditions[0].operator(), Operator::Like);
/// assert!(filters.is_expanded());
/// ```
#[derive(Debug, Clone)]
pub struct FilterSet {
	primary_key: String,
	name: Option<String>,
	fields: Vec<FilterField>,
	scopes: Vec<Scope>,
	use_id_filter: bool,
	id_filter_removed: bool,
	expanded: bool,
	filter_id: String,
	reserved: ReservedKeys,
}

impl FilterSet {
	/// Creates a set holding the implicit primary-key filter.
	pub fn new(primary_key: impl Into<String>) -> Self {
		let primary_key = primary_key.into();
		let id_filter = FilterField::equal(primary_key.clone()).label(primary_key.to_uppercase());
		Self {
			primary_key,
			name: None,
			fields: vec![id_filter],
			scopes: Vec::new(),
			use_id_filter: true,
			id_filter_removed: false,
			expanded: false,
			filter_id: DEFAULT_FILTER_ID.to_string(),
			reserved: ReservedKeys::default(),
		}
	}

	/// Uses custom reserved parameter names.
	pub fn with_reserved_keys(mut self, reserved: ReservedKeys) -> Self {
		self.reserved = reserved;
		self
	}

	/// Namespaces the set: only `{name}_`-prefixed parameters are read.
	///
	/// The panel element id becomes `{name}-filter-box`.
	pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
		let name = name.into();
		if name.is_empty() {
			self.name = None;
			self.filter_id = DEFAULT_FILTER_ID.to_string();
		} else {
			self.filter_id = format!("{name}-{DEFAULT_FILTER_ID}");
			self.name = Some(name);
		}
		self
	}

	/// The namespace, if set.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// The panel element id.
	pub fn filter_id(&self) -> &str {
		&self.filter_id
	}

	/// The primary-key column.
	pub fn primary_key(&self) -> &str {
		&self.primary_key
	}

	/// The reserved parameter names.
	pub fn reserved_keys(&self) -> &ReservedKeys {
		&self.reserved
	}

	/// Drops the implicit primary-key filter.
	///
	/// The entry is removed on the next extraction; calling this repeatedly
	/// removes it only once.
	pub fn disable_id_filter(&mut self) -> &mut Self {
		self.use_id_filter = false;
		self
	}

	/// Adds a field built from a kind of the process-wide registry.
	pub fn add(
		&mut self,
		kind: &str,
		column: &str,
		label: impl Into<String>,
	) -> FilterResult<&mut FilterField> {
		self.add_from(registry::global(), kind, column, label)
	}

	/// Adds a field built from a kind of the given registry.
	pub fn add_from(
		&mut self,
		registry: &FilterRegistry,
		kind: &str,
		column: &str,
		label: impl Into<String>,
	) -> FilterResult<&mut FilterField> {
		let field = registry.build(kind, column)?.label(label);
		self.push(field)
	}

	/// Adds a configured field.
	///
	/// Fails with [`FilterError::DuplicateField`] when the id is taken.
	pub fn push(&mut self, field: FilterField) -> FilterResult<&mut FilterField> {
		if self.active_fields().iter().any(|f| f.id() == field.id()) {
			return Err(FilterError::DuplicateField(field.id().to_string()));
		}
		self.fields.push(field);
		let index = self.fields.len() - 1;
		Ok(&mut self.fields[index])
	}

	/// Adds a scope.
	pub fn scope(&mut self, scope: Scope) -> &mut Self {
		self.scopes.push(scope);
		self
	}

	/// Removes the field with the given id.
	pub fn remove_filter_by_id(&mut self, id: &str) {
		self.fields.retain(|f| f.id() != id);
	}

	/// The fields in declaration order, without a disabled id filter.
	pub fn fields(&self) -> &[FilterField] {
		self.active_fields()
	}

	/// The scopes in declaration order.
	pub fn scopes(&self) -> &[Scope] {
		&self.scopes
	}

	/// The scope selected by the request, if any.
	pub fn current_scope(&self, params: &QueryParams) -> Option<&Scope> {
		let key = params.get(&self.reserved.scope)?;
		let key = tabula_core::value::display_string(key);
		self.scopes.iter().find(|scope| scope.key() == key)
	}

	/// Returns true once a request produced at least one condition.
	pub fn is_expanded(&self) -> bool {
		self.expanded
	}

	/// Forces the panel open.
	pub fn expand(&mut self) -> &mut Self {
		self.expanded = true;
		self
	}

	/// Builds the conditions of a request.
	///
	/// Namespaced sets only read `{name}_`-prefixed keys. Layout-only fields
	/// take the request value as their default instead of filtering. The
	/// selected scope's conditions are appended last.
	pub fn extract_conditions(&mut self, params: &QueryParams) -> Vec<Condition> {
		let inputs = self.sanitize_inputs(params);
		self.remove_id_filter_if_needed();

		let mut conditions = Vec::new();
		if !inputs.is_empty() {
			for field in &mut self.fields {
				if field.is_layout_only() {
					field.set_default(inputs.get(field.column()).cloned());
				} else if let Some(condition) = field.condition(&inputs) {
					conditions.push(condition);
				}
			}
		}
		if let Some(scope) = self.current_scope(params) {
			tracing::debug!(scope = %scope.key(), "applying filter scope");
			conditions.extend(scope.conditions());
		}

		if !conditions.is_empty() {
			self.expanded = true;
		}
		tracing::debug!(
			filter_id = %self.filter_id,
			count = conditions.len(),
			"filter conditions extracted"
		);
		conditions
	}

	/// Extracts the conditions and appends them to a query builder.
	pub fn apply(&mut self, params: &QueryParams, query: &mut dyn QueryBuilder) -> Vec<Condition> {
		let conditions = self.extract_conditions(params);
		for condition in &conditions {
			condition.apply(query);
		}
		conditions
	}

	/// Fetches every matching row in one call.
	pub fn execute<E: QueryExecutor>(
		&mut self,
		params: &QueryParams,
		executor: &E,
	) -> FilterResult<Vec<Row>> {
		let mut query = executor.query();
		self.apply(params, &mut query);
		Ok(executor.fetch(&query, 0, None)?)
	}

	/// Streams matching rows to `callback` in batches of `batch_size`.
	///
	/// Returns `false` as soon as the callback does, without fetching
	/// further batches. Rows must be ordered deterministically by the
	/// caller for batches not to overlap.
	pub fn chunk<E, F>(
		&mut self,
		params: &QueryParams,
		executor: &E,
		batch_size: usize,
		mut callback: F,
	) -> FilterResult<bool>
	where
		E: QueryExecutor,
		F: FnMut(Vec<Row>) -> bool,
	{
		let mut query = executor.query();
		self.apply(params, &mut query);

		let size = batch_size.max(1);
		let mut offset = 0;
		loop {
			let batch = executor.fetch(&query, offset, Some(size))?;
			let fetched = batch.len();
			if fetched == 0 {
				return Ok(true);
			}
			tracing::debug!(offset, fetched, "filter chunk fetched");
			if !callback(batch) {
				return Ok(false);
			}
			if fetched < size {
				return Ok(true);
			}
			offset += fetched;
		}
	}

	/// Flattens, drops blanks, strips the namespace and re-nests.
	fn sanitize_inputs(&self, params: &QueryParams) -> QueryParams {
		let prefix = self.name.as_ref().map(|name| format!("{name}_"));
		let entries = params
			.flatten()
			.into_iter()
			.filter(|(_, value)| !is_blank(value))
			.filter_map(|(key, value)| match &prefix {
				Some(prefix) => key
					.strip_prefix(prefix.as_str())
					.map(|stripped| (stripped.to_string(), value)),
				None => Some((key, value)),
			});
		QueryParams::from_dotted(entries)
	}

	fn remove_id_filter_if_needed(&mut self) {
		if !self.use_id_filter && !self.id_filter_removed {
			if !self.fields.is_empty() {
				self.fields.remove(0);
			}
			self.id_filter_removed = true;
		}
	}

	pub(crate) fn active_fields(&self) -> &[FilterField] {
		if !self.use_id_filter && !self.id_filter_removed {
			self.fields.get(1..).unwrap_or_default()
		} else {
			&self.fields
		}
	}
}
