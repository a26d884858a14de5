//! Row persistence used by reordering and deletion

use crate::error::{TreeError, TreeResult};
use tabula_core::value::{key_string, row_get, row_set};
use tabula_core::{MemoryTable, Row, Value};

/// Persists changes to tree rows.
pub trait RowStore {
	/// Looks a row up by primary key.
	fn find(&self, id: &Value) -> TreeResult<Option<Row>>;

	/// Merges `values` into the row with the given key.
	fn save(&mut self, id: &Value, values: Row) -> TreeResult<()>;

	/// Saves several rows.
	///
	/// The default saves one row at a time; stores that support
	/// transactions should apply the batch all-or-nothing.
	fn save_batch(&mut self, updates: Vec<(Value, Row)>) -> TreeResult<()> {
		for (id, values) in updates {
			self.save(&id, values)?;
		}
		Ok(())
	}

	/// Deletes a row; returns whether it existed.
	fn delete(&mut self, id: &Value) -> TreeResult<bool>;

	/// Deletes every row whose `parent_column` equals `parent_id`.
	fn delete_children(&mut self, parent_column: &str, parent_id: &Value) -> TreeResult<usize>;
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	key_column: String,
	rows: Vec<Row>,
}

impl MemoryStore {
	/// Creates a store keyed by `key_column`.
	pub fn new(key_column: impl Into<String>, rows: Vec<Row>) -> Self {
		Self {
			key_column: key_column.into(),
			rows,
		}
	}

	/// Creates a store from JSON values; non-object values are skipped.
	pub fn from_values(key_column: impl Into<String>, values: Vec<Value>) -> Self {
		let rows = values
			.into_iter()
			.filter_map(|value| match value {
				Value::Object(row) => Some(row),
				_ => None,
			})
			.collect();
		Self::new(key_column, rows)
	}

	/// All rows in insertion order.
	pub fn rows(&self) -> &[Row] {
		&self.rows
	}

	/// A queryable snapshot of the rows.
	pub fn table(&self) -> MemoryTable {
		MemoryTable::new(self.rows.clone())
	}

	fn position(&self, id: &Value) -> Option<usize> {
		let wanted = key_string(id)?;
		self.rows.iter().position(|row| {
			row_get(row, &self.key_column).and_then(key_string).as_deref() == Some(wanted.as_str())
		})
	}
}

impl RowStore for MemoryStore {
	fn find(&self, id: &Value) -> TreeResult<Option<Row>> {
		Ok(self.position(id).map(|index| self.rows[index].clone()))
	}

	fn save(&mut self, id: &Value, values: Row) -> TreeResult<()> {
		let index = self
			.position(id)
			.ok_or_else(|| TreeError::NodeNotFound(key_string(id).unwrap_or_default()))?;
		let row = &mut self.rows[index];
		for (column, value) in values {
			row_set(row, &column, value);
		}
		Ok(())
	}

	fn save_batch(&mut self, updates: Vec<(Value, Row)>) -> TreeResult<()> {
		let mut staged = self.rows.clone();
		for (id, values) in updates {
			let index = self
				.position(&id)
				.ok_or_else(|| TreeError::NodeNotFound(key_string(&id).unwrap_or_default()))?;
			for (column, value) in values {
				row_set(&mut staged[index], &column, value);
			}
		}
		self.rows = staged;
		Ok(())
	}

	fn delete(&mut self, id: &Value) -> TreeResult<bool> {
		match self.position(id) {
			Some(index) => {
				self.rows.remove(index);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	fn delete_children(&mut self, parent_column: &str, parent_id: &Value) -> TreeResult<usize> {
		let Some(parent) = key_string(parent_id) else {
			return Ok(0);
		};
		let before = self.rows.len();
		self.rows.retain(|row| {
			row_get(row, parent_column).and_then(key_string).as_deref() != Some(parent.as_str())
		});
		Ok(before - self.rows.len())
	}
}
