//! Grid settings
//!
//! Settings can be loaded from TOML or JSON files, from strings, or built in
//! code, and then overridden by `TABULA_*` environment variables. Every
//! section falls back to its defaults when omitted.
//!
//! ```toml
//! [reserved]
//! scope = "_scope_"
//! page = "page"
//!
//! [tree]
//! parent_column = "parent_id"
//! root_text = "ROOT"
//!
//! [pagination]
//! per_page = 20
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level settings for the grid pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabulaSettings {
	/// Names of the reserved request parameters.
	pub reserved: ReservedKeys,

	/// Tree column names and rendering.
	pub tree: TreeSettings,

	/// Page sizes.
	pub pagination: PaginationSettings,

	/// Logging configuration.
	pub logging: LoggingSettings,
}

/// Names of the request parameters the pipeline reserves for itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedKeys {
	/// Active scope key.
	pub scope: String,
	/// Page number key.
	pub page: String,
	/// Page size key.
	pub per_page: String,
	/// Sort specification key.
	pub sort: String,
	/// Quick-search key.
	pub search: String,
	/// Export scope key.
	pub export: String,
	/// Serialized tree order key.
	pub order: String,
	/// Prefix of the per-column "is null" switches.
	pub isnull_prefix: String,
}

impl Default for ReservedKeys {
	fn default() -> Self {
		Self {
			scope: "_scope_".to_string(),
			page: "page".to_string(),
			per_page: "per_page".to_string(),
			sort: "_sort".to_string(),
			search: "_search_".to_string(),
			export: "_export_".to_string(),
			order: "_order".to_string(),
			isnull_prefix: "isnull-".to_string(),
		}
	}
}

impl ReservedKeys {
	/// The page key of a grid, namespaced by the grid name when one is set.
	///
	/// # Examples
	///
	/// ```
	/// use tabula_core::ReservedKeys;
	///
	/// let keys = ReservedKeys::default();
	/// assert_eq!(keys.page_key(None), "page");
	/// assert_eq!(keys.page_key(Some("users")), "users_page");
	/// ```
	pub fn page_key(&self, grid: Option<&str>) -> String {
		match grid {
			Some(name) if !name.is_empty() => format!("{name}_{}", self.page),
			_ => self.page.clone(),
		}
	}
}

/// Column names and rendering of tree views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
	/// Primary-key column.
	pub key_column: String,
	/// Parent reference column.
	pub parent_column: String,
	/// Column used as the node label.
	pub title_column: String,
	/// Sibling rank column.
	pub order_column: String,
	/// Parent id denoting a root node.
	pub root_id: serde_json::Value,
	/// Label of the synthetic root option.
	pub root_text: String,
	/// Indentation unit of the option labels.
	pub indent_unit: String,
	/// Glyph marking a tree branch in option labels.
	pub branch_glyph: String,
}

impl Default for TreeSettings {
	fn default() -> Self {
		Self {
			key_column: "id".to_string(),
			parent_column: "parent_id".to_string(),
			title_column: "title".to_string(),
			order_column: "order".to_string(),
			root_id: serde_json::Value::from(0),
			root_text: "ROOT".to_string(),
			indent_unit: "&nbsp;".to_string(),
			branch_glyph: "┝".to_string(),
		}
	}
}

/// Page sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
	/// Rows per page when the request does not ask for a size.
	pub per_page: usize,
	/// Upper bound for requested page sizes.
	pub max_per_page: usize,
	/// Batch size used when streaming rows.
	pub chunk_size: usize,
}

impl Default for PaginationSettings {
	fn default() -> Self {
		Self {
			per_page: 20,
			max_per_page: 100,
			chunk_size: 100,
		}
	}
}

impl PaginationSettings {
	/// Clamps a requested page size to `1..=max_per_page`.
	pub fn clamp(&self, requested: Option<usize>) -> usize {
		requested
			.unwrap_or(self.per_page)
			.clamp(1, self.max_per_page.max(1))
	}
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Filter directive, e.g. `info` or `tabula_filter=debug,info`.
	pub level: String,
	/// Output format: `text` or `json`.
	pub format: String,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: "text".to_string(),
		}
	}
}

impl LoggingSettings {
	/// Checks that the format is `text` or `json`.
	pub fn validate(&self) -> Result<(), SettingsError> {
		match self.format.as_str() {
			"text" | "json" => Ok(()),
			other => Err(SettingsError::ValidationError(format!(
				"unknown log format: {other}"
			))),
		}
	}
}

impl TabulaSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Load settings from a configuration file
	///
	/// The format is chosen by extension: `.toml` or `.json`.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => Self::from_json_str(&contents),
			_ => Err(SettingsError::UnsupportedFormat(
				"Supported formats: .toml, .json".to_string(),
			)),
		}
	}

	/// Parse settings from TOML text.
	pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
		toml::from_str(contents)
			.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))
	}

	/// Parse settings from JSON text.
	pub fn from_json_str(contents: &str) -> Result<Self, SettingsError> {
		serde_json::from_str(contents)
			.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e)))
	}

	/// Load default settings overridden by environment variables
	pub fn from_env() -> Result<Self, SettingsError> {
		let mut settings = Self::default();
		settings.apply_env_overrides()?;
		Ok(settings)
	}

	/// Apply `TABULA_*` environment variables on top of the current values.
	///
	/// | Variable | Setting |
	/// |---|---|
	/// | `TABULA_LOG_LEVEL` | `logging.level` |
	/// | `TABULA_LOG_FORMAT` | `logging.format` |
	/// | `TABULA_PER_PAGE` | `pagination.per_page` |
	/// | `TABULA_MAX_PER_PAGE` | `pagination.max_per_page` |
	/// | `TABULA_CHUNK_SIZE` | `pagination.chunk_size` |
	/// | `TABULA_SCOPE_KEY` | `reserved.scope` |
	/// | `TABULA_PAGE_KEY` | `reserved.page` |
	/// | `TABULA_SORT_KEY` | `reserved.sort` |
	/// | `TABULA_TREE_ROOT_TEXT` | `tree.root_text` |
	pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
		self.apply_overrides(|key| std::env::var(key).ok())
	}

	fn apply_overrides(
		&mut self,
		lookup: impl Fn(&str) -> Option<String>,
	) -> Result<(), SettingsError> {
		if let Some(level) = lookup("TABULA_LOG_LEVEL") {
			self.logging.level = level;
		}
		if let Some(format) = lookup("TABULA_LOG_FORMAT") {
			self.logging.format = format.to_lowercase();
		}

		let sizes = [
			("TABULA_PER_PAGE", &mut self.pagination.per_page),
			("TABULA_MAX_PER_PAGE", &mut self.pagination.max_per_page),
			("TABULA_CHUNK_SIZE", &mut self.pagination.chunk_size),
		];
		for (key, slot) in sizes {
			if let Some(raw) = lookup(key) {
				*slot = raw.trim().parse().map_err(|e| {
					SettingsError::ParseError(format!("{key} must be a positive integer: {e}"))
				})?;
			}
		}

		let keys = [
			("TABULA_SCOPE_KEY", &mut self.reserved.scope),
			("TABULA_PAGE_KEY", &mut self.reserved.page),
			("TABULA_SORT_KEY", &mut self.reserved.sort),
			("TABULA_TREE_ROOT_TEXT", &mut self.tree.root_text),
		];
		for (key, slot) in keys {
			if let Some(value) = lookup(key) {
				*slot = value;
			}
		}

		self.validate()
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.pagination.per_page == 0 || self.pagination.chunk_size == 0 {
			return Err(SettingsError::ValidationError(
				"page and chunk sizes must be greater than zero".to_string(),
			));
		}
		self.logging.validate()
	}
}

/// Settings error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// The settings file could not be read.
	#[error("File error: {0}")]
	FileError(String),

	/// The settings text is malformed.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// A value is out of range.
	#[error("Validation error: {0}")]
	ValidationError(String),

	/// The file extension is not recognized.
	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),

	/// The global subscriber could not be installed.
	#[error("Logging error: {0}")]
	LoggingError(String),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	#[rstest]
	fn test_default_settings() {
		let settings = TabulaSettings::default();

		assert_eq!(settings.reserved.scope, "_scope_");
		assert_eq!(settings.reserved.isnull_prefix, "isnull-");
		assert_eq!(settings.tree.root_id, serde_json::json!(0));
		assert_eq!(settings.pagination.per_page, 20);
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	fn test_partial_toml_keeps_defaults() {
		// Arrange
		let text = "[tree]\nroot_text = \"Top\"\n\n[pagination]\nper_page = 50\n";

		// Act
		let settings = TabulaSettings::from_toml_str(text).unwrap();

		// Assert
		assert_eq!(settings.tree.root_text, "Top");
		assert_eq!(settings.tree.parent_column, "parent_id");
		assert_eq!(settings.pagination.per_page, 50);
		assert_eq!(settings.pagination.max_per_page, 100);
	}

	#[rstest]
	fn test_overrides_from_lookup() {
		let vars: HashMap<&str, &str> = [
			("TABULA_LOG_FORMAT", "JSON"),
			("TABULA_PER_PAGE", "15"),
			("TABULA_SORT_KEY", "order_by"),
		]
		.into_iter()
		.collect();
		let mut settings = TabulaSettings::default();

		settings
			.apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
			.unwrap();

		assert_eq!(settings.logging.format, "json");
		assert_eq!(settings.pagination.per_page, 15);
		assert_eq!(settings.reserved.sort, "order_by");
	}

	#[rstest]
	#[case("TABULA_PER_PAGE", "many")]
	#[case("TABULA_CHUNK_SIZE", "0")]
	#[case("TABULA_LOG_FORMAT", "xml")]
	fn test_invalid_override_is_rejected(#[case] key: &str, #[case] value: &str) {
		let mut settings = TabulaSettings::default();

		let result = settings.apply_overrides(|k| (k == key).then(|| value.to_string()));

		assert!(result.is_err());
	}

	#[rstest]
	#[case(None, 20)]
	#[case(Some(0), 1)]
	#[case(Some(500), 100)]
	#[case(Some(35), 35)]
	fn test_page_size_clamp(#[case] requested: Option<usize>, #[case] expected: usize) {
		assert_eq!(PaginationSettings::default().clamp(requested), expected);
	}
}
