//! Logging bootstrap
//!
//! Installs a global `tracing` subscriber configured from [`LoggingSettings`].
//! `RUST_LOG`, when set, takes precedence over the configured level.

use crate::settings::{LoggingSettings, SettingsError};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// Fails when a global subscriber is already installed or the level is not a
/// valid filter directive.
pub fn init(settings: &LoggingSettings) -> Result<(), SettingsError> {
	settings.validate()?;
	let filter = env_filter(settings)?;

	let result = match settings.format.as_str() {
		"json" => fmt().json().with_env_filter(filter).try_init(),
		_ => fmt().with_env_filter(filter).try_init(),
	};
	result.map_err(|e| SettingsError::LoggingError(e.to_string()))?;

	tracing::debug!(level = %settings.level, format = %settings.format, "logging initialized");
	Ok(())
}

/// Builds the filter from `RUST_LOG` or, when unset, from the configured level.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, SettingsError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => EnvFilter::try_new(&settings.level)
			.map_err(|e| SettingsError::LoggingError(format!("invalid level {}: {e}", settings.level))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unknown_format_is_rejected() {
		let settings = LoggingSettings {
			level: "info".to_string(),
			format: "xml".to_string(),
		};

		assert!(matches!(
			init(&settings),
			Err(SettingsError::ValidationError(_))
		));
	}

	#[rstest]
	fn test_level_directive_is_parsed() {
		let settings = LoggingSettings {
			level: "tabula_filter=debug,info".to_string(),
			format: "text".to_string(),
		};

		assert!(env_filter(&settings).is_ok());
	}
}
