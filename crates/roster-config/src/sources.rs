// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::{env_bool, env_parse, env_var, load_secret_env};
use crate::error::ConfigError;
use crate::layer::RosterConfigLayer;
use crate::sections::{
	CompanionConfigLayer, DirectoryConfigLayer, LogFormat, LoggingConfigLayer,
	NotificationConfigLayer, ProvisioningConfigLayer,
};

/// Default system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/roster/roster.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<RosterConfigLayer, ConfigError>;
}

/// Built-in defaults. Section defaults live in each section's `finalize`, so
/// this layer is empty.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<RosterConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(RosterConfigLayer::default())
	}
}

/// TOML file source. A missing file is not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<RosterConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(RosterConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: RosterConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `ROSTER_<SECTION>_<FIELD>`, e.g. `ROSTER_DIRECTORY_DOMAIN`.
/// Secrets also accept `<VAR>_FILE`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<RosterConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(RosterConfigLayer {
			directory: Some(load_directory_from_env()?),
			provisioning: Some(load_provisioning_from_env()?),
			companion: Some(load_companion_from_env()?),
			notification: Some(load_notification_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn load_directory_from_env() -> Result<DirectoryConfigLayer, ConfigError> {
	Ok(DirectoryConfigLayer {
		tenant_id: env_var("ROSTER_DIRECTORY_TENANT_ID"),
		client_id: env_var("ROSTER_DIRECTORY_CLIENT_ID"),
		client_secret: load_secret_env("ROSTER_DIRECTORY_CLIENT_SECRET")?,
		domain: env_var("ROSTER_DIRECTORY_DOMAIN"),
		api_base_url: env_var("ROSTER_DIRECTORY_API_BASE_URL"),
		token_url: env_var("ROSTER_DIRECTORY_TOKEN_URL"),
		request_timeout_secs: env_parse("ROSTER_DIRECTORY_REQUEST_TIMEOUT_SECS")?,
	})
}

fn load_provisioning_from_env() -> Result<ProvisioningConfigLayer, ConfigError> {
	Ok(ProvisioningConfigLayer {
		propagation_delay_secs: env_parse("ROSTER_PROVISIONING_PROPAGATION_DELAY_SECS")?,
		group_retry_attempts: env_parse("ROSTER_PROVISIONING_GROUP_RETRY_ATTEMPTS")?,
		group_retry_delay_secs: env_parse("ROSTER_PROVISIONING_GROUP_RETRY_DELAY_SECS")?,
		inter_record_delay_ms: env_parse("ROSTER_PROVISIONING_INTER_RECORD_DELAY_MS")?,
		credential_length: env_parse("ROSTER_PROVISIONING_CREDENTIAL_LENGTH")?,
		student_group: env_var("ROSTER_PROVISIONING_STUDENT_GROUP"),
		staff_group: env_var("ROSTER_PROVISIONING_STAFF_GROUP"),
		output_dir: env_var("ROSTER_PROVISIONING_OUTPUT_DIR").map(PathBuf::from),
	})
}

fn load_companion_from_env() -> Result<CompanionConfigLayer, ConfigError> {
	Ok(CompanionConfigLayer {
		base_url: env_var("ROSTER_COMPANION_BASE_URL"),
		username: env_var("ROSTER_COMPANION_USERNAME"),
		password: load_secret_env("ROSTER_COMPANION_PASSWORD")?,
		login_path: env_var("ROSTER_COMPANION_LOGIN_PATH"),
		create_path: env_var("ROSTER_COMPANION_CREATE_PATH"),
		default_password: load_secret_env("ROSTER_COMPANION_DEFAULT_PASSWORD")?,
		default_birth_date: env_var("ROSTER_COMPANION_DEFAULT_BIRTH_DATE"),
		request_timeout_secs: env_parse("ROSTER_COMPANION_REQUEST_TIMEOUT_SECS")?,
	})
}

fn load_notification_from_env() -> Result<NotificationConfigLayer, ConfigError> {
	Ok(NotificationConfigLayer {
		host: env_var("ROSTER_NOTIFICATION_HOST"),
		port: env_parse("ROSTER_NOTIFICATION_PORT")?,
		username: env_var("ROSTER_NOTIFICATION_USERNAME"),
		password: load_secret_env("ROSTER_NOTIFICATION_PASSWORD")?,
		from_address: env_var("ROSTER_NOTIFICATION_FROM_ADDRESS"),
		from_name: env_var("ROSTER_NOTIFICATION_FROM_NAME"),
		use_tls: env_bool("ROSTER_NOTIFICATION_USE_TLS"),
		welcome_subject: env_var("ROSTER_NOTIFICATION_WELCOME_SUBJECT"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("ROSTER_LOGGING_LEVEL"),
		format: env_var("ROSTER_LOGGING_FORMAT")
			.map(|v| LogFormat::from_str_value(&v))
			.transpose()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.directory.is_none());
		assert!(layer.provisioning.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/roster.toml").load().unwrap();
		assert!(layer.directory.is_none());
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[directory\ndomain = ").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_toml_source_reads_sections() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[provisioning]\ninter_record_delay_ms = 250").unwrap();
		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.provisioning.unwrap().inter_record_delay_ms, Some(250));
	}

	#[test]
	fn test_env_source_reads_companion_base_url() {
		std::env::set_var("ROSTER_COMPANION_BASE_URL", "https://companion.test");
		let layer = load_companion_from_env().unwrap();
		assert_eq!(layer.base_url.as_deref(), Some("https://companion.test"));
		std::env::remove_var("ROSTER_COMPANION_BASE_URL");
	}
}
