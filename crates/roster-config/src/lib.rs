// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for roster.
//!
//! Sources are merged in precedence order:
//! 1. Environment variables (`ROSTER_*`, secrets also via `*_FILE`)
//! 2. Config file (`/etc/roster/roster.toml`, or `--config`)
//! 3. Built-in defaults
//!
//! ```ignore
//! let config = roster_config::load_config()?;
//! println!("allocating addresses at {}", config.directory.domain);
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::load_secret_env;
pub use error::ConfigError;
pub use layer::RosterConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct RosterConfig {
	pub directory: DirectoryConfig,
	pub provisioning: ProvisioningConfig,
	/// `None` when the companion application is not configured.
	pub companion: Option<CompanionConfig>,
	/// `None` when SMTP is not configured.
	pub notification: Option<NotificationConfig>,
	pub logging: LoggingConfig,
}

pub fn load_config() -> Result<RosterConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<RosterConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<RosterConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = RosterConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved, validated configuration.
pub fn finalize(layer: RosterConfigLayer) -> Result<RosterConfig, ConfigError> {
	let directory = layer.directory.unwrap_or_default().finalize();
	let provisioning = layer.provisioning.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let companion = layer.companion.unwrap_or_default().build()?;
	let notification = layer.notification.unwrap_or_default().build()?;

	let config = RosterConfig {
		directory,
		provisioning,
		companion,
		notification,
		logging,
	};
	validate_config(&config)?;

	info!(
		domain = %config.directory.domain,
		directory_credentials = config.directory.has_credentials(),
		propagation_delay_secs = config.provisioning.propagation_delay.as_secs(),
		group_retry_attempts = config.provisioning.group_retry_attempts,
		companion_configured = config.companion.is_some(),
		notification_configured = config.notification.is_some(),
		"configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &RosterConfig) -> Result<(), ConfigError> {
	if config.directory.domain.is_empty() {
		return Err(ConfigError::Validation(
			"directory.domain cannot be empty".to_string(),
		));
	}
	if !config.directory.domain.contains('.') {
		return Err(ConfigError::InvalidValue {
			key: "directory.domain".to_string(),
			message: format!("'{}' is not a domain name", config.directory.domain),
		});
	}
	config.provisioning.validate()
}
