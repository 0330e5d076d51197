// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pipeline pacing, retry and output settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shortest temporary credential the pipeline will issue.
pub const MIN_CREDENTIAL_LENGTH: usize = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProvisioningConfigLayer {
	pub propagation_delay_secs: Option<u64>,
	pub group_retry_attempts: Option<u32>,
	pub group_retry_delay_secs: Option<u64>,
	pub inter_record_delay_ms: Option<u64>,
	pub credential_length: Option<usize>,
	pub student_group: Option<String>,
	pub staff_group: Option<String>,
	pub output_dir: Option<PathBuf>,
}

impl ProvisioningConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.propagation_delay_secs.is_some() {
			self.propagation_delay_secs = other.propagation_delay_secs;
		}
		if other.group_retry_attempts.is_some() {
			self.group_retry_attempts = other.group_retry_attempts;
		}
		if other.group_retry_delay_secs.is_some() {
			self.group_retry_delay_secs = other.group_retry_delay_secs;
		}
		if other.inter_record_delay_ms.is_some() {
			self.inter_record_delay_ms = other.inter_record_delay_ms;
		}
		if other.credential_length.is_some() {
			self.credential_length = other.credential_length;
		}
		if other.student_group.is_some() {
			self.student_group = other.student_group;
		}
		if other.staff_group.is_some() {
			self.staff_group = other.staff_group;
		}
		if other.output_dir.is_some() {
			self.output_dir = other.output_dir;
		}
	}

	pub fn finalize(self) -> ProvisioningConfig {
		let defaults = ProvisioningConfig::default();
		ProvisioningConfig {
			propagation_delay: self
				.propagation_delay_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.propagation_delay),
			group_retry_attempts: self
				.group_retry_attempts
				.unwrap_or(defaults.group_retry_attempts),
			group_retry_delay: self
				.group_retry_delay_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.group_retry_delay),
			inter_record_delay: self
				.inter_record_delay_ms
				.map(Duration::from_millis)
				.unwrap_or(defaults.inter_record_delay),
			credential_length: self.credential_length.unwrap_or(defaults.credential_length),
			student_group: self.student_group.unwrap_or(defaults.student_group),
			staff_group: self.staff_group.unwrap_or(defaults.staff_group),
			output_dir: self.output_dir.unwrap_or(defaults.output_dir),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningConfig {
	/// Settling time after account creation before the first group write.
	pub propagation_delay: Duration,
	/// Total attempts, including the first.
	pub group_retry_attempts: u32,
	pub group_retry_delay: Duration,
	pub inter_record_delay: Duration,
	pub credential_length: usize,
	pub student_group: String,
	pub staff_group: String,
	pub output_dir: PathBuf,
}

impl Default for ProvisioningConfig {
	fn default() -> Self {
		Self {
			propagation_delay: Duration::from_secs(15),
			group_retry_attempts: 3,
			group_retry_delay: Duration::from_secs(5),
			inter_record_delay: Duration::from_millis(1000),
			credential_length: 12,
			student_group: "Students".to_string(),
			staff_group: "Staff".to_string(),
			output_dir: PathBuf::from("logs"),
		}
	}
}

impl ProvisioningConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.group_retry_attempts == 0 {
			return Err(ConfigError::Validation(
				"provisioning.group_retry_attempts must be at least 1".to_string(),
			));
		}
		if self.credential_length < MIN_CREDENTIAL_LENGTH {
			return Err(ConfigError::Validation(format!(
				"provisioning.credential_length must be at least {MIN_CREDENTIAL_LENGTH}, got {}",
				self.credential_length
			)));
		}
		if self.student_group.trim().is_empty() || self.staff_group.trim().is_empty() {
			return Err(ConfigError::Validation(
				"provisioning group names cannot be empty".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn defaults_match_directory_timing() {
		let config = ProvisioningConfigLayer::default().finalize();
		assert_eq!(config.propagation_delay, Duration::from_secs(15));
		assert_eq!(config.group_retry_attempts, 3);
		assert_eq!(config.group_retry_delay, Duration::from_secs(5));
		assert_eq!(config.credential_length, 12);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn zero_attempts_rejected() {
		let config = ProvisioningConfigLayer {
			group_retry_attempts: Some(0),
			..Default::default()
		}
		.finalize();
		assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn short_credentials_rejected() {
		let config = ProvisioningConfigLayer {
			credential_length: Some(6),
			..Default::default()
		}
		.finalize();
		assert!(config.validate().is_err());
	}

	#[test]
	fn parses_from_toml() {
		let layer: ProvisioningConfigLayer = toml::from_str(
			r#"
propagation_delay_secs = 20
student_group = "Estudiantes Licencias A5"
output_dir = "/var/log/roster"
"#,
		)
		.unwrap();
		let config = layer.finalize();
		assert_eq!(config.propagation_delay, Duration::from_secs(20));
		assert_eq!(config.student_group, "Estudiantes Licencias A5");
		assert_eq!(config.output_dir, PathBuf::from("/var/log/roster"));
		assert_eq!(config.staff_group, "Staff");
	}

	proptest! {
		#[test]
		fn merge_prefers_the_later_layer(base in proptest::option::of(0u64..100), over in proptest::option::of(0u64..100)) {
			let mut layer = ProvisioningConfigLayer { propagation_delay_secs: base, ..Default::default() };
			layer.merge(ProvisioningConfigLayer { propagation_delay_secs: over, ..Default::default() });
			prop_assert_eq!(layer.propagation_delay_secs, over.or(base));
		}
	}
}
