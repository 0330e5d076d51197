// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Companion web application settings.

use roster_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanionConfigLayer {
	pub base_url: Option<String>,
	pub username: Option<String>,
	#[serde(skip_serializing)]
	pub password: Option<SecretString>,
	pub login_path: Option<String>,
	pub create_path: Option<String>,
	#[serde(skip_serializing)]
	pub default_password: Option<SecretString>,
	pub default_birth_date: Option<String>,
	pub request_timeout_secs: Option<u64>,
}

impl CompanionConfigLayer {
	pub fn merge(&mut self, other: CompanionConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.login_path.is_some() {
			self.login_path = other.login_path;
		}
		if other.create_path.is_some() {
			self.create_path = other.create_path;
		}
		if other.default_password.is_some() {
			self.default_password = other.default_password;
		}
		if other.default_birth_date.is_some() {
			self.default_birth_date = other.default_birth_date;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn is_configured(&self) -> bool {
		self.base_url.as_ref().is_some_and(|u| !u.is_empty())
	}

	/// `Ok(None)` when no base URL is set: the companion stage is disabled.
	pub fn build(self) -> Result<Option<CompanionConfig>, ConfigError> {
		let Some(base_url) = self.base_url.filter(|u| !u.is_empty()) else {
			return Ok(None);
		};

		let username = self.username.filter(|u| !u.is_empty()).ok_or_else(|| {
			ConfigError::Validation("companion.username is required when base_url is set".to_string())
		})?;
		let password = self.password.ok_or_else(|| {
			ConfigError::Validation("companion.password is required when base_url is set".to_string())
		})?;
		let default_password = self.default_password.ok_or_else(|| {
			ConfigError::Validation(
				"companion.default_password is required when base_url is set".to_string(),
			)
		})?;

		let default_birth_date = self
			.default_birth_date
			.unwrap_or_else(|| "1990-01-01".to_string());
		if !looks_like_iso_date(&default_birth_date) {
			return Err(ConfigError::InvalidValue {
				key: "companion.default_birth_date".to_string(),
				message: format!("expected YYYY-MM-DD, got '{default_birth_date}'"),
			});
		}

		Ok(Some(CompanionConfig {
			base_url: base_url.trim_end_matches('/').to_string(),
			username,
			password,
			login_path: self.login_path.unwrap_or_else(|| "/login".to_string()),
			create_path: self.create_path.unwrap_or_else(|| "/users/create".to_string()),
			default_password,
			default_birth_date,
			request_timeout_secs: self.request_timeout_secs.unwrap_or(30),
		}))
	}
}

fn looks_like_iso_date(value: &str) -> bool {
	let parts: Vec<&str> = value.split('-').collect();
	matches!(parts.as_slice(), [y, m, d]
		if y.len() == 4 && m.len() == 2 && d.len() == 2
			&& parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())))
}

#[derive(Debug, Clone)]
pub struct CompanionConfig {
	pub base_url: String,
	pub username: String,
	pub password: SecretString,
	pub login_path: String,
	pub create_path: String,
	/// Initial password every new companion account receives.
	pub default_password: SecretString,
	pub default_birth_date: String,
	pub request_timeout_secs: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn complete() -> CompanionConfigLayer {
		CompanionConfigLayer {
			base_url: Some("https://companion.example.edu/".to_string()),
			username: Some("operator".to_string()),
			password: Some(SecretString::new("pw")),
			default_password: Some(SecretString::new("Welcome2025")),
			..Default::default()
		}
	}

	#[test]
	fn disabled_without_base_url() {
		assert!(CompanionConfigLayer::default().build().unwrap().is_none());
	}

	#[test]
	fn applies_defaults() {
		let config = complete().build().unwrap().unwrap();
		assert_eq!(config.base_url, "https://companion.example.edu");
		assert_eq!(config.login_path, "/login");
		assert_eq!(config.default_birth_date, "1990-01-01");
	}

	#[test]
	fn requires_credentials() {
		let layer = CompanionConfigLayer {
			password: None,
			..complete()
		};
		assert!(matches!(layer.build(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn rejects_malformed_birth_date() {
		let layer = CompanionConfigLayer {
			default_birth_date: Some("01/01/1990".to_string()),
			..complete()
		};
		assert!(matches!(layer.build(), Err(ConfigError::InvalidValue { .. })));
	}
}
