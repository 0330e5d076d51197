// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP settings for welcome messages.

use roster_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_WELCOME_SUBJECT: &str = "Welcome - your institutional account";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfigLayer {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub username: Option<String>,
	#[serde(skip_serializing)]
	pub password: Option<SecretString>,
	pub from_address: Option<String>,
	pub from_name: Option<String>,
	pub use_tls: Option<bool>,
	pub welcome_subject: Option<String>,
}

impl NotificationConfigLayer {
	pub fn merge(&mut self, other: NotificationConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.from_address.is_some() {
			self.from_address = other.from_address;
		}
		if other.from_name.is_some() {
			self.from_name = other.from_name;
		}
		if other.use_tls.is_some() {
			self.use_tls = other.use_tls;
		}
		if other.welcome_subject.is_some() {
			self.welcome_subject = other.welcome_subject;
		}
	}

	pub fn is_configured(&self) -> bool {
		self.host.as_ref().is_some_and(|h| !h.is_empty())
	}

	/// `Ok(None)` when no host is set: welcome messages are not sent.
	pub fn build(self) -> Result<Option<NotificationConfig>, ConfigError> {
		let Some(host) = self.host.filter(|h| !h.is_empty()) else {
			return Ok(None);
		};

		let from_address = self.from_address.filter(|a| !a.is_empty()).ok_or_else(|| {
			ConfigError::Validation(
				"notification.from_address is required when host is configured".to_string(),
			)
		})?;

		Ok(Some(NotificationConfig {
			host,
			port: self.port.unwrap_or(587),
			username: self.username,
			password: self.password,
			from_address,
			from_name: self.from_name.unwrap_or_else(|| "Roster".to_string()),
			use_tls: self.use_tls.unwrap_or(true),
			welcome_subject: self
				.welcome_subject
				.unwrap_or_else(|| DEFAULT_WELCOME_SUBJECT.to_string()),
		}))
	}
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub from_address: String,
	pub from_name: String,
	pub use_tls: bool,
	pub welcome_subject: String,
}

impl NotificationConfig {
	pub fn has_auth(&self) -> bool {
		self.username.is_some() && self.password.is_some()
	}
}
