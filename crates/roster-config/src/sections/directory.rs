// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory service connection settings.

use roster_common_secret::SecretString;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DOMAIN: &str = "example.edu";
pub const DEFAULT_API_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfigLayer {
	pub tenant_id: Option<String>,
	pub client_id: Option<String>,
	#[serde(skip_serializing)]
	pub client_secret: Option<SecretString>,
	pub domain: Option<String>,
	pub api_base_url: Option<String>,
	pub token_url: Option<String>,
	pub request_timeout_secs: Option<u64>,
}

impl DirectoryConfigLayer {
	pub fn merge(&mut self, other: DirectoryConfigLayer) {
		if other.tenant_id.is_some() {
			self.tenant_id = other.tenant_id;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.domain.is_some() {
			self.domain = other.domain;
		}
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
		if other.token_url.is_some() {
			self.token_url = other.token_url;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> DirectoryConfig {
		DirectoryConfig {
			tenant_id: self.tenant_id.filter(|s| !s.is_empty()),
			client_id: self.client_id.filter(|s| !s.is_empty()),
			client_secret: self.client_secret.filter(|s| !s.is_empty()),
			domain: self
				.domain
				.map(|d| d.trim().trim_start_matches('@').to_lowercase())
				.unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
			api_base_url: self
				.api_base_url
				.map(|u| u.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
			token_url: self.token_url.filter(|s| !s.is_empty()),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
		}
	}
}

/// Resolved directory settings. Credentials stay optional until a client is
/// actually built, so a config without them can still be inspected.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
	pub tenant_id: Option<String>,
	pub client_id: Option<String>,
	pub client_secret: Option<SecretString>,
	/// Institutional address domain, lower-cased, without `@`.
	pub domain: String,
	pub api_base_url: String,
	pub token_url: Option<String>,
	pub request_timeout_secs: u64,
}

impl Default for DirectoryConfig {
	fn default() -> Self {
		DirectoryConfigLayer::default().finalize()
	}
}

impl DirectoryConfig {
	pub fn has_credentials(&self) -> bool {
		self.tenant_id.is_some() && self.client_id.is_some() && self.client_secret.is_some()
	}

	/// Explicit token endpoint, or the tenant's v2 endpoint.
	pub fn token_endpoint(&self) -> Option<String> {
		self.token_url.clone().or_else(|| {
			self.tenant_id
				.as_ref()
				.map(|tenant| format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"))
		})
	}
}
