// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the directory API.

use roster_identity::ExistingIdentity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	pub access_token: String,
	#[serde(default = "default_expires_in")]
	pub expires_in: u64,
}

fn default_expires_in() -> u64 {
	3600
}

#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
	#[serde(default = "Vec::new")]
	pub value: Vec<T>,
	#[serde(rename = "@odata.nextLink")]
	pub next_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphUser {
	pub mail: Option<String>,
	pub user_principal_name: Option<String>,
	pub display_name: Option<String>,
}

impl GraphUser {
	/// Mail then principal name, keeping those ending in `suffix`
	/// (lower-cased `@domain`). Case-insensitive duplicates are dropped.
	pub fn addresses_at(&self, suffix: &str) -> Vec<&str> {
		let mut addresses: Vec<&str> = Vec::with_capacity(2);
		for address in [self.mail.as_deref(), self.user_principal_name.as_deref()]
			.into_iter()
			.flatten()
			.map(str::trim)
		{
			if address.to_lowercase().ends_with(suffix)
				&& !addresses.iter().any(|seen| seen.eq_ignore_ascii_case(address))
			{
				addresses.push(address);
			}
		}
		addresses
	}

	/// `None` when the user holds no address at the domain.
	pub fn to_identity(&self, suffix: &str) -> Option<ExistingIdentity> {
		let mut addresses = self.addresses_at(suffix).into_iter();
		let primary = addresses.next()?;
		let display_name = self.display_name.clone().unwrap_or_default();
		Some(addresses.fold(ExistingIdentity::new(primary, display_name), |identity, other| {
			identity.with_other_address(other)
		}))
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateUserRequest<'a> {
	pub account_enabled: bool,
	pub display_name: &'a str,
	pub mail_nickname: &'a str,
	pub user_principal_name: &'a str,
	pub mail: &'a str,
	pub password_profile: PasswordProfile<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordProfile<'a> {
	pub force_change_password_next_sign_in: bool,
	pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedUser {
	pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphGroup {
	pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MemberReference {
	#[serde(rename = "@odata.id")]
	pub odata_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
	pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
	#[serde(default)]
	pub code: String,
	#[serde(default)]
	pub message: String,
}

/// Best human-readable message from an error body.
pub(crate) fn error_message(body: &str) -> String {
	match serde_json::from_str::<ErrorEnvelope>(body) {
		Ok(envelope) if !envelope.error.message.is_empty() => {
			if envelope.error.code.is_empty() {
				envelope.error.message
			} else {
				format!("{}: {}", envelope.error.code, envelope.error.message)
			}
		}
		_ => body.trim().to_string(),
	}
}
