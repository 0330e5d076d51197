// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-credentials access tokens, cached until shortly before expiry.

use std::time::{Duration, Instant};

use reqwest::Client;
use roster_common_secret::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use crate::error::{DirectoryError, Result};
use crate::types::{error_message, TokenResponse};

pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are renewed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
	token: SecretString,
	expires_at: Instant,
}

pub(crate) struct TokenProvider {
	endpoint: String,
	client_id: String,
	client_secret: SecretString,
	scope: String,
	cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
	pub fn new(endpoint: String, client_id: String, client_secret: SecretString) -> Self {
		Self {
			endpoint,
			client_id,
			client_secret,
			scope: DEFAULT_SCOPE.to_string(),
			cached: Mutex::new(None),
		}
	}

	pub async fn token(&self, http: &Client) -> Result<SecretString> {
		let mut cached = self.cached.lock().await;
		if let Some(entry) = cached.as_ref() {
			if Instant::now() < entry.expires_at {
				return Ok(entry.token.clone());
			}
		}

		let (token, lifetime) = self.request(http).await?;
		*cached = Some(CachedToken {
			token: token.clone(),
			expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
		});
		Ok(token)
	}

	#[instrument(skip_all, fields(endpoint = %self.endpoint))]
	async fn request(&self, http: &Client) -> Result<(SecretString, Duration)> {
		let response = http
			.post(&self.endpoint)
			.form(&[
				("grant_type", "client_credentials"),
				("client_id", self.client_id.as_str()),
				("client_secret", self.client_secret.expose()),
				("scope", self.scope.as_str()),
			])
			.send()
			.await
			.map_err(DirectoryError::from_send)?;

		let status = response.status();
		let body = response.text().await.map_err(DirectoryError::from_send)?;
		if !status.is_success() {
			error!(status = status.as_u16(), "token request rejected");
			return Err(DirectoryError::Token {
				status: status.as_u16(),
				message: error_description(&body),
			});
		}

		let parsed: TokenResponse = serde_json::from_str(&body)
			.map_err(|e| DirectoryError::InvalidResponse(format!("token response: {e}")))?;
		debug!(expires_in = parsed.expires_in, "access token acquired");
		Ok((
			SecretString::new(parsed.access_token),
			Duration::from_secs(parsed.expires_in),
		))
	}
}

/// OAuth errors carry `error_description`; anything else goes through the
/// directory error reader.
fn error_description(body: &str) -> String {
	serde_json::from_str::<serde_json::Value>(body)
		.ok()
		.and_then(|v| v.get("error_description").and_then(|d| d.as_str()).map(str::to_string))
		.unwrap_or_else(|| error_message(body))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn oauth_error_description_is_preferred() {
		let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret"}"#;
		assert_eq!(error_description(body), "AADSTS7000215: Invalid client secret");
	}

	#[test]
	fn non_json_body_is_passed_through() {
		assert_eq!(error_description("Bad Gateway"), "Bad Gateway");
	}
}
