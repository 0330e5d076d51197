// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-based form client for the companion web application.
//!
//! Logs in once with the operator account, keeps the session cookie, and
//! submits the user creation form per member. Redirects are not followed: a
//! redirect after a form post means the server accepted it, a re-rendered
//! form means it did not.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client, Response, StatusCode};
use roster_common_secret::SecretString;
use roster_config::CompanionConfig;
use roster_provisioning::{CompanionEntry, CompanionOutcome, ServiceError, WebAppService};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CompanionError, Result};
use crate::form::{csrf_token, document_type_value, role_name, CSRF_FIELD};

pub struct CompanionClient {
	http: Client,
	base_url: String,
	login_path: String,
	create_path: String,
	username: String,
	password: SecretString,
	default_password: SecretString,
	default_birth_date: String,
	authenticated: RwLock<bool>,
}

impl CompanionClient {
	pub fn new(config: &CompanionConfig) -> Result<Self> {
		let http = Client::builder()
			.cookie_store(true)
			.redirect(redirect::Policy::none())
			.timeout(Duration::from_secs(config.request_timeout_secs))
			.user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self {
			http,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			login_path: config.login_path.clone(),
			create_path: config.create_path.clone(),
			username: config.username.clone(),
			password: config.password.clone(),
			default_password: config.default_password.clone(),
			default_birth_date: config.default_birth_date.clone(),
			authenticated: RwLock::new(false),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	/// Fetches a form page and returns its CSRF token, if any.
	async fn form_token(&self, path: &str) -> Result<Option<String>> {
		let response = self
			.http
			.get(self.url(path))
			.send()
			.await
			.map_err(CompanionError::from_send)?;
		let status = response.status();
		if !status.is_success() {
			return Err(CompanionError::UnexpectedStatus {
				status: status.as_u16(),
				path: path.to_string(),
			});
		}
		let body = response.text().await.map_err(CompanionError::from_send)?;
		Ok(csrf_token(&body))
	}

	#[instrument(skip(self), fields(user = %self.username))]
	pub async fn login(&self) -> Result<()> {
		let token = self.form_token(&self.login_path).await?;

		let mut fields: Vec<(&str, &str)> = vec![
			("username", self.username.as_str()),
			("password", self.password.expose()),
			("tyc", "on"),
		];
		if let Some(token) = token.as_deref() {
			fields.push((CSRF_FIELD, token));
		}

		let response = self
			.http
			.post(self.url(&self.login_path))
			.form(&fields)
			.send()
			.await
			.map_err(CompanionError::from_send)?;

		match redirect_target(&response) {
			Some(location) if !location.to_lowercase().contains("login") => {
				info!("companion application login succeeded");
				*self.authenticated.write().await = true;
				Ok(())
			}
			Some(location) => {
				error!(%location, "companion login redirected back to login page");
				Err(CompanionError::LoginRejected(
					"redirected back to the login page".to_string(),
				))
			}
			None => {
				let status = response.status();
				error!(status = status.as_u16(), "companion login was not accepted");
				Err(CompanionError::LoginRejected(format!(
					"login form returned status {}",
					status.as_u16()
				)))
			}
		}
	}

	#[instrument(skip(self, entry), fields(username = %entry.username))]
	pub async fn create_user(&self, entry: &CompanionEntry) -> Result<CompanionOutcome> {
		if !*self.authenticated.read().await {
			return Err(CompanionError::NotAuthenticated);
		}

		let token = self.form_token(&self.create_path).await?;
		let mut fields: Vec<(&str, &str)> = vec![
			("username", entry.username.as_str()),
			("identification_id", entry.document_number.as_str()),
			("type_document", document_type_value(entry.document_type)),
			("first_name", entry.given_names.as_str()),
			("last_name", entry.family_names.as_str()),
			("birth_date", self.default_birth_date.as_str()),
			("email", entry.institutional_address.as_str()),
			("password", self.default_password.expose()),
			("roles", role_name(&entry.role)),
			("enviar", "enviar"),
		];
		if let Some(token) = token.as_deref() {
			fields.push((CSRF_FIELD, token));
		}

		let response = self
			.http
			.post(self.url(&self.create_path))
			.form(&fields)
			.send()
			.await
			.map_err(CompanionError::from_send)?;

		let status = response.status();
		if redirect_target(&response).is_some() {
			debug!("form accepted");
			return Ok(CompanionOutcome::Created);
		}
		if status == StatusCode::OK {
			warn!("form re-rendered, member already exists");
			return Ok(CompanionOutcome::AlreadyExists);
		}
		Err(CompanionError::UnexpectedStatus {
			status: status.as_u16(),
			path: self.create_path.clone(),
		})
	}
}

fn redirect_target(response: &Response) -> Option<String> {
	if !response.status().is_redirection() {
		return None;
	}
	response
		.headers()
		.get(header::LOCATION)
		.and_then(|v| v.to_str().ok())
		.map(str::to_string)
}

#[async_trait]
impl WebAppService for CompanionClient {
	async fn authenticate(&self) -> std::result::Result<(), ServiceError> {
		self.login().await.map_err(ServiceError::from)
	}

	async fn create_entry(&self, entry: &CompanionEntry) -> CompanionOutcome {
		match self.create_user(entry).await {
			Ok(outcome) => outcome,
			Err(e) => CompanionOutcome::Failed(e.to_string()),
		}
	}
}
