// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Graph-style directory client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use roster_config::DirectoryConfig;
use roster_identity::ExistingIdentity;
use roster_provisioning::{
	is_already_member_message, CreatedAccount, DirectoryService, GroupAssignment, NewAccount,
	ServiceError,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{DirectoryError, Result};
use crate::token::TokenProvider;
use crate::types::{
	error_message, CreateUserRequest, CreatedUser, GraphGroup, GraphUser, MemberReference, Page,
	PasswordProfile,
};

const USER_PAGE_SIZE: &str = "999";
const USER_FIELDS: &str = "mail,userPrincipalName,displayName";

pub struct GraphDirectoryClient {
	http: Client,
	base_url: String,
	tokens: TokenProvider,
}

impl GraphDirectoryClient {
	pub fn new(config: &DirectoryConfig) -> Result<Self> {
		let (Some(client_id), Some(client_secret), Some(token_endpoint)) = (
			config.client_id.clone(),
			config.client_secret.clone(),
			config.token_endpoint(),
		) else {
			return Err(DirectoryError::NotConfigured(
				"tenant_id, client_id and client_secret are required".to_string(),
			));
		};

		let http = Client::builder()
			.timeout(Duration::from_secs(config.request_timeout_secs))
			.user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self {
			http,
			base_url: config.api_base_url.trim_end_matches('/').to_string(),
			tokens: TokenProvider::new(token_endpoint, client_id, client_secret),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	async fn bearer(&self) -> Result<String> {
		let token = self.tokens.token(&self.http).await?;
		Ok(format!("Bearer {}", token.expose()))
	}

	/// Every user at `domain`, following pagination links to the end.
	#[instrument(skip(self))]
	pub async fn list_users(&self, domain: &str) -> Result<Vec<ExistingIdentity>> {
		let suffix = format!("@{}", domain.trim_start_matches('@').to_lowercase());
		let mut identities = Vec::new();
		let mut pages = 0usize;

		let first = self
			.http
			.get(self.url("users"))
			.query(&[("$select", USER_FIELDS), ("$top", USER_PAGE_SIZE)]);
		let mut request = Some(first);

		while let Some(builder) = request.take() {
			let response = builder
				.header(reqwest::header::AUTHORIZATION, self.bearer().await?)
				.send()
				.await
				.map_err(DirectoryError::from_send)?;
			let page: Page<GraphUser> = read_json(response).await?;
			pages += 1;

			identities.extend(page.value.iter().filter_map(|user| user.to_identity(&suffix)));

			request = page.next_link.map(|next| self.http.get(next));
		}

		info!(pages, identities = identities.len(), "directory users listed");
		Ok(identities)
	}

	#[instrument(skip(self, account), fields(address = %account.address))]
	pub async fn create_user(&self, account: &NewAccount) -> Result<CreatedAccount> {
		let body = CreateUserRequest {
			account_enabled: true,
			display_name: &account.display_name,
			mail_nickname: account.mail_nickname(),
			user_principal_name: &account.address,
			mail: &account.address,
			password_profile: PasswordProfile {
				force_change_password_next_sign_in: true,
				password: account.credential.expose(),
			},
		};

		let response = self
			.http
			.post(self.url("users"))
			.header(reqwest::header::AUTHORIZATION, self.bearer().await?)
			.json(&body)
			.send()
			.await
			.map_err(DirectoryError::from_send)?;

		let status = response.status();
		if status != StatusCode::CREATED {
			let text = response.text().await.unwrap_or_default();
			error!(status = status.as_u16(), "user creation rejected");
			return Err(DirectoryError::Api {
				status: status.as_u16(),
				message: error_message(&text),
			});
		}

		let created: CreatedUser = read_json_body(response).await?;
		debug!(id = %created.id, "user created");
		Ok(CreatedAccount { id: created.id })
	}

	/// Group id by exact display name.
	#[instrument(skip(self))]
	pub async fn find_group(&self, name: &str) -> Result<Option<String>> {
		let filter = format!("displayName eq '{}'", name.replace('\'', "''"));
		let response = self
			.http
			.get(self.url("groups"))
			.query(&[("$filter", filter.as_str()), ("$select", "id,displayName")])
			.header(reqwest::header::AUTHORIZATION, self.bearer().await?)
			.send()
			.await
			.map_err(DirectoryError::from_send)?;

		let page: Page<GraphGroup> = read_json(response).await?;
		if page.value.len() > 1 {
			warn!(group = %name, matches = page.value.len(), "several groups share this name, using the first");
		}
		Ok(page.value.into_iter().next().map(|g| g.id))
	}

	#[instrument(skip(self))]
	pub async fn add_member(&self, account_id: &str, group_id: &str) -> GroupAssignment {
		match self.try_add_member(account_id, group_id).await {
			Ok(assignment) => assignment,
			Err(e) => GroupAssignment::Rejected {
				status: None,
				message: e.to_string(),
			},
		}
	}

	async fn try_add_member(&self, account_id: &str, group_id: &str) -> Result<GroupAssignment> {
		let body = MemberReference {
			odata_id: self.url(&format!("directoryObjects/{account_id}")),
		};
		let response = self
			.http
			.post(self.url(&format!("groups/{group_id}/members/$ref")))
			.header(reqwest::header::AUTHORIZATION, self.bearer().await?)
			.json(&body)
			.send()
			.await
			.map_err(DirectoryError::from_send)?;

		let status = response.status();
		if status == StatusCode::NO_CONTENT {
			return Ok(GroupAssignment::Added);
		}

		let text = response.text().await.unwrap_or_default();
		let message = error_message(&text);
		if status == StatusCode::BAD_REQUEST && is_already_member_message(&message) {
			debug!("account already a member");
			return Ok(GroupAssignment::AlreadyMember);
		}
		Ok(GroupAssignment::Rejected {
			status: Some(status.as_u16()),
			message,
		})
	}
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
	let status = response.status();
	if !status.is_success() {
		let text = response.text().await.unwrap_or_default();
		error!(status = status.as_u16(), "directory request failed");
		return Err(DirectoryError::Api {
			status: status.as_u16(),
			message: error_message(&text),
		});
	}
	read_json_body(response).await
}

async fn read_json_body<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
	let text = response.text().await.map_err(DirectoryError::from_send)?;
	serde_json::from_str(&text).map_err(|e| DirectoryError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl DirectoryService for GraphDirectoryClient {
	async fn list_identities(&self, domain: &str) -> std::result::Result<Vec<ExistingIdentity>, ServiceError> {
		self.list_users(domain).await.map_err(ServiceError::from)
	}

	async fn create_account(&self, account: &NewAccount) -> std::result::Result<CreatedAccount, ServiceError> {
		self.create_user(account).await.map_err(ServiceError::from)
	}

	async fn resolve_group_id(&self, name: &str) -> std::result::Result<Option<String>, ServiceError> {
		self.find_group(name).await.map_err(ServiceError::from)
	}

	async fn assign_to_group(&self, account_id: &str, group_id: &str) -> GroupAssignment {
		self.add_member(account_id, group_id).await
	}
}
