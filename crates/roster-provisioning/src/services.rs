// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator contracts consumed by the orchestrator.
//!
//! Transport clients live in their own crates and implement these traits;
//! tests implement them with in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use roster_common_secret::SecretString;
use roster_identity::ExistingIdentity;
use serde::{Deserialize, Serialize};

use crate::candidate::{DocumentType, RoleCategory};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
	pub message: String,
	/// The call hit its per-call timeout.
	pub timed_out: bool,
}

impl ServiceError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			timed_out: false,
		}
	}

	pub fn timeout(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			timed_out: true,
		}
	}
}

/// Account creation request for the directory.
#[derive(Debug, Clone)]
pub struct NewAccount {
	pub display_name: String,
	pub address: String,
	pub credential: SecretString,
}

impl NewAccount {
	/// Local part of the address.
	pub fn mail_nickname(&self) -> &str {
		self.address.split('@').next().unwrap_or(&self.address)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
	pub id: String,
}

/// Raw answer to a membership write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAssignment {
	Added,
	AlreadyMember,
	Rejected {
		status: Option<u16>,
		message: String,
	},
}

#[async_trait]
pub trait DirectoryService: Send + Sync {
	/// Every identity whose address is at `domain`.
	async fn list_identities(&self, domain: &str) -> Result<Vec<ExistingIdentity>, ServiceError>;

	/// Not idempotent: a retried call may create a second account.
	async fn create_account(&self, account: &NewAccount) -> Result<CreatedAccount, ServiceError>;

	async fn resolve_group_id(&self, name: &str) -> Result<Option<String>, ServiceError>;

	async fn assign_to_group(&self, account_id: &str, group_id: &str) -> GroupAssignment;
}

/// Person fields the companion application needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanionEntry {
	pub username: String,
	pub document_type: DocumentType,
	pub document_number: String,
	pub given_names: String,
	pub family_names: String,
	pub institutional_address: String,
	pub role: RoleCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum CompanionOutcome {
	Created,
	AlreadyExists,
	Failed(String),
}

#[async_trait]
pub trait WebAppService: Send + Sync {
	async fn authenticate(&self) -> Result<(), ServiceError>;

	async fn create_entry(&self, entry: &CompanionEntry) -> CompanionOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
	pub to: String,
	pub subject: String,
	pub html_body: String,
	pub text_body: String,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
	async fn send(&self, message: &OutgoingMessage) -> Result<(), ServiceError>;
}

/// Suspension point for every wait the pipeline performs.
#[async_trait]
pub trait Delay: Send + Sync {
	async fn sleep(&self, duration: Duration);
}

/// Real timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
	async fn sleep(&self, duration: Duration) {
		if !duration.is_zero() {
			tokio::time::sleep(duration).await;
		}
	}
}
