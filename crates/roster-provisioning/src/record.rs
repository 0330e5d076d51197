// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use roster_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::candidate::Candidate;
use crate::services::CompanionOutcome;

/// Whether a candidate is new, already provisioned, or needs an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
	New,
	Existing,
	/// Several existing identities share the candidate's normalized name.
	Ambiguous { candidates: Vec<String> },
}

impl std::fmt::Display for Resolution {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::New => write!(f, "new"),
			Self::Existing => write!(f, "existing"),
			Self::Ambiguous { .. } => write!(f, "ambiguous"),
		}
	}
}

/// Per-record provisioning state.
///
/// ```text
/// pending -> directory_created -> group_pending -> group_assigned
///                                               -> group_assignment_incomplete
/// pending -> failed
/// pending -> planned            (dry run)
/// ```
///
/// Existing and ambiguous records sit in `skipped` from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
	Pending,
	DirectoryCreated,
	GroupPending,
	GroupAssigned,
	GroupAssignmentIncomplete,
	Failed,
	Planned,
	Skipped,
}

impl RecordState {
	pub fn is_terminal(self) -> bool {
		matches!(
			self,
			Self::GroupAssigned
				| Self::GroupAssignmentIncomplete
				| Self::Failed
				| Self::Planned
				| Self::Skipped
		)
	}

	pub fn can_advance_to(self, next: RecordState) -> bool {
		use RecordState::*;
		matches!(
			(self, next),
			(Pending, DirectoryCreated)
				| (Pending, Failed)
				| (Pending, Planned)
				| (DirectoryCreated, GroupPending)
				| (GroupPending, GroupAssigned)
				| (GroupPending, GroupAssignmentIncomplete)
		)
	}

	/// The directory account exists for this record.
	pub fn has_account(self) -> bool {
		matches!(
			self,
			Self::DirectoryCreated
				| Self::GroupPending
				| Self::GroupAssigned
				| Self::GroupAssignmentIncomplete
		)
	}
}

impl std::fmt::Display for RecordState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Self::Pending => "pending",
			Self::DirectoryCreated => "directory_created",
			Self::GroupPending => "group_pending",
			Self::GroupAssigned => "group_assigned",
			Self::GroupAssignmentIncomplete => "group_assignment_incomplete",
			Self::Failed => "failed",
			Self::Planned => "planned",
			Self::Skipped => "skipped",
		};
		f.write_str(s)
	}
}

/// Failure captured on a record. Never propagated past the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "stage", content = "message", rename_all = "snake_case")]
pub enum StageError {
	#[error("address allocation failed: {0}")]
	Allocation(String),
	#[error("directory account creation failed: {0}")]
	DirectoryCreation(String),
	#[error("group assignment failed: {0}")]
	GroupAssignment(String),
	#[error("companion account creation failed: {0}")]
	Companion(String),
	#[error("welcome message failed: {0}")]
	Notification(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum NotificationOutcome {
	Sent,
	Failed(String),
}

/// A candidate and everything that happened to it. Mutated in place as
/// stages complete; the unit of audit.
#[derive(Debug, Clone)]
pub struct ProvisionedRecord {
	pub candidate: Candidate,
	pub resolution: Resolution,
	pub institutional_address: Option<String>,
	pub account_id: Option<String>,
	pub credential: Option<SecretString>,
	pub group_name: Option<String>,
	pub state: RecordState,
	pub companion: Option<CompanionOutcome>,
	pub notification: Option<NotificationOutcome>,
	pub errors: Vec<StageError>,
}

impl ProvisionedRecord {
	pub fn new(candidate: Candidate, resolution: Resolution) -> Self {
		let state = match resolution {
			Resolution::New => RecordState::Pending,
			Resolution::Existing | Resolution::Ambiguous { .. } => RecordState::Skipped,
		};
		Self {
			candidate,
			resolution,
			institutional_address: None,
			account_id: None,
			credential: None,
			group_name: None,
			state,
			companion: None,
			notification: None,
			errors: Vec::new(),
		}
	}

	pub fn is_new(&self) -> bool {
		self.resolution == Resolution::New
	}

	pub fn display_name(&self) -> String {
		self.candidate.display_name()
	}

	/// Moves to `next` if the transition is legal. Illegal transitions are
	/// logged and leave the record unchanged.
	pub fn advance(&mut self, next: RecordState) -> bool {
		if !self.state.can_advance_to(next) {
			error!(
				from = %self.state,
				to = %next,
				address = ?self.institutional_address,
				"illegal record state transition"
			);
			return false;
		}
		self.state = next;
		true
	}

	pub fn fail(&mut self, error: StageError) {
		self.errors.push(error);
		self.advance(RecordState::Failed);
	}

	pub fn directory_created(&self) -> bool {
		self.state.has_account()
	}

	pub fn group_assigned(&self) -> bool {
		self.state == RecordState::GroupAssigned
	}

	pub fn companion_succeeded(&self) -> Option<bool> {
		self.companion
			.as_ref()
			.map(|c| !matches!(c, CompanionOutcome::Failed(_)))
	}

	pub fn notification_sent(&self) -> Option<bool> {
		self.notification
			.as_ref()
			.map(|n| *n == NotificationOutcome::Sent)
	}
}
