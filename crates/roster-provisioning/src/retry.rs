// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded fixed-delay retry for group membership writes.
//!
//! The directory is eventually consistent: a membership write for an account
//! created seconds ago can be rejected until the account has propagated. The
//! write itself is idempotent, so it is safe to repeat.

use std::time::Duration;

use tracing::{info, warn};

use crate::services::{Delay, DirectoryService, GroupAssignment};

/// Phrasings the directory uses to reject a write for an existing member.
/// Matched case-insensitively as substrings; "already exist" also covers
/// "already exists".
const ALREADY_MEMBER_PHRASES: &[&str] = &[
	"already exist",
	"already a member",
	"already added",
	"is already in the group",
];

/// True when a rejection message means the membership is already in place.
pub fn is_already_member_message(text: &str) -> bool {
	let lowered = text.to_lowercase();
	ALREADY_MEMBER_PHRASES
		.iter()
		.any(|phrase| lowered.contains(phrase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts, including the first.
	pub max_attempts: u32,
	pub delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			delay: Duration::from_secs(5),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentResult {
	Assigned { attempts: u32 },
	Exhausted { attempts: u32, last_error: String },
}

impl AssignmentResult {
	pub fn succeeded(&self) -> bool {
		matches!(self, Self::Assigned { .. })
	}
}

pub struct GroupAssignmentRetrier<'a> {
	directory: &'a dyn DirectoryService,
	delay: &'a dyn Delay,
	policy: RetryPolicy,
}

impl<'a> GroupAssignmentRetrier<'a> {
	pub fn new(directory: &'a dyn DirectoryService, delay: &'a dyn Delay, policy: RetryPolicy) -> Self {
		Self {
			directory,
			delay,
			policy,
		}
	}

	/// Returns true on the first successful attempt, false once every attempt
	/// has been used.
	pub async fn assign(&self, account_id: &str, group_id: &str, group_name: &str) -> bool {
		self.assign_detailed(account_id, group_id, group_name)
			.await
			.succeeded()
	}

	#[tracing::instrument(skip(self), fields(max_attempts = self.policy.max_attempts))]
	pub async fn assign_detailed(
		&self,
		account_id: &str,
		group_id: &str,
		group_name: &str,
	) -> AssignmentResult {
		let max_attempts = self.policy.max_attempts.max(1);
		let mut last_error = String::new();

		for attempt in 1..=max_attempts {
			match self.directory.assign_to_group(account_id, group_id).await {
				GroupAssignment::Added => {
					info!(attempt, "account added to group");
					return AssignmentResult::Assigned { attempts: attempt };
				}
				GroupAssignment::AlreadyMember => {
					info!(attempt, "account already in group");
					return AssignmentResult::Assigned { attempts: attempt };
				}
				GroupAssignment::Rejected { message, .. } if is_already_member_message(&message) => {
					info!(attempt, "account already in group");
					return AssignmentResult::Assigned { attempts: attempt };
				}
				GroupAssignment::Rejected { status, message } => {
					last_error = match status {
						Some(code) => format!("status {code}: {message}"),
						None => message,
					};
				}
			}

			if attempt < max_attempts {
				warn!(
					attempt,
					max_attempts,
					delay_ms = self.policy.delay.as_millis() as u64,
					error = %last_error,
					"group assignment failed, retrying"
				);
				self.delay.sleep(self.policy.delay).await;
			}
		}

		warn!(
			attempts = max_attempts,
			error = %last_error,
			"group assignment attempts exhausted"
		);
		AssignmentResult::Exhausted {
			attempts: max_attempts,
			last_error,
		}
	}
}
