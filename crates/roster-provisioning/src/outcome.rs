// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;

use crate::record::{NotificationOutcome, ProvisionedRecord, RecordState, Resolution, StageError};
use crate::services::CompanionOutcome;

/// Companion application stage results, as record indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanionSummary {
	pub attempted: usize,
	pub created: Vec<usize>,
	pub already_exists: Vec<usize>,
	pub failed: Vec<usize>,
	/// The stage could not log in; every eligible record was marked failed.
	pub authentication_failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSummary {
	pub attempted: usize,
	pub sent: Vec<usize>,
	pub failed: Vec<usize>,
}

/// Everything a batch produced.
///
/// Lists hold indices into `records`. After a live run every record with
/// resolution `new` sits in exactly one of `fully_provisioned`,
/// `provisioned_without_group` and `failed`.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
	pub records: Vec<ProvisionedRecord>,
	pub fully_provisioned: Vec<usize>,
	pub provisioned_without_group: Vec<usize>,
	pub failed: Vec<usize>,
	pub existing: Vec<usize>,
	pub ambiguous: Vec<usize>,
	pub planned: Vec<usize>,
	pub companion: Option<CompanionSummary>,
	pub notification: Option<NotificationSummary>,
	pub dry_run: bool,
}

/// A directory account created without its group, for manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUp {
	pub display_name: String,
	pub address: String,
	pub account_id: String,
	pub pending_group: String,
}

impl BatchOutcome {
	pub fn new_count(&self) -> usize {
		self.records.iter().filter(|r| r.is_new()).count()
	}

	/// Sorts a record into its list according to its current state.
	pub(crate) fn classify(&mut self, index: usize) {
		let Some(record) = self.records.get(index) else {
			return;
		};
		let list = match (&record.resolution, record.state) {
			(Resolution::Existing, _) => &mut self.existing,
			(Resolution::Ambiguous { .. }, _) => &mut self.ambiguous,
			(Resolution::New, RecordState::GroupAssigned) => &mut self.fully_provisioned,
			(Resolution::New, RecordState::GroupAssignmentIncomplete) => {
				&mut self.provisioned_without_group
			}
			(Resolution::New, RecordState::Failed) => &mut self.failed,
			(Resolution::New, RecordState::Planned) => &mut self.planned,
			(Resolution::New, _) => return,
		};
		list.push(index);
	}

	/// The new/provisioned partition holds: the three lists are disjoint and
	/// together cover every new record.
	pub fn partition_holds(&self) -> bool {
		let mut seen = vec![false; self.records.len()];
		for &index in self
			.fully_provisioned
			.iter()
			.chain(&self.provisioned_without_group)
			.chain(&self.failed)
		{
			match seen.get_mut(index) {
				Some(slot) if !*slot => *slot = true,
				_ => return false,
			}
		}
		let covered = self.fully_provisioned.len() + self.provisioned_without_group.len() + self.failed.len();
		covered == self.new_count()
			&& self
				.records
				.iter()
				.enumerate()
				.filter(|(_, r)| r.is_new())
				.all(|(i, _)| seen[i])
	}

	pub fn follow_ups(&self) -> Vec<FollowUp> {
		self.provisioned_without_group
			.iter()
			.filter_map(|&i| self.records.get(i))
			.map(|record| FollowUp {
				display_name: record.display_name(),
				address: record.institutional_address.clone().unwrap_or_default(),
				account_id: record.account_id.clone().unwrap_or_default(),
				pending_group: record.group_name.clone().unwrap_or_default(),
			})
			.collect()
	}

	/// Records whose directory account exists: input for the companion and
	/// notification stages.
	pub fn accounts_created(&self) -> impl Iterator<Item = usize> + '_ {
		self.records
			.iter()
			.enumerate()
			.filter(|(_, r)| r.directory_created())
			.map(|(i, _)| i)
	}

	pub(crate) fn record_companion(&mut self, index: usize, outcome: CompanionOutcome) {
		let summary = self.companion.get_or_insert_with(CompanionSummary::default);
		summary.attempted += 1;
		match &outcome {
			CompanionOutcome::Created => summary.created.push(index),
			CompanionOutcome::AlreadyExists => summary.already_exists.push(index),
			CompanionOutcome::Failed(_) => summary.failed.push(index),
		}
		if let Some(record) = self.records.get_mut(index) {
			if let CompanionOutcome::Failed(message) = &outcome {
				record.errors.push(StageError::Companion(message.clone()));
			}
			record.companion = Some(outcome);
		}
	}

	pub(crate) fn record_notification(&mut self, index: usize, outcome: NotificationOutcome) {
		let summary = self.notification.get_or_insert_with(NotificationSummary::default);
		summary.attempted += 1;
		match &outcome {
			NotificationOutcome::Sent => summary.sent.push(index),
			NotificationOutcome::Failed(_) => summary.failed.push(index),
		}
		if let Some(record) = self.records.get_mut(index) {
			if let NotificationOutcome::Failed(message) = &outcome {
				record.errors.push(StageError::Notification(message.clone()));
			}
			record.notification = Some(outcome);
		}
	}
}
