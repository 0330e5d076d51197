// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory-side provisioning of a batch.
//!
//! A batch runs in two steps so an operator can review the new/existing split
//! before anything is written:
//!
//! 1. [`ProvisioningOrchestrator::plan`] resolves every candidate against the
//!    roster and, for new ones, allocates an address, a temporary credential
//!    and a group name. Nothing external is touched.
//! 2. [`ProvisioningOrchestrator::provision`] walks the planned records in
//!    input order: create the account, wait for propagation, resolve the group
//!    id, assign with retry. One record at a time.
//!
//! Stage failures are captured on the record and never abort the batch.

use std::sync::Arc;
use std::time::Duration;

use roster_config::ProvisioningConfig;
use roster_identity::MatchOutcome;
use tracing::{error, info, instrument, warn};

use crate::candidate::Candidate;
use crate::context::BatchContext;
use crate::credential::CredentialGenerator;
use crate::error::{ProvisioningError, Result};
use crate::groups::GroupMapping;
use crate::outcome::BatchOutcome;
use crate::record::{ProvisionedRecord, RecordState, Resolution, StageError};
use crate::retry::{AssignmentResult, GroupAssignmentRetrier, RetryPolicy};
use crate::services::{Delay, DirectoryService, NewAccount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
	pub propagation_delay: Duration,
	pub inter_record_delay: Duration,
}

impl From<&ProvisioningConfig> for Pacing {
	fn from(config: &ProvisioningConfig) -> Self {
		Self {
			propagation_delay: config.propagation_delay,
			inter_record_delay: config.inter_record_delay,
		}
	}
}

pub struct ProvisioningOrchestrator {
	directory: Arc<dyn DirectoryService>,
	delay: Arc<dyn Delay>,
	pacing: Pacing,
	retry: RetryPolicy,
	credentials: CredentialGenerator,
	groups: GroupMapping,
}

impl ProvisioningOrchestrator {
	pub fn new(
		directory: Arc<dyn DirectoryService>,
		delay: Arc<dyn Delay>,
		config: &ProvisioningConfig,
	) -> Result<Self> {
		Ok(Self {
			directory,
			delay,
			pacing: Pacing::from(config),
			retry: RetryPolicy {
				max_attempts: config.group_retry_attempts,
				delay: config.group_retry_delay,
			},
			credentials: CredentialGenerator::new(config.credential_length)?,
			groups: GroupMapping::from_config(config),
		})
	}

	/// Loads the directory roster and opens a batch against it.
	#[instrument(skip(self))]
	pub async fn begin_batch(&self, domain: &str, dry_run: bool) -> Result<BatchContext> {
		let roster = self
			.directory
			.list_identities(domain)
			.await
			.map_err(ProvisioningError::RosterUnavailable)?;
		info!(identities = roster.len(), "directory roster loaded");
		Ok(BatchContext::new(domain, &roster, dry_run))
	}

	/// Resolves and allocates for every candidate, in input order.
	pub fn plan(&self, ctx: &mut BatchContext, candidates: Vec<Candidate>) -> Vec<ProvisionedRecord> {
		let records: Vec<ProvisionedRecord> = candidates
			.into_iter()
			.map(|candidate| self.plan_one(ctx, candidate))
			.collect();

		let new = records.iter().filter(|r| r.is_new()).count();
		let ambiguous = records
			.iter()
			.filter(|r| matches!(r.resolution, Resolution::Ambiguous { .. }))
			.count();
		info!(
			total = records.len(),
			new,
			existing = records.len() - new - ambiguous,
			ambiguous,
			"batch planned"
		);
		records
	}

	fn plan_one(&self, ctx: &mut BatchContext, candidate: Candidate) -> ProvisionedRecord {
		let outcome = ctx
			.index
			.resolve_detailed(&candidate.given_names, &candidate.family_names);

		match outcome {
			MatchOutcome::Existing(address) => {
				info!(name = %candidate.display_name(), %address, "candidate already provisioned");
				let mut record = ProvisionedRecord::new(candidate, Resolution::Existing);
				record.institutional_address = Some(address);
				record
			}
			MatchOutcome::Ambiguous(candidates) => {
				warn!(
					name = %candidate.display_name(),
					matches = ?candidates,
					"several existing identities share this name, operator review required"
				);
				ProvisionedRecord::new(candidate, Resolution::Ambiguous { candidates })
			}
			MatchOutcome::New => {
				let group = self.groups.group_for(&candidate.role).to_string();
				let tokens = candidate.name_tokens();
				let allocated =
					ctx.index
						.allocate(tokens.given_first, tokens.family_first, tokens.family_second);

				let mut record = ProvisionedRecord::new(candidate, Resolution::New);
				record.group_name = Some(group);
				match allocated {
					Ok(address) => {
						info!(name = %record.display_name(), %address, "address allocated");
						record.institutional_address = Some(address);
						record.credential = Some(self.credentials.generate());
					}
					Err(e) => {
						error!(name = %record.display_name(), error = %e, "address allocation failed");
						record.fail(StageError::Allocation(e.to_string()));
					}
				}
				record
			}
		}
	}

	/// Runs the directory stages for every pending record. In a dry run the
	/// pending records are only marked `planned`.
	#[instrument(skip_all, fields(records = records.len(), dry_run = ctx.is_dry_run()))]
	pub async fn provision(&self, ctx: &mut BatchContext, records: Vec<ProvisionedRecord>) -> BatchOutcome {
		let mut outcome = BatchOutcome {
			records,
			dry_run: ctx.is_dry_run(),
			..Default::default()
		};

		let mut provisioned_any = false;
		for index in 0..outcome.records.len() {
			let record = &mut outcome.records[index];
			if record.state == RecordState::Pending {
				if ctx.is_dry_run() {
					record.advance(RecordState::Planned);
				} else {
					if provisioned_any {
						self.delay.sleep(self.pacing.inter_record_delay).await;
					}
					provisioned_any = true;
					self.provision_record(ctx, record).await;
				}
			}
			outcome.classify(index);
		}

		info!(
			fully_provisioned = outcome.fully_provisioned.len(),
			without_group = outcome.provisioned_without_group.len(),
			failed = outcome.failed.len(),
			existing = outcome.existing.len(),
			ambiguous = outcome.ambiguous.len(),
			planned = outcome.planned.len(),
			"directory provisioning finished"
		);
		if !outcome.dry_run && !outcome.partition_holds() {
			error!("new records are not partitioned across provisioned, incomplete and failed");
		}
		outcome
	}

	/// Plan and provision in one call, without an operator review in between.
	pub async fn run(&self, ctx: &mut BatchContext, candidates: Vec<Candidate>) -> BatchOutcome {
		let records = self.plan(ctx, candidates);
		self.provision(ctx, records).await
	}

	#[instrument(skip_all, fields(address = ?record.institutional_address))]
	async fn provision_record(&self, ctx: &mut BatchContext, record: &mut ProvisionedRecord) {
		let (Some(address), Some(credential)) =
			(record.institutional_address.clone(), record.credential.clone())
		else {
			record.fail(StageError::DirectoryCreation(
				"record has no allocated address".to_string(),
			));
			return;
		};

		let account = NewAccount {
			display_name: record.display_name(),
			address,
			credential,
		};
		match self.directory.create_account(&account).await {
			Ok(created) => {
				info!(account_id = %created.id, "directory account created");
				record.account_id = Some(created.id);
				record.advance(RecordState::DirectoryCreated);
			}
			Err(e) => {
				let message = if e.timed_out {
					format!("timed out: {e}")
				} else {
					e.to_string()
				};
				error!(error = %message, "directory account creation failed");
				record.fail(StageError::DirectoryCreation(message));
				return;
			}
		}

		info!(
			delay_secs = self.pacing.propagation_delay.as_secs(),
			"waiting for directory propagation"
		);
		self.delay.sleep(self.pacing.propagation_delay).await;
		record.advance(RecordState::GroupPending);

		let group_name = record.group_name.clone().unwrap_or_else(|| {
			self.groups.group_for(&record.candidate.role).to_string()
		});
		let group_id = match ctx.group_id(self.directory.as_ref(), &group_name).await {
			Ok(Some(id)) => id,
			Ok(None) => {
				self.leave_without_group(record, format!("group '{group_name}' not found"));
				return;
			}
			Err(message) => {
				self.leave_without_group(
					record,
					format!("lookup of group '{group_name}' failed: {message}"),
				);
				return;
			}
		};

		let account_id = record.account_id.clone().unwrap_or_default();
		let retrier = GroupAssignmentRetrier::new(self.directory.as_ref(), self.delay.as_ref(), self.retry);
		match retrier.assign_detailed(&account_id, &group_id, &group_name).await {
			AssignmentResult::Assigned { .. } => {
				info!(group = %group_name, "account assigned to group");
				record.advance(RecordState::GroupAssigned);
			}
			AssignmentResult::Exhausted { attempts, last_error } => {
				self.leave_without_group(
					record,
					format!("gave up after {attempts} attempts: {last_error}"),
				);
			}
		}
	}

	/// The account stays; it is listed for manual follow-up.
	fn leave_without_group(&self, record: &mut ProvisionedRecord, message: String) {
		warn!(
			address = ?record.institutional_address,
			group = ?record.group_name,
			error = %message,
			"account created without group, manual follow-up required"
		);
		record.errors.push(StageError::GroupAssignment(message));
		record.advance(RecordState::GroupAssignmentIncomplete);
	}
}
