// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON audit output for a finished batch.
//!
//! Two files per run, written to the configured output directory:
//! `records_<ts>.json` (one entry per candidate) and `summary_<ts>.json`.
//! The records file carries temporary credentials in clear text; it is the
//! operator's hand-off for members who did not receive a welcome message.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::candidate::{DocumentType, RequestType, RoleCategory};
use crate::error::{ProvisioningError, Result};
use crate::outcome::{BatchOutcome, CompanionSummary, FollowUp, NotificationSummary};
use crate::record::{NotificationOutcome, ProvisionedRecord, RecordState, Resolution, StageError};
use crate::services::CompanionOutcome;

/// Timestamp format shared by both report file names.
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Serialize)]
pub struct RecordReport<'a> {
	pub request_type: RequestType,
	pub given_names: &'a str,
	pub family_names: &'a str,
	pub document_type: DocumentType,
	pub document_number: &'a str,
	pub personal_email: &'a str,
	pub role: &'a RoleCategory,
	pub program: &'a str,
	pub resolution: &'a Resolution,
	pub state: RecordState,
	pub institutional_address: Option<&'a str>,
	pub account_id: Option<&'a str>,
	/// Only for records whose directory account exists.
	pub temporary_credential: Option<&'a str>,
	pub group_name: Option<&'a str>,
	pub directory_created: bool,
	pub group_assigned: bool,
	pub companion_succeeded: Option<bool>,
	pub notification_sent: Option<bool>,
	pub companion: Option<&'a CompanionOutcome>,
	pub notification: Option<&'a NotificationOutcome>,
	pub errors: &'a [StageError],
}

impl<'a> From<&'a ProvisionedRecord> for RecordReport<'a> {
	fn from(record: &'a ProvisionedRecord) -> Self {
		let candidate = &record.candidate;
		Self {
			request_type: candidate.request_type,
			given_names: &candidate.given_names,
			family_names: &candidate.family_names,
			document_type: candidate.document_type,
			document_number: &candidate.document_number,
			personal_email: &candidate.personal_email,
			role: &candidate.role,
			program: &candidate.program,
			resolution: &record.resolution,
			state: record.state,
			institutional_address: record.institutional_address.as_deref(),
			account_id: record.account_id.as_deref(),
			temporary_credential: record
				.credential
				.as_ref()
				.filter(|_| record.directory_created())
				.map(|c| c.expose()),
			group_name: record.group_name.as_deref(),
			directory_created: record.directory_created(),
			group_assigned: record.group_assigned(),
			companion_succeeded: record.companion_succeeded(),
			notification_sent: record.notification_sent(),
			companion: record.companion.as_ref(),
			notification: record.notification.as_ref(),
			errors: &record.errors,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct Counts {
	pub total: usize,
	pub new: usize,
	pub existing: usize,
	pub ambiguous: usize,
	pub fully_provisioned: usize,
	pub provisioned_without_group: usize,
	pub failed: usize,
	pub planned: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordRef {
	pub display_name: String,
	pub institutional_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FailedRef {
	pub display_name: String,
	pub institutional_address: Option<String>,
	pub errors: Vec<StageError>,
}

#[derive(Debug, Serialize)]
pub struct AmbiguousRef {
	pub display_name: String,
	pub candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
	pub generated_at: DateTime<Utc>,
	pub dry_run: bool,
	pub counts: Counts,
	pub fully_provisioned: Vec<RecordRef>,
	pub provisioned_without_group: Vec<RecordRef>,
	pub failed: Vec<FailedRef>,
	pub ambiguous: Vec<AmbiguousRef>,
	pub manual_follow_up: Vec<FollowUp>,
	pub companion: Option<CompanionSummary>,
	pub notification: Option<NotificationSummary>,
}

impl BatchSummary {
	pub fn from_outcome(outcome: &BatchOutcome, generated_at: DateTime<Utc>) -> Self {
		let refs = |indices: &[usize]| -> Vec<RecordRef> {
			indices
				.iter()
				.filter_map(|&i| outcome.records.get(i))
				.map(|r| RecordRef {
					display_name: r.display_name(),
					institutional_address: r.institutional_address.clone(),
				})
				.collect()
		};

		Self {
			generated_at,
			dry_run: outcome.dry_run,
			counts: Counts {
				total: outcome.records.len(),
				new: outcome.new_count(),
				existing: outcome.existing.len(),
				ambiguous: outcome.ambiguous.len(),
				fully_provisioned: outcome.fully_provisioned.len(),
				provisioned_without_group: outcome.provisioned_without_group.len(),
				failed: outcome.failed.len(),
				planned: outcome.planned.len(),
			},
			fully_provisioned: refs(&outcome.fully_provisioned),
			provisioned_without_group: refs(&outcome.provisioned_without_group),
			failed: outcome
				.failed
				.iter()
				.filter_map(|&i| outcome.records.get(i))
				.map(|r| FailedRef {
					display_name: r.display_name(),
					institutional_address: r.institutional_address.clone(),
					errors: r.errors.clone(),
				})
				.collect(),
			ambiguous: outcome
				.ambiguous
				.iter()
				.filter_map(|&i| outcome.records.get(i))
				.map(|r| AmbiguousRef {
					display_name: r.display_name(),
					candidates: match &r.resolution {
						Resolution::Ambiguous { candidates } => candidates.clone(),
						_ => Vec::new(),
					},
				})
				.collect(),
			manual_follow_up: outcome.follow_ups(),
			companion: outcome.companion.clone(),
			notification: outcome.notification.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
	pub records: PathBuf,
	pub summary: PathBuf,
}

/// Writes both report files, creating `dir` if needed.
pub fn write_reports(outcome: &BatchOutcome, dir: &Path, generated_at: DateTime<Utc>) -> Result<ReportPaths> {
	std::fs::create_dir_all(dir).map_err(|e| ProvisioningError::ReportWrite {
		path: dir.to_path_buf(),
		source: e,
	})?;

	let stamp = generated_at.format(REPORT_TIMESTAMP_FORMAT).to_string();
	let paths = ReportPaths {
		records: dir.join(format!("records_{stamp}.json")),
		summary: dir.join(format!("summary_{stamp}.json")),
	};

	let records: Vec<RecordReport<'_>> = outcome.records.iter().map(RecordReport::from).collect();
	write_json(&paths.records, &records)?;
	write_json(&paths.summary, &BatchSummary::from_outcome(outcome, generated_at))?;

	info!(
		records = %paths.records.display(),
		summary = %paths.summary.display(),
		"reports written"
	);
	Ok(paths)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
	let body = serde_json::to_string_pretty(value)?;
	std::fs::write(path, body).map_err(|e| ProvisioningError::ReportWrite {
		path: path.to_path_buf(),
		source: e,
	})
}
