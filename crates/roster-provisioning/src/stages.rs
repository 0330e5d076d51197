// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch-level stages that run after directory provisioning.
//!
//! Both only touch records whose directory account was actually created, and
//! neither changes a record's directory-side state.

use std::time::Duration;

use roster_common_secret::SecretString;
use tracing::{error, info, instrument, warn};

use crate::error::{ProvisioningError, Result};
use crate::outcome::BatchOutcome;
use crate::record::NotificationOutcome;
use crate::services::{CompanionEntry, CompanionOutcome, Delay, NotificationService, WebAppService};
use crate::welcome::{render_welcome, WelcomeDetails};

pub struct CompanionStage<'a> {
	web: &'a dyn WebAppService,
	delay: &'a dyn Delay,
	pause: Duration,
}

impl<'a> CompanionStage<'a> {
	pub fn new(web: &'a dyn WebAppService, delay: &'a dyn Delay, pause: Duration) -> Self {
		Self { web, delay, pause }
	}

	/// Creates a companion entry per eligible record. When login fails every
	/// eligible record is marked failed and the error is returned.
	#[instrument(skip_all)]
	pub async fn run(&self, outcome: &mut BatchOutcome) -> Result<()> {
		let eligible: Vec<usize> = outcome.accounts_created().collect();
		outcome.companion.get_or_insert_with(Default::default);
		if eligible.is_empty() {
			info!("no directory accounts created, companion stage has nothing to do");
			return Ok(());
		}

		if let Err(e) = self.web.authenticate().await {
			error!(error = %e, eligible = eligible.len(), "companion application login failed");
			for &index in &eligible {
				outcome.record_companion(index, CompanionOutcome::Failed(format!("login failed: {e}")));
			}
			if let Some(summary) = outcome.companion.as_mut() {
				summary.authentication_failed = true;
			}
			return Err(ProvisioningError::CompanionAuthentication(e));
		}

		for (position, &index) in eligible.iter().enumerate() {
			if position > 0 {
				self.delay.sleep(self.pause).await;
			}
			let Some(entry) = entry_for(outcome, index) else {
				continue;
			};
			let result = self.web.create_entry(&entry).await;
			match &result {
				CompanionOutcome::Created => info!(username = %entry.username, "companion entry created"),
				CompanionOutcome::AlreadyExists => {
					warn!(username = %entry.username, "companion entry already exists")
				}
				CompanionOutcome::Failed(message) => {
					error!(username = %entry.username, error = %message, "companion entry failed")
				}
			}
			outcome.record_companion(index, result);
		}
		Ok(())
	}
}

fn entry_for(outcome: &BatchOutcome, index: usize) -> Option<CompanionEntry> {
	let record = outcome.records.get(index)?;
	let candidate = &record.candidate;
	Some(CompanionEntry {
		username: candidate.document_number.clone(),
		document_type: candidate.document_type,
		document_number: candidate.document_number.clone(),
		given_names: candidate.given_names.clone(),
		family_names: candidate.family_names.clone(),
		institutional_address: record.institutional_address.clone()?,
		role: candidate.role.clone(),
	})
}

pub struct NotificationStage<'a> {
	notifier: &'a dyn NotificationService,
	subject: String,
	companion_password: Option<SecretString>,
}

impl<'a> NotificationStage<'a> {
	pub fn new(
		notifier: &'a dyn NotificationService,
		subject: impl Into<String>,
		companion_password: Option<SecretString>,
	) -> Self {
		Self {
			notifier,
			subject: subject.into(),
			companion_password,
		}
	}

	/// Sends a welcome message to the personal address of every record with
	/// a directory account.
	#[instrument(skip_all)]
	pub async fn run(&self, outcome: &mut BatchOutcome) {
		let eligible: Vec<usize> = outcome.accounts_created().collect();
		outcome.notification.get_or_insert_with(Default::default);

		for index in eligible {
			let Some(record) = outcome.records.get(index) else {
				continue;
			};
			let to = record.candidate.personal_email.clone();
			let result = match WelcomeDetails::from_record(record, self.companion_password.as_ref()) {
				Some(details) => {
					let message = render_welcome(&to, &self.subject, &details);
					match self.notifier.send(&message).await {
						Ok(()) => {
							info!(%to, "welcome message sent");
							NotificationOutcome::Sent
						}
						Err(e) => {
							error!(%to, error = %e, "welcome message failed");
							NotificationOutcome::Failed(e.to_string())
						}
					}
				}
				None => NotificationOutcome::Failed("record has no address or credential".to_string()),
			};
			outcome.record_notification(index, result);
		}
	}
}
