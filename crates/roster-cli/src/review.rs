// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator-facing text: the pre-provisioning review, confirmation prompts
//! and the end-of-batch summary.

use std::fmt::Write as _;
use std::io;

use roster_provisioning::{BatchOutcome, ProvisionedRecord, RecordState, Resolution};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Answers accepted as consent, in English and Spanish.
pub fn is_affirmative(answer: &str) -> bool {
	matches!(
		answer.trim().to_lowercase().as_str(),
		"y" | "yes" | "s" | "si" | "sí"
	)
}

/// Prints `question` and reads one line. End of input counts as no.
pub async fn confirm<R, W>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	output.write_all(format!("{question} [y/N]: ").as_bytes()).await?;
	output.flush().await?;

	let mut answer = String::new();
	let read = input.read_line(&mut answer).await?;
	Ok(read > 0 && is_affirmative(&answer))
}

fn address(record: &ProvisionedRecord) -> &str {
	record.institutional_address.as_deref().unwrap_or("-")
}

/// New/existing split shown before anything is written.
pub fn render_plan(records: &[ProvisionedRecord]) -> String {
	let mut new = Vec::new();
	let mut existing = Vec::new();
	let mut ambiguous = Vec::new();
	let mut unallocated = Vec::new();

	for record in records {
		match (&record.resolution, record.state) {
			(Resolution::New, RecordState::Failed) => unallocated.push(record),
			(Resolution::New, _) => new.push(record),
			(Resolution::Existing, _) => existing.push(record),
			(Resolution::Ambiguous { .. }, _) => ambiguous.push(record),
		}
	}

	let mut out = String::new();
	let _ = writeln!(out, "{} candidate(s) read", records.len());

	let _ = writeln!(out, "\nNew ({}):", new.len());
	for record in &new {
		let _ = writeln!(
			out,
			"  {:<40} {:<40} {}",
			record.display_name(),
			address(record),
			record.group_name.as_deref().unwrap_or("-")
		);
	}

	let _ = writeln!(out, "\nAlready provisioned ({}):", existing.len());
	for record in &existing {
		let _ = writeln!(out, "  {:<40} {}", record.display_name(), address(record));
	}

	if !ambiguous.is_empty() {
		let _ = writeln!(out, "\nNeeds operator review, several matching accounts ({}):", ambiguous.len());
		for record in &ambiguous {
			if let Resolution::Ambiguous { candidates } = &record.resolution {
				let _ = writeln!(out, "  {:<40} {}", record.display_name(), candidates.join(", "));
			}
		}
	}

	if !unallocated.is_empty() {
		let _ = writeln!(out, "\nNo address could be allocated ({}):", unallocated.len());
		for record in &unallocated {
			let reason = record.errors.first().map(|e| e.to_string()).unwrap_or_default();
			let _ = writeln!(out, "  {:<40} {}", record.display_name(), reason);
		}
	}

	out
}

pub fn render_summary(outcome: &BatchOutcome) -> String {
	let mut out = String::new();
	let name = |i: &usize| {
		outcome
			.records
			.get(*i)
			.map(|r| format!("{} <{}>", r.display_name(), address(r)))
			.unwrap_or_default()
	};

	if outcome.dry_run {
		let _ = writeln!(out, "Dry run: {} account(s) planned, nothing written", outcome.planned.len());
		return out;
	}

	let _ = writeln!(out, "Directory:");
	let _ = writeln!(out, "  fully provisioned:         {}", outcome.fully_provisioned.len());
	let _ = writeln!(out, "  provisioned without group: {}", outcome.provisioned_without_group.len());
	let _ = writeln!(out, "  failed:                    {}", outcome.failed.len());
	let _ = writeln!(out, "  already provisioned:       {}", outcome.existing.len());
	if !outcome.ambiguous.is_empty() {
		let _ = writeln!(out, "  needs review:              {}", outcome.ambiguous.len());
	}

	for &i in &outcome.failed {
		let errors: Vec<String> = outcome.records[i].errors.iter().map(|e| e.to_string()).collect();
		let _ = writeln!(out, "  FAILED {}: {}", name(&i), errors.join("; "));
	}

	let follow_ups = outcome.follow_ups();
	if !follow_ups.is_empty() {
		let _ = writeln!(out, "\nManual follow-up, add to group:");
		for f in &follow_ups {
			let _ = writeln!(out, "  {} <{}> id={} group={}", f.display_name, f.address, f.account_id, f.pending_group);
		}
	}

	if let Some(companion) = &outcome.companion {
		let _ = writeln!(out, "\nCompanion application:");
		if companion.authentication_failed {
			let _ = writeln!(out, "  login failed, no entries created");
		}
		let _ = writeln!(out, "  created:        {}", companion.created.len());
		let _ = writeln!(out, "  already exists: {}", companion.already_exists.len());
		let _ = writeln!(out, "  failed:         {}", companion.failed.len());
	}

	if let Some(notification) = &outcome.notification {
		let _ = writeln!(out, "\nWelcome messages:");
		let _ = writeln!(out, "  sent:   {}", notification.sent.len());
		let _ = writeln!(out, "  failed: {}", notification.failed.len());
		for i in &notification.failed {
			let _ = writeln!(out, "  FAILED {}", name(i));
		}
	}

	out
}
