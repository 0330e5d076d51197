// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `roster`: batch onboarding from a spreadsheet export.
//!
//! Reads candidates, shows what would be created, waits for the operator,
//! then provisions directory accounts, companion application entries and
//! welcome messages before writing the audit reports.

mod logging;
mod review;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use roster_companion::CompanionClient;
use roster_config::{load_config, load_config_with_file, LogFormat, RosterConfig};
use roster_directory::GraphDirectoryClient;
use roster_ingest::SpreadsheetIngester;
use roster_provisioning::{
	write_reports, CompanionStage, NotificationStage, ProvisioningOrchestrator, TokioDelay,
};
use roster_smtp::SmtpClient;
use tokio::io::{stdin, stdout, BufReader};
use tracing::{error, info, warn};

/// Pause between companion application submissions.
const COMPANION_PAUSE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Provision institutional accounts from a spreadsheet", long_about = None)]
#[command(version)]
struct Args {
	/// CSV export of the onboarding spreadsheet.
	input: PathBuf,

	/// Configuration file. Defaults to /etc/roster/roster.toml.
	#[arg(short, long, env = "ROSTER_CONFIG")]
	config: Option<PathBuf>,

	/// Data rows to skip after the header.
	#[arg(long, default_value_t = 0)]
	skip_rows: usize,

	/// Resolve and allocate only; nothing is written to any system.
	#[arg(long)]
	dry_run: bool,

	/// Do not ask for confirmation.
	#[arg(short, long)]
	yes: bool,

	/// Skip the companion application stage.
	#[arg(long)]
	skip_companion: bool,

	/// Skip welcome messages.
	#[arg(long)]
	skip_notify: bool,

	/// Override the configured log level.
	#[arg(long)]
	log_level: Option<String>,

	/// Emit logs as JSON.
	#[arg(long)]
	json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	dotenvy::dotenv().ok();
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => load_config_with_file(path)
			.with_context(|| format!("failed to load configuration from {}", path.display()))?,
		None => load_config().context("failed to load configuration")?,
	};
	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}
	if args.json_logs {
		config.logging.format = LogFormat::Json;
	}
	logging::init_tracing(&config.logging);

	run(args, config).await
}

async fn run(args: Args, config: RosterConfig) -> Result<()> {
	let candidates = SpreadsheetIngester::new()
		.with_skip_rows(args.skip_rows)
		.read_path(&args.input)
		.with_context(|| format!("cannot use {}", args.input.display()))?;
	info!(candidates = candidates.len(), input = %args.input.display(), "spreadsheet read");

	if candidates.is_empty() {
		println!("No candidates in {}", args.input.display());
		return Ok(());
	}

	let directory = Arc::new(
		GraphDirectoryClient::new(&config.directory).context("directory client is not usable")?,
	);
	let orchestrator = ProvisioningOrchestrator::new(directory, Arc::new(TokioDelay), &config.provisioning)
		.context("invalid provisioning settings")?;

	let mut ctx = orchestrator
		.begin_batch(&config.directory.domain, args.dry_run)
		.await
		.context("cannot start the batch")?;
	let records = orchestrator.plan(&mut ctx, candidates);
	println!("{}", review::render_plan(&records));

	let mut input = BufReader::new(stdin());
	let mut output = stdout();

	if !args.dry_run && !args.yes {
		let proceed = review::confirm(&mut input, &mut output, "Create the new accounts?").await?;
		if !proceed {
			println!("Aborted, nothing was written.");
			return Ok(());
		}
	}

	let mut outcome = orchestrator.provision(&mut ctx, records).await;

	if !args.dry_run {
		match (&config.companion, args.skip_companion) {
			(Some(companion), false) => {
				let client = CompanionClient::new(companion).context("companion client is not usable")?;
				let delay = TokioDelay;
				if let Err(e) = CompanionStage::new(&client, &delay, COMPANION_PAUSE)
					.run(&mut outcome)
					.await
				{
					error!(error = %e, "companion stage aborted");
				}
			}
			(None, false) => warn!("companion application not configured, stage skipped"),
			(_, true) => info!("companion stage skipped by request"),
		}

		match (&config.notification, args.skip_notify) {
			(Some(notification), false) if outcome.accounts_created().next().is_some() => {
				let smtp = SmtpClient::new(notification).context("SMTP client is not usable")?;
				if !smtp_reachable(&smtp, &notification.host).await {
					println!(
						"SMTP server {} is unreachable, no welcome messages sent. Credentials are in the records report.",
						notification.host
					);
				} else if args.yes
					|| review::confirm(&mut input, &mut output, "Send welcome messages?").await?
				{
					let default_password = config
						.companion
						.as_ref()
						.map(|c| c.default_password.clone());
					NotificationStage::new(&smtp, notification.welcome_subject.clone(), default_password)
						.run(&mut outcome)
						.await;
				}
			}
			(Some(_), false) => {}
			(None, false) => warn!("SMTP not configured, welcome messages skipped"),
			(_, true) => info!("welcome messages skipped by request"),
		}
	}

	let paths = write_reports(&outcome, &config.provisioning.output_dir, ctx.started_at())
		.context("failed to write reports")?;
	println!("{}", review::render_summary(&outcome));
	println!("Records: {}", paths.records.display());
	println!("Summary: {}", paths.summary.display());

	Ok(())
}

/// Checked once, before any welcome message is rendered.
async fn smtp_reachable(smtp: &SmtpClient, host: &str) -> bool {
	match smtp.check_health().await {
		Ok(()) => true,
		Err(e) => {
			error!(host, error = %e, "SMTP health check failed, welcome messages skipped");
			false
		}
	}
}
