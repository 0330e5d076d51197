// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use crate::credential::CredentialError;
use crate::services::ServiceError;

/// Errors that abort a whole batch. Per-record stage failures are never
/// surfaced through this type; they are captured on the record.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("failed to load directory roster: {0}")]
	RosterUnavailable(#[source] ServiceError),

	#[error("companion application authentication failed: {0}")]
	CompanionAuthentication(#[source] ServiceError),

	#[error(transparent)]
	Credential(#[from] CredentialError),

	#[error("failed to write report {path}: {source}")]
	ReportWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to serialize report: {0}")]
	ReportSerialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
