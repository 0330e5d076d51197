// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use roster_provisioning::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompanionError {
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("request timed out")]
	Timeout,

	#[error("login rejected: {0}")]
	LoginRejected(String),

	#[error("not logged in")]
	NotAuthenticated,

	#[error("unexpected status {status} from {path}")]
	UnexpectedStatus { status: u16, path: String },
}

impl CompanionError {
	pub(crate) fn from_send(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else {
			Self::Network(e)
		}
	}
}

impl From<CompanionError> for ServiceError {
	fn from(e: CompanionError) -> Self {
		match e {
			CompanionError::Timeout => ServiceError::timeout(e.to_string()),
			other => ServiceError::new(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, CompanionError>;
