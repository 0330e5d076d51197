// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use roster_provisioning::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
	#[error("directory client is not configured: {0}")]
	NotConfigured(String),

	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("request timed out")]
	Timeout,

	#[error("token request rejected (status {status}): {message}")]
	Token { status: u16, message: String },

	#[error("directory API error (status {status}): {message}")]
	Api { status: u16, message: String },

	#[error("invalid response: {0}")]
	InvalidResponse(String),
}

impl DirectoryError {
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout)
	}

	pub(crate) fn from_send(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else {
			Self::Network(e)
		}
	}
}

impl From<DirectoryError> for ServiceError {
	fn from(e: DirectoryError) -> Self {
		if e.is_timeout() {
			ServiceError::timeout(e.to_string())
		} else {
			ServiceError::new(e.to_string())
		}
	}
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
