// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors raised while resolving or allocating an identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
	#[error("no free address for {base}@{domain} after {attempts} numeric suffixes")]
	AllocationExhausted {
		base: String,
		domain: String,
		attempts: u32,
	},

	#[error("{component} '{value}' has no characters usable in an address")]
	UnusableName {
		component: &'static str,
		value: String,
	},
}

pub type Result<T> = std::result::Result<T, IdentityError>;
