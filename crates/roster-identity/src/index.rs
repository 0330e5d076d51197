// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocator::{AddressRegistry, EmailAllocator};
use crate::error::Result;
use crate::matcher::{DuplicateIdentityMatcher, MatchOutcome};

/// An identity already present in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingIdentity {
	/// Primary address, used for duplicate matching.
	pub address: String,
	pub display_name: String,
	/// Other addresses held by the same account, such as a principal name
	/// that differs from the mail attribute. Taken, never matched on.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub other_addresses: Vec<String>,
}

impl ExistingIdentity {
	pub fn new(address: impl Into<String>, display_name: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			display_name: display_name.into(),
			other_addresses: Vec::new(),
		}
	}

	pub fn with_other_address(mut self, address: impl Into<String>) -> Self {
		self.other_addresses.push(address.into());
		self
	}

	/// Primary address first, then the others.
	pub fn addresses(&self) -> impl Iterator<Item = &str> {
		std::iter::once(self.address.as_str()).chain(self.other_addresses.iter().map(String::as_str))
	}
}

/// Per-batch view of the directory: who exists, and which addresses are gone.
///
/// Built once at batch start. Holds mutable allocation state, so it must not
/// be shared between batches.
#[derive(Debug, Clone)]
pub struct ExistingIdentityIndex {
	matcher: DuplicateIdentityMatcher,
	allocator: EmailAllocator,
}

impl ExistingIdentityIndex {
	/// Only addresses at `domain` (case-insensitive) are indexed. Every such
	/// address is taken; an identity is matched by name on its first one.
	pub fn build(domain: &str, roster: &[ExistingIdentity]) -> Self {
		let suffix = format!("@{}", domain.trim().trim_start_matches('@').to_lowercase());
		let in_domain = |address: &&str| address.trim().to_lowercase().ends_with(&suffix);

		let matcher = DuplicateIdentityMatcher::from_roster(roster.iter().filter_map(|identity| {
			let primary = identity.addresses().find(in_domain)?;
			Some((identity.display_name.as_str(), primary))
		}));
		let registry = AddressRegistry::new(
			roster
				.iter()
				.flat_map(ExistingIdentity::addresses)
				.filter(in_domain),
		);

		info!(
			domain,
			roster = roster.len(),
			taken = registry.existing_count(),
			keys = matcher.len(),
			"existing identity index built"
		);

		Self {
			matcher,
			allocator: EmailAllocator::new(domain, registry),
		}
	}

	pub fn resolve(&self, given: &str, family: &str) -> Option<&str> {
		self.matcher.resolve(given, family)
	}

	pub fn resolve_detailed(&self, given: &str, family: &str) -> MatchOutcome {
		self.matcher.resolve_detailed(given, family)
	}

	pub fn allocate(&mut self, given_first: &str, family_first: &str, family_second: &str) -> Result<String> {
		self.allocator.allocate(given_first, family_first, family_second)
	}

	pub fn is_available(&self, address: &str) -> bool {
		self.allocator.registry().is_available(address)
	}

	pub fn domain(&self) -> &str {
		self.allocator.domain()
	}

	pub fn matcher(&self) -> &DuplicateIdentityMatcher {
		&self.matcher
	}

	pub fn registry(&self) -> &AddressRegistry {
		self.allocator.registry()
	}
}
