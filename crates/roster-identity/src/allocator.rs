// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Institutional address allocation.
//!
//! The local part is `given.family`, built from the first given-name token and
//! the first family-name token. On collision the allocator first appends
//! growing prefixes of the second family-name token, then a numeric counter.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::error::{IdentityError, Result};
use crate::normalize::{normalize, NormalizeMode};

/// Upper bound for the numeric suffix ladder.
pub const MAX_NUMERIC_SUFFIX: u32 = 9_999;

/// Every address that is no longer available in this batch. All entries are
/// stored lower-cased.
#[derive(Debug, Default, Clone)]
pub struct AddressRegistry {
	existing: HashSet<String>,
	allocated: HashSet<String>,
}

impl AddressRegistry {
	pub fn new<I, S>(existing: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			existing: existing
				.into_iter()
				.map(|a| a.as_ref().trim().to_lowercase())
				.filter(|a| !a.is_empty())
				.collect(),
			allocated: HashSet::new(),
		}
	}

	pub fn is_available(&self, address: &str) -> bool {
		let address = address.to_lowercase();
		!self.existing.contains(&address) && !self.allocated.contains(&address)
	}

	/// Marks `address` as allocated. Returns false if it was already taken.
	pub fn reserve(&mut self, address: &str) -> bool {
		if !self.is_available(address) {
			return false;
		}
		self.allocated.insert(address.to_lowercase())
	}

	pub fn existing_count(&self) -> usize {
		self.existing.len()
	}

	pub fn allocated(&self) -> impl Iterator<Item = &str> {
		self.allocated.iter().map(String::as_str)
	}

	pub fn allocated_count(&self) -> usize {
		self.allocated.len()
	}
}

/// Allocates collision-free addresses at one domain.
///
/// Not idempotent: every successful [`allocate`](Self::allocate) consumes the
/// returned address, so call it once per new candidate per batch.
#[derive(Debug, Clone)]
pub struct EmailAllocator {
	domain: String,
	registry: AddressRegistry,
}

impl EmailAllocator {
	pub fn new(domain: impl Into<String>, registry: AddressRegistry) -> Self {
		Self {
			domain: domain.into().trim().trim_start_matches('@').to_lowercase(),
			registry,
		}
	}

	pub fn domain(&self) -> &str {
		&self.domain
	}

	pub fn registry(&self) -> &AddressRegistry {
		&self.registry
	}

	#[instrument(skip(self), fields(domain = %self.domain))]
	pub fn allocate(
		&mut self,
		given_first: &str,
		family_first: &str,
		family_second: &str,
	) -> Result<String> {
		let given = normalize(given_first, NormalizeMode::Address);
		if given.is_empty() {
			return Err(IdentityError::UnusableName {
				component: "given name",
				value: given_first.to_string(),
			});
		}
		let family = normalize(family_first, NormalizeMode::Address);
		if family.is_empty() {
			return Err(IdentityError::UnusableName {
				component: "family name",
				value: family_first.to_string(),
			});
		}

		let base = format!("{given}.{family}");
		let second = normalize(family_second, NormalizeMode::Address);

		let letter_ladder = (1..=second.len()).map(|len| format!("{base}{}", &second[..len]));
		let numeric_ladder = (1..=MAX_NUMERIC_SUFFIX).map(|n| format!("{base}{n}"));

		for local in std::iter::once(base.clone())
			.chain(letter_ladder)
			.chain(numeric_ladder)
		{
			let address = format!("{local}@{}", self.domain);
			if self.registry.reserve(&address) {
				debug!(%address, "address allocated");
				return Ok(address);
			}
		}

		Err(IdentityError::AllocationExhausted {
			base,
			domain: self.domain.clone(),
			attempts: MAX_NUMERIC_SUFFIX,
		})
	}
}
