// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::normalize::NormalizedNameKey;

/// Result of looking a candidate up in the directory roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
	/// No existing identity shares the candidate's normalized key.
	New,
	/// Exactly one existing address shares the key.
	Existing(String),
	/// Several distinct addresses share the key; an operator has to pick.
	Ambiguous(Vec<String>),
}

/// Exact-key duplicate detection over the directory roster.
///
/// Matching is on the full sorted token multiset. There is no fuzzy or
/// partial matching: two names that differ in a single character never match.
#[derive(Debug, Default, Clone)]
pub struct DuplicateIdentityMatcher {
	// Addresses in roster order, lower-cased, without repeats.
	by_key: HashMap<NormalizedNameKey, Vec<String>>,
}

impl DuplicateIdentityMatcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build from `(display_name, address)` pairs. Entries whose name
	/// normalizes to nothing, or that carry no address, are skipped.
	pub fn from_roster<'a, I>(roster: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut matcher = Self::new();
		for (display_name, address) in roster {
			matcher.insert(display_name, address);
		}

		let ambiguous = matcher.by_key.values().filter(|a| a.len() > 1).count();
		if ambiguous > 0 {
			warn!(
				ambiguous_keys = ambiguous,
				"directory roster contains distinct identities with identical normalized names"
			);
		}
		debug!(keys = matcher.by_key.len(), "duplicate matcher index built");
		matcher
	}

	pub fn insert(&mut self, display_name: &str, address: &str) {
		let address = address.trim().to_lowercase();
		if address.is_empty() {
			return;
		}
		let key = NormalizedNameKey::from_display_name(display_name);
		if key.is_empty() {
			return;
		}

		let addresses = self.by_key.entry(key).or_default();
		if let Some(pos) = addresses.iter().position(|a| *a == address) {
			// Re-seen address becomes the most recent write.
			let seen = addresses.remove(pos);
			addresses.push(seen);
		} else {
			addresses.push(address);
		}
	}

	/// Address of the existing identity with the same normalized name.
	///
	/// When several identities share the key the last one written wins; use
	/// [`resolve_detailed`](Self::resolve_detailed) to see the collision.
	pub fn resolve(&self, given: &str, family: &str) -> Option<&str> {
		let key = NormalizedNameKey::from_parts(given, family);
		self.by_key
			.get(&key)
			.and_then(|addresses| addresses.last())
			.map(String::as_str)
	}

	pub fn resolve_detailed(&self, given: &str, family: &str) -> MatchOutcome {
		let key = NormalizedNameKey::from_parts(given, family);
		match self.by_key.get(&key).map(Vec::as_slice) {
			None | Some([]) => MatchOutcome::New,
			Some([only]) => MatchOutcome::Existing(only.clone()),
			Some(many) => MatchOutcome::Ambiguous(many.to_vec()),
		}
	}

	/// Number of distinct normalized keys.
	pub fn len(&self) -> usize {
		self.by_key.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_key.is_empty()
	}
}
