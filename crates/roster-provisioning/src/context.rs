// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use roster_identity::{ExistingIdentity, ExistingIdentityIndex};
use tracing::{debug, warn};

use crate::services::DirectoryService;

/// State that lives for exactly one batch: the identity index with its
/// allocated-address set, and the group id cache.
///
/// Created at batch start, threaded through every stage, dropped at the end.
/// Two batches must never share one.
#[derive(Debug)]
pub struct BatchContext {
	pub(crate) index: ExistingIdentityIndex,
	group_ids: HashMap<String, Option<String>>,
	dry_run: bool,
	started_at: DateTime<Utc>,
}

impl BatchContext {
	pub fn new(domain: &str, roster: &[ExistingIdentity], dry_run: bool) -> Self {
		Self {
			index: ExistingIdentityIndex::build(domain, roster),
			group_ids: HashMap::new(),
			dry_run,
			started_at: Utc::now(),
		}
	}

	pub fn index(&self) -> &ExistingIdentityIndex {
		&self.index
	}

	pub fn is_dry_run(&self) -> bool {
		self.dry_run
	}

	pub fn started_at(&self) -> DateTime<Utc> {
		self.started_at
	}

	/// Group id by display name, cached for the batch. Lookup errors are
	/// not cached so a later record can try again.
	pub async fn group_id(
		&mut self,
		directory: &dyn DirectoryService,
		name: &str,
	) -> Result<Option<String>, String> {
		if let Some(cached) = self.group_ids.get(name) {
			debug!(group = %name, "group id served from cache");
			return Ok(cached.clone());
		}

		match directory.resolve_group_id(name).await {
			Ok(id) => {
				if id.is_none() {
					warn!(group = %name, "group not found in directory");
				}
				self.group_ids.insert(name.to_string(), id.clone());
				Ok(id)
			}
			Err(e) => {
				warn!(group = %name, error = %e, "group lookup failed");
				Err(e.message)
			}
		}
	}
}
