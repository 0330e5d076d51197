// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use roster_config::ProvisioningConfig;
use tracing::warn;

use crate::candidate::RoleCategory;

/// Static role category to directory group name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMapping {
	pub student_group: String,
	pub staff_group: String,
}

impl GroupMapping {
	pub fn new(student_group: impl Into<String>, staff_group: impl Into<String>) -> Self {
		Self {
			student_group: student_group.into(),
			staff_group: staff_group.into(),
		}
	}

	pub fn from_config(config: &ProvisioningConfig) -> Self {
		Self::new(&config.student_group, &config.staff_group)
	}

	/// Unrecognized roles fall back to the student group.
	pub fn group_for(&self, role: &RoleCategory) -> &str {
		match role {
			RoleCategory::Student => &self.student_group,
			RoleCategory::Staff => &self.staff_group,
			RoleCategory::Unrecognized(value) => {
				warn!(
					role = %value,
					group = %self.student_group,
					"unrecognized role category, using student group"
				);
				&self.student_group
			}
		}
	}
}
