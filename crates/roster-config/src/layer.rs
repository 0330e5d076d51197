// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	CompanionConfigLayer, DirectoryConfigLayer, LoggingConfigLayer, NotificationConfigLayer,
	ProvisioningConfigLayer,
};

/// One source's view of the configuration. Every field is optional so that
/// later sources only override what they actually set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterConfigLayer {
	#[serde(default)]
	pub directory: Option<DirectoryConfigLayer>,
	#[serde(default)]
	pub provisioning: Option<ProvisioningConfigLayer>,
	#[serde(default)]
	pub companion: Option<CompanionConfigLayer>,
	#[serde(default)]
	pub notification: Option<NotificationConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl RosterConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: RosterConfigLayer) {
		merge_option(&mut self.directory, other.directory, DirectoryConfigLayer::merge);
		merge_option(
			&mut self.provisioning,
			other.provisioning,
			ProvisioningConfigLayer::merge,
		);
		merge_option(&mut self.companion, other.companion, CompanionConfigLayer::merge);
		merge_option(
			&mut self.notification,
			other.notification,
			NotificationConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
