// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for roster.

pub mod companion;
pub mod directory;
pub mod logging;
pub mod notification;
pub mod provisioning;

pub use companion::{CompanionConfig, CompanionConfigLayer};
pub use directory::{DirectoryConfig, DirectoryConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use notification::{NotificationConfig, NotificationConfigLayer};
pub use provisioning::{ProvisioningConfig, ProvisioningConfigLayer, MIN_CREDENTIAL_LENGTH};
