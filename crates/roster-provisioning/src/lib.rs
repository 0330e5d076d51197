// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Multi-stage provisioning of onboarding batches.
//!
//! The directory stages (account, propagation wait, group assignment with
//! retry) run per record through [`ProvisioningOrchestrator`]. The companion
//! application and welcome notification stages run afterwards over the whole
//! batch through [`CompanionStage`] and [`NotificationStage`].
//!
//! External systems sit behind [`DirectoryService`], [`WebAppService`] and
//! [`NotificationService`]; every wait goes through [`Delay`].

mod candidate;
mod context;
mod credential;
mod error;
mod groups;
mod orchestrator;
mod outcome;
mod record;
mod report;
mod retry;
mod services;
mod stages;
mod welcome;

pub use candidate::{Candidate, DocumentType, NameTokens, RequestType, RoleCategory};
pub use context::BatchContext;
pub use credential::{CredentialError, CredentialGenerator, MIN_CREDENTIAL_LENGTH};
pub use error::{ProvisioningError, Result};
pub use groups::GroupMapping;
pub use orchestrator::{Pacing, ProvisioningOrchestrator};
pub use outcome::{BatchOutcome, CompanionSummary, FollowUp, NotificationSummary};
pub use record::{NotificationOutcome, ProvisionedRecord, RecordState, Resolution, StageError};
pub use report::{write_reports, BatchSummary, RecordReport, ReportPaths, REPORT_TIMESTAMP_FORMAT};
pub use retry::{
	is_already_member_message, AssignmentResult, GroupAssignmentRetrier, RetryPolicy,
};
pub use services::{
	CompanionEntry, CompanionOutcome, CreatedAccount, Delay, DirectoryService, GroupAssignment,
	NewAccount, NotificationService, OutgoingMessage, ServiceError, TokioDelay, WebAppService,
};
pub use stages::{CompanionStage, NotificationStage};
pub use welcome::{render_welcome, WelcomeDetails};

pub use roster_identity::ExistingIdentity;
