// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Companion web application client for roster.

mod client;
mod error;
mod form;

pub use client::CompanionClient;
pub use error::{CompanionError, Result};
pub use form::{csrf_token, document_type_value, role_name};
