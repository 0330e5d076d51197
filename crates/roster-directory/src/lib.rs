// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory API client for roster.
//!
//! Talks to a Graph-style REST API with an application (client-credentials)
//! token and implements [`roster_provisioning::DirectoryService`].

mod client;
mod error;
mod token;
mod types;

pub use client::GraphDirectoryClient;
pub use error::{DirectoryError, Result};
pub use token::DEFAULT_SCOPE;
