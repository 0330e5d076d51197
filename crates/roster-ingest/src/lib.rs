// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Onboarding spreadsheet ingestion.
//!
//! Turns a CSV export of the onboarding template into validated
//! [`Candidate`](roster_provisioning::Candidate) records, or into the
//! complete list of row-level problems.

mod columns;
mod error;
mod ingester;
pub mod validate;

pub use columns::{Column, ColumnMap};
pub use error::{IngestError, Result, RowError};
pub use ingester::SpreadsheetIngester;
