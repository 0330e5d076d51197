// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::columns::Column;

/// One rejected value. `row` is the 1-based line in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
	pub row: u64,
	pub column: Column,
	pub message: String,
}

impl fmt::Display for RowError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "row {}: {}: {}", self.row, self.column, self.message)
	}
}

#[derive(Debug, Error)]
pub enum IngestError {
	#[error("failed to open {path}: {source}")]
	Open {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed CSV: {0}")]
	Csv(#[from] csv::Error),

	#[error("missing columns: {}", .0.join(", "))]
	MissingColumns(Vec<String>),

	#[error("{} invalid value(s):\n{}", .0.len(), render(.0))]
	Validation(Vec<RowError>),
}

fn render(errors: &[RowError]) -> String {
	errors
		.iter()
		.map(|e| format!("  {e}"))
		.collect::<Vec<_>>()
		.join("\n")
}

pub type Result<T> = std::result::Result<T, IngestError>;
