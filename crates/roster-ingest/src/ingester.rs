// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use roster_provisioning::Candidate;
use tracing::{debug, info, instrument, warn};

use crate::columns::{Column, ColumnMap};
use crate::error::{IngestError, Result, RowError};
use crate::validate;

/// Reads onboarding requests from CSV.
///
/// Every row is validated before anything is returned: a file with one bad
/// value yields no candidates, only the full list of problems.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetIngester {
	skip_rows: usize,
}

impl SpreadsheetIngester {
	pub fn new() -> Self {
		Self::default()
	}

	/// Skip this many data rows after the header.
	pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
		self.skip_rows = skip_rows;
		self
	}

	#[instrument(skip(self), fields(path = %path.display()))]
	pub fn read_path(&self, path: &Path) -> Result<Vec<Candidate>> {
		let file = File::open(path).map_err(|source| IngestError::Open {
			path: path.to_path_buf(),
			source,
		})?;
		self.read(file)
	}

	pub fn read<R: Read>(&self, source: R) -> Result<Vec<Candidate>> {
		let mut reader = ReaderBuilder::new()
			.flexible(true)
			.trim(Trim::All)
			.from_reader(source);

		let columns = ColumnMap::from_headers(reader.headers()?)?;

		let mut candidates = Vec::new();
		let mut errors = Vec::new();
		let mut skipped_empty = 0usize;

		for record in reader.records().skip(self.skip_rows) {
			let record = record?;
			if record.iter().all(|cell| cell.trim().is_empty()) {
				skipped_empty += 1;
				continue;
			}
			let row = record.position().map(|p| p.line()).unwrap_or_default();
			match parse_row(&columns, &record, row) {
				Ok(candidate) => candidates.push(candidate),
				Err(mut row_errors) => errors.append(&mut row_errors),
			}
		}

		if skipped_empty > 0 {
			debug!(rows = skipped_empty, "empty rows skipped");
		}
		if !errors.is_empty() {
			warn!(errors = errors.len(), "input rejected");
			return Err(IngestError::Validation(errors));
		}

		info!(candidates = candidates.len(), "input validated");
		Ok(candidates)
	}
}

fn parse_row(
	columns: &ColumnMap,
	record: &StringRecord,
	row: u64,
) -> std::result::Result<Candidate, Vec<RowError>> {
	let mut errors = Vec::new();
	let cell = |column: Column| columns.get(record, column);

	let request_type = check(&mut errors, row, Column::RequestType, validate::request_type(cell(Column::RequestType)));
	let given_names = check(&mut errors, row, Column::GivenNames, validate::given_names(cell(Column::GivenNames)));
	let family_names = check(&mut errors, row, Column::FamilyNames, validate::family_names(cell(Column::FamilyNames)));
	let document_type = check(&mut errors, row, Column::DocumentType, validate::document_type(cell(Column::DocumentType)));
	let document_number = check(
		&mut errors,
		row,
		Column::DocumentNumber,
		validate::document_number(cell(Column::DocumentNumber)),
	);
	let role = check(&mut errors, row, Column::Role, validate::role(cell(Column::Role)));
	let program = check(&mut errors, row, Column::Program, validate::program(cell(Column::Program)));
	let personal_email = check(
		&mut errors,
		row,
		Column::PersonalEmail,
		validate::personal_email(cell(Column::PersonalEmail)),
	);

	match (
		request_type,
		given_names,
		family_names,
		document_type,
		document_number,
		role,
		program,
		personal_email,
	) {
		(
			Some(request_type),
			Some(given_names),
			Some(family_names),
			Some(document_type),
			Some(document_number),
			Some(role),
			Some(program),
			Some(personal_email),
		) => Ok(Candidate {
			request_type,
			given_names,
			family_names,
			document_type,
			document_number,
			personal_email,
			role,
			program,
		}),
		_ => Err(errors),
	}
}

fn check<T>(
	errors: &mut Vec<RowError>,
	row: u64,
	column: Column,
	result: std::result::Result<T, String>,
) -> Option<T> {
	match result {
		Ok(value) => Some(value),
		Err(message) => {
			errors.push(RowError {
				row,
				column,
				message,
			});
			None
		}
	}
}
