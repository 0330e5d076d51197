// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Header recognition.
//!
//! Headers are compared after comparison-mode normalization, so case,
//! accents, punctuation and extra whitespace do not matter.

use std::fmt;

use csv::StringRecord;
use roster_identity::normalize::{normalize, NormalizeMode};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
	RequestType,
	GivenNames,
	FamilyNames,
	DocumentType,
	DocumentNumber,
	Role,
	Program,
	PersonalEmail,
}

impl Column {
	pub const ALL: [Column; 8] = [
		Column::RequestType,
		Column::GivenNames,
		Column::FamilyNames,
		Column::DocumentType,
		Column::DocumentNumber,
		Column::Role,
		Column::Program,
		Column::PersonalEmail,
	];

	pub fn header(self) -> &'static str {
		match self {
			Column::RequestType => "Request Type",
			Column::GivenNames => "Given Names",
			Column::FamilyNames => "Family Names",
			Column::DocumentType => "Document Type",
			Column::DocumentNumber => "Document Number",
			Column::Role => "Role",
			Column::Program => "Program",
			Column::PersonalEmail => "Personal Email",
		}
	}

	/// Spanish headers of the institutional template.
	fn aliases(self) -> &'static [&'static str] {
		match self {
			Column::RequestType => &["Tipo de Solicitud"],
			Column::GivenNames => &["Nombre", "Nombres"],
			Column::FamilyNames => &["Apellido", "Apellidos"],
			Column::DocumentType => &["Tipo de Identificación"],
			Column::DocumentNumber => &["Número de Identificación"],
			Column::Role => &["Tipo de Vinculación"],
			Column::Program => &["Dependencia Administrativa / Programa Académico"],
			Column::PersonalEmail => &["Correo Electrónico Personal"],
		}
	}

	fn matches(self, header: &str) -> bool {
		let key = normalize(header, NormalizeMode::Comparison);
		!key.is_empty()
			&& std::iter::once(self.header())
				.chain(self.aliases().iter().copied())
				.any(|name| normalize(name, NormalizeMode::Comparison) == key)
	}
}

impl fmt::Display for Column {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.header())
	}
}

/// Position of every required column in the header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
	positions: [usize; 8],
}

impl ColumnMap {
	pub fn from_headers(headers: &StringRecord) -> Result<Self> {
		let mut positions = [0usize; 8];
		let mut missing = Vec::new();

		for (slot, column) in positions.iter_mut().zip(Column::ALL) {
			match headers.iter().position(|h| column.matches(h)) {
				Some(index) => *slot = index,
				None => missing.push(column.header().to_string()),
			}
		}

		if missing.is_empty() {
			Ok(Self { positions })
		} else {
			Err(IngestError::MissingColumns(missing))
		}
	}

	/// Trimmed cell value; empty when the row is short.
	pub fn get<'r>(&self, record: &'r StringRecord, column: Column) -> &'r str {
		let index = self.positions[column as usize];
		record.get(index).map(str::trim).unwrap_or("")
	}
}
