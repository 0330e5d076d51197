// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;

use roster_ingest::{Column, IngestError, SpreadsheetIngester};
use roster_provisioning::{DocumentType, RequestType, RoleCategory};

const SPANISH_HEADER: &str = "Tipo de Solicitud,Nombre,Apellido,Tipo de Identificación,Número de Identificación,Tipo de Vinculación,Dependencia Administrativa / Programa Académico,Correo Electrónico Personal";
const ENGLISH_HEADER: &str =
	"Request Type,Given Names,Family Names,Document Type,Document Number,Role,Program,Personal Email";

fn read(text: &str) -> Result<Vec<roster_provisioning::Candidate>, IngestError> {
	SpreadsheetIngester::new().read(text.as_bytes())
}

#[test]
fn spanish_template_is_normalized() {
	let input = format!(
		"{SPANISH_HEADER}\n\
		 apertura, laura SOFIA ,BECERRA DE LA sandoval,cc,1234567890.0,estudiante,Ingeniería de Sistemas,laura@mail.test\n"
	);
	let candidates = read(&input).unwrap();

	assert_eq!(candidates.len(), 1);
	let c = &candidates[0];
	assert_eq!(c.request_type, RequestType::Opening);
	assert_eq!(c.given_names, "Laura Sofia");
	assert_eq!(c.family_names, "Becerra de la Sandoval");
	assert_eq!(c.document_type, DocumentType::CitizenId);
	assert_eq!(c.document_number, "1234567890");
	assert_eq!(c.role, RoleCategory::Student);
	assert_eq!(c.program, "Ingeniería de Sistemas");
}

#[test]
fn empty_rows_are_skipped() {
	let input = format!(
		"{ENGLISH_HEADER}\n\
		 Opening,Ana,Lopez,C.E,77,Staff,Physics,ana@mail.test\n\
		 ,,,,,,,\n\
		 Activation,Luis,Mora,CC,78,Student,Math,luis@mail.test\n"
	);
	let candidates = read(&input).unwrap();
	assert_eq!(candidates.len(), 2);
	assert_eq!(candidates[1].request_type, RequestType::Activation);
}

#[test]
fn skip_rows_drops_leading_data_rows() {
	let input = format!(
		"{ENGLISH_HEADER}\n\
		 Example,do not,import,XX,abc,Nobody,,not-an-email\n\
		 Opening,Ana,Lopez,CC,77,Student,Physics,ana@mail.test\n"
	);
	let candidates = SpreadsheetIngester::new()
		.with_skip_rows(1)
		.read(input.as_bytes())
		.unwrap();
	assert_eq!(candidates.len(), 1);
	assert_eq!(candidates[0].given_names, "Ana");
}

#[test]
fn all_row_errors_are_collected() {
	let input = format!(
		"{ENGLISH_HEADER}\n\
		 Opening,Ana,Lopez,CC,77,Student,Physics,ana@mail.test\n\
		 Closing,A,Lopez,TI,77a,Visitor,,nope\n\
		 Opening,Luis,Mora,CC,78,Student,Math,luis@\n"
	);
	match read(&input) {
		Err(IngestError::Validation(errors)) => {
			assert_eq!(errors.len(), 8);
			assert!(errors.iter().take(7).all(|e| e.row == 3));
			assert_eq!(errors[7].row, 4);
			assert_eq!(errors[7].column, Column::PersonalEmail);
		}
		other => panic!("expected validation errors, got {other:?}"),
	}
}

#[test]
fn missing_header_is_reported() {
	let err = read("Given Names,Family Names\nAna,Lopez\n").unwrap_err();
	assert!(matches!(err, IngestError::MissingColumns(ref missing) if missing.len() == 6));
}

#[test]
fn reads_from_path_and_can_be_read_again() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "{ENGLISH_HEADER}").unwrap();
	writeln!(file, "Opening,Ana,Lopez,CC,77,Student,Physics,ana@mail.test").unwrap();

	let ingester = SpreadsheetIngester::new();
	let first = ingester.read_path(file.path()).unwrap();
	let second = ingester.read_path(file.path()).unwrap();
	assert_eq!(first, second);
}

#[test]
fn missing_file_is_an_open_error() {
	let err = SpreadsheetIngester::new()
		.read_path(std::path::Path::new("/nonexistent/roster.csv"))
		.unwrap_err();
	assert!(matches!(err, IngestError::Open { .. }));
}
