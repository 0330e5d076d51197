// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-field validation and normalization of candidate rows.

use roster_provisioning::{DocumentType, RequestType, RoleCategory};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 200;
const DOCUMENT_MAX_CHARS: usize = 20;

/// Lower-cased inside family names unless they come first.
const FAMILY_PARTICLES: &[&str] = &["de", "del", "la", "los", "las", "y"];

/// Upper-cases the first letter of every run of letters and lower-cases the
/// rest, so `o'BRIEN-smith` becomes `O'Brien-Smith`.
pub fn title_case(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	let mut in_word = false;
	for c in value.chars() {
		if c.is_alphabetic() {
			if in_word {
				out.extend(c.to_lowercase());
			} else {
				out.extend(c.to_uppercase());
			}
			in_word = true;
		} else {
			out.push(c);
			in_word = false;
		}
	}
	out
}

fn collapse_whitespace(value: &str) -> String {
	value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn request_type(value: &str) -> Result<RequestType, String> {
	match title_case(value.trim()).as_str() {
		"Opening" | "Apertura" => Ok(RequestType::Opening),
		"Activation" | "Activación" | "Activacion" => Ok(RequestType::Activation),
		_ => Err(format!(
			"'{value}' is not an accepted request type (Opening, Activation)"
		)),
	}
}

fn name_length(value: &str) -> Result<(), String> {
	let chars = value.chars().count();
	if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
		Ok(())
	} else {
		Err(format!(
			"must be {NAME_MIN_CHARS} to {NAME_MAX_CHARS} characters, got {chars}"
		))
	}
}

pub fn given_names(value: &str) -> Result<String, String> {
	let normalized = title_case(&collapse_whitespace(value));
	name_length(&normalized)?;
	Ok(normalized)
}

pub fn family_names(value: &str) -> Result<String, String> {
	let titled = title_case(&collapse_whitespace(value));
	name_length(&titled)?;
	let words: Vec<String> = titled
		.split(' ')
		.enumerate()
		.map(|(i, word)| {
			let lowered = word.to_lowercase();
			if i > 0 && FAMILY_PARTICLES.contains(&lowered.as_str()) {
				lowered
			} else {
				word.to_string()
			}
		})
		.collect();
	Ok(words.join(" "))
}

pub fn document_type(value: &str) -> Result<DocumentType, String> {
	match value.trim().to_uppercase().as_str() {
		"CC" | "C.C" | "C.C." => Ok(DocumentType::CitizenId),
		"CE" | "C.E" | "C.E." => Ok(DocumentType::ForeignerId),
		_ => Err(format!("'{value}' is not an accepted document type (C.C, C.E)")),
	}
}

/// Digits only, never zero padded. A trailing `.0` left by spreadsheet
/// exports of numeric cells is dropped.
pub fn document_number(value: &str) -> Result<String, String> {
	let trimmed = value.trim();
	let trimmed = trimmed
		.strip_suffix(".0")
		.filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
		.unwrap_or(trimmed);

	if trimmed.is_empty() {
		return Err("is required".to_string());
	}
	if trimmed.chars().count() > DOCUMENT_MAX_CHARS {
		return Err(format!("must be at most {DOCUMENT_MAX_CHARS} characters"));
	}
	if !trimmed.chars().all(|c| c.is_ascii_digit()) {
		return Err(format!("'{value}' must contain only digits"));
	}
	Ok(trimmed.to_string())
}

pub fn role(value: &str) -> Result<RoleCategory, String> {
	match RoleCategory::parse(value) {
		RoleCategory::Unrecognized(_) => Err(format!(
			"'{value}' is not an accepted role (Student, Staff)"
		)),
		role => Ok(role),
	}
}

pub fn program(value: &str) -> Result<String, String> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		Err("is required".to_string())
	} else {
		Ok(trimmed.to_string())
	}
}

pub fn personal_email(value: &str) -> Result<String, String> {
	let trimmed = value.trim();
	if roster_smtp::is_valid_address(trimmed) {
		Ok(trimmed.to_string())
	} else {
		Err(format!("'{value}' is not a valid address"))
	}
}
