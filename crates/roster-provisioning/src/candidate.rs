// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Kind of onboarding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
	/// A brand new member.
	Opening,
	/// A returning member whose account may already exist.
	Activation,
}

impl std::fmt::Display for RequestType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Opening => write!(f, "Opening"),
			Self::Activation => write!(f, "Activation"),
		}
	}
}

/// Identity document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
	/// Citizen identity card, written `C.C`.
	#[serde(rename = "C.C")]
	CitizenId,
	/// Foreigner identity card, written `C.E`.
	#[serde(rename = "C.E")]
	ForeignerId,
}

impl DocumentType {
	pub fn code(&self) -> &'static str {
		match self {
			Self::CitizenId => "C.C",
			Self::ForeignerId => "C.E",
		}
	}
}

impl std::fmt::Display for DocumentType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.code())
	}
}

/// Role category, which selects the directory group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
	Student,
	Staff,
	/// Free text that matched neither known category.
	Unrecognized(String),
}

impl RoleCategory {
	/// Case-insensitive parse of the English names and their Spanish aliases.
	pub fn parse(value: &str) -> Self {
		match value.trim().to_lowercase().as_str() {
			"student" | "estudiante" => Self::Student,
			"staff" | "docente" => Self::Staff,
			_ => Self::Unrecognized(value.trim().to_string()),
		}
	}
}

impl std::fmt::Display for RoleCategory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Student => write!(f, "Student"),
			Self::Staff => write!(f, "Staff"),
			Self::Unrecognized(value) => write!(f, "{value}"),
		}
	}
}

/// A validated onboarding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
	pub request_type: RequestType,
	/// All given names, space separated.
	pub given_names: String,
	/// All family names, space separated.
	pub family_names: String,
	pub document_type: DocumentType,
	pub document_number: String,
	pub personal_email: String,
	pub role: RoleCategory,
	pub program: String,
}

/// The name tokens address allocation works from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTokens<'a> {
	pub given_first: &'a str,
	pub family_first: &'a str,
	/// Empty when the candidate has a single family name.
	pub family_second: &'a str,
}

impl Candidate {
	pub fn display_name(&self) -> String {
		format!("{} {}", self.given_names.trim(), self.family_names.trim())
	}

	pub fn name_tokens(&self) -> NameTokens<'_> {
		let mut given = self.given_names.split_whitespace();
		let mut family = self.family_names.split_whitespace();
		NameTokens {
			given_first: given.next().unwrap_or_default(),
			family_first: family.next().unwrap_or_default(),
			family_second: family.next().unwrap_or_default(),
		}
	}
}
