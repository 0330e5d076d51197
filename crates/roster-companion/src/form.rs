// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field values for the companion application's forms.

use roster_provisioning::{DocumentType, RoleCategory};

pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Select value of the document type drop-down.
pub fn document_type_value(document_type: DocumentType) -> &'static str {
	match document_type {
		DocumentType::CitizenId => "1",
		DocumentType::ForeignerId => "2",
	}
}

/// Companion role name. Unrecognized roles fall back to students.
pub fn role_name(role: &RoleCategory) -> &'static str {
	match role {
		RoleCategory::Staff => "Docentes",
		RoleCategory::Student | RoleCategory::Unrecognized(_) => "Estudiantes",
	}
}

/// Value of the hidden CSRF input in an HTML page, if present.
pub fn csrf_token(html: &str) -> Option<String> {
	let marker = format!("name=\"{CSRF_FIELD}\"");
	let at = html.find(&marker)?;
	let tag_start = html[..at].rfind('<')?;
	let tag_end = at + html[at..].find('>')?;
	let tag = &html[tag_start..tag_end];

	let value_at = tag.find("value=\"")? + "value=\"".len();
	let value_len = tag[value_at..].find('"')?;
	Some(tag[value_at..value_at + value_len].to_string())
}
