// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Welcome message sent to a new member's personal address.

use roster_common_secret::SecretString;

use crate::record::ProvisionedRecord;
use crate::services::OutgoingMessage;

/// Everything the message shows. Secrets are exposed only while rendering.
#[derive(Debug, Clone)]
pub struct WelcomeDetails<'a> {
	pub display_name: String,
	pub institutional_address: &'a str,
	pub credential: &'a SecretString,
	pub document_number: &'a str,
	pub companion_password: Option<&'a SecretString>,
}

impl<'a> WelcomeDetails<'a> {
	/// `None` unless the record has both an address and a credential.
	pub fn from_record(
		record: &'a ProvisionedRecord,
		companion_password: Option<&'a SecretString>,
	) -> Option<Self> {
		Some(Self {
			display_name: record.display_name(),
			institutional_address: record.institutional_address.as_deref()?,
			credential: record.credential.as_ref()?,
			document_number: &record.candidate.document_number,
			companion_password,
		})
	}
}

pub fn render_welcome(to: &str, subject: &str, details: &WelcomeDetails<'_>) -> OutgoingMessage {
	let name = escape_html(&details.display_name);
	let address = escape_html(details.institutional_address);
	let credential = escape_html(details.credential.expose());
	let document = escape_html(details.document_number);
	let title = escape_html(subject);

	let companion_html = details
		.companion_password
		.map(|password| {
			format!(
				r#"
    <h2 style="font-size: 18px; margin-top: 24px;">Companion application</h2>
    <p>Username: <strong>{document}</strong><br>Password: <strong>{}</strong></p>"#,
				escape_html(password.expose())
			)
		})
		.unwrap_or_default();

	let html_body = format!(
		r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #1a1a1a; font-size: 24px; margin-bottom: 20px;">Welcome, {name}</h1>
    <p>Your institutional account is ready.</p>
    <p>Address: <strong>{address}</strong><br>Temporary password: <strong>{credential}</strong></p>
    <p style="color: #666; font-size: 14px;">You will be asked to change the password at first sign-in.</p>{companion_html}
</body>
</html>"#,
	);

	let mut text_body = format!(
		"Welcome, {}\n\nYour institutional account is ready.\n\nAddress: {}\nTemporary password: {}\n\nYou will be asked to change the password at first sign-in.\n",
		details.display_name,
		details.institutional_address,
		details.credential.expose(),
	);
	if let Some(password) = details.companion_password {
		text_body.push_str(&format!(
			"\nCompanion application\nUsername: {}\nPassword: {}\n",
			details.document_number,
			password.expose()
		));
	}

	OutgoingMessage {
		to: to.to_string(),
		subject: subject.to_string(),
		html_body,
		text_body,
	}
}

fn escape_html(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}
