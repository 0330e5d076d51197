// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP delivery of welcome messages.
//!
//! Sends multipart (plain text + HTML) messages over STARTTLS with optional
//! authentication, and implements [`NotificationService`] for the
//! notification stage.

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use roster_config::NotificationConfig;
use roster_provisioning::{NotificationService, OutgoingMessage, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	#[error("connection failed: {0}")]
	Connection(String),

	#[error("send failed: {0}")]
	Send(String),

	#[error("invalid email address: {0}")]
	Address(String),
}

impl From<SmtpError> for ServiceError {
	fn from(e: SmtpError) -> Self {
		ServiceError::new(e.to_string())
	}
}

pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	/// Builds the transport. No connection is made until the first send.
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, use_tls = %config.use_tls)
	)]
	pub fn new(config: &NotificationConfig) -> Result<Self, SmtpError> {
		let from_mailbox = sender_mailbox(&config.from_name, &config.from_address)?;

		let builder = if config.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		};

		let mut builder = builder.port(config.port);
		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(
				username.clone(),
				password.expose().to_string(),
			));
		}

		tracing::debug!("SMTP client initialized");
		Ok(Self {
			transport: builder.build(),
			from_mailbox,
		})
	}

	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		let healthy = self
			.transport
			.test_connection()
			.await
			.map_err(|e| SmtpError::Connection(format!("{e}")))?;
		if !healthy {
			return Err(SmtpError::Connection(
				"server did not acknowledge NOOP".to_string(),
			));
		}
		tracing::debug!("SMTP server is healthy");
		Ok(())
	}

	#[tracing::instrument(
		name = "smtp_send_email",
		skip(self, body_html, body_text),
		fields(to = %to, subject = %subject)
	)]
	pub async fn send_email(
		&self,
		to: &str,
		subject: &str,
		body_html: &str,
		body_text: &str,
	) -> Result<(), SmtpError> {
		let message = build_message(self.from_mailbox.clone(), to, subject, body_html, body_text)?;

		self.transport
			.send(message)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;

		tracing::info!("email sent");
		Ok(())
	}
}

#[async_trait]
impl NotificationService for SmtpClient {
	async fn send(&self, message: &OutgoingMessage) -> Result<(), ServiceError> {
		self.send_email(&message.to, &message.subject, &message.html_body, &message.text_body)
			.await
			.map_err(ServiceError::from)
	}
}

fn sender_mailbox(name: &str, address: &str) -> Result<Mailbox, SmtpError> {
	let address: Address = address
		.parse()
		.map_err(|e| SmtpError::Address(format!("{address}: {e}")))?;
	let name = name.trim();
	Ok(Mailbox::new((!name.is_empty()).then(|| name.to_string()), address))
}

fn build_message(
	from: Mailbox,
	to: &str,
	subject: &str,
	body_html: &str,
	body_text: &str,
) -> Result<Message, SmtpError> {
	let to_mailbox: Mailbox = to.parse().map_err(|e| SmtpError::Address(format!("{to}: {e}")))?;

	Message::builder()
		.from(from)
		.to(to_mailbox)
		.subject(subject)
		.multipart(
			MultiPart::alternative()
				.singlepart(
					SinglePart::builder()
						.header(ContentType::TEXT_PLAIN)
						.body(body_text.to_string()),
				)
				.singlepart(
					SinglePart::builder()
						.header(ContentType::TEXT_HTML)
						.body(body_html.to_string()),
				),
		)
		.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))
}

/// Syntactic check of a bare address (`local@domain`, no display name).
pub fn is_valid_address(address: &str) -> bool {
	address.parse::<Address>().is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use roster_common_secret::SecretString;

	fn config() -> NotificationConfig {
		NotificationConfig {
			host: "smtp.example.edu".to_string(),
			port: 587,
			username: Some("mailer".to_string()),
			password: Some(SecretString::new("super-secret-password")),
			from_address: "noreply@example.edu".to_string(),
			from_name: "Roster".to_string(),
			use_tls: true,
			welcome_subject: "Welcome".to_string(),
		}
	}

	mod email_validation {
		use super::*;

		#[test]
		fn simple_address() {
			assert!(is_valid_address("user@example.com"));
		}

		#[test]
		fn display_name_is_not_an_address() {
			assert!(!is_valid_address("User Name <user@example.com>"));
		}

		#[test]
		fn plus_tag() {
			assert!(is_valid_address("user+tag@example.com"));
		}

		#[test]
		fn malformed() {
			for bad in ["", "userexample.com", "user@", "@example.com", "user@@example.com"] {
				assert!(!is_valid_address(bad), "{bad}");
			}
		}
	}

	mod client {
		use super::*;

		#[tokio::test]
		async fn builds_without_connecting() {
			assert!(SmtpClient::new(&config()).is_ok());
		}

		#[tokio::test]
		async fn plain_transport_when_tls_disabled() {
			let config = NotificationConfig {
				use_tls: false,
				username: None,
				password: None,
				..config()
			};
			assert!(SmtpClient::new(&config).is_ok());
		}

		#[tokio::test]
		async fn health_check_reports_unreachable_server() {
			let port = {
				let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
				listener.local_addr().unwrap().port()
			};
			let config = NotificationConfig {
				host: "127.0.0.1".to_string(),
				port,
				use_tls: false,
				username: None,
				password: None,
				..config()
			};
			let client = SmtpClient::new(&config).unwrap();
			assert!(matches!(client.check_health().await, Err(SmtpError::Connection(_))));
		}

		#[test]
		fn invalid_sender_is_rejected() {
			let config = NotificationConfig {
				from_address: "not-an-address".to_string(),
				..config()
			};
			assert!(matches!(SmtpClient::new(&config), Err(SmtpError::Address(_))));
		}

		#[test]
		fn config_debug_does_not_leak_password() {
			let debug = format!("{:?}", config());
			assert!(!debug.contains("super-secret-password"));
		}
	}

	mod message {
		use super::*;

		#[test]
		fn multipart_message_has_both_bodies() {
			let from = sender_mailbox("Roster", "noreply@example.edu").unwrap();
			let message = build_message(from, "ana@mail.test", "Welcome", "<p>Hi</p>", "Hi").unwrap();
			let raw = String::from_utf8(message.formatted()).unwrap();
			assert!(raw.contains("text/plain"));
			assert!(raw.contains("text/html"));
			assert!(raw.contains("To: ana@mail.test"));
		}

		#[test]
		fn invalid_recipient_is_rejected() {
			let from = sender_mailbox("Roster", "noreply@example.edu").unwrap();
			let err = build_message(from, "nobody", "Welcome", "", "").unwrap_err();
			assert!(matches!(err, SmtpError::Address(_)));
		}

		#[test]
		fn empty_sender_name_is_omitted() {
			let mailbox = sender_mailbox("  ", "noreply@example.edu").unwrap();
			assert_eq!(mailbox.name, None);
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn generated_addresses_are_valid(
				local in "[a-z][a-z0-9.]{0,20}[a-z0-9]",
				domain in "[a-z][a-z0-9]{0,15}",
				tld in "(edu|com|org)"
			) {
				prop_assume!(!local.contains(".."));
				let address = format!("{local}@{domain}.{tld}");
				prop_assert!(is_valid_address(&address), "expected valid: {}", address);
			}

			#[test]
			fn no_at_symbol_is_invalid(s in "[a-zA-Z0-9._%+-]{1,50}") {
				prop_assert!(!is_valid_address(&s));
			}
		}
	}
}
