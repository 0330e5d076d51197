// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for credentials handled during a provisioning run.
//!
//! Directory client secrets, SMTP passwords, companion-application passwords
//! and the temporary credentials issued to new members all travel through the
//! pipeline as [`SecretString`]. The wrapper:
//!
//! - prints `[REDACTED]` through both `Debug` and `Display`, so structured
//!   logging (`info!(password = %secret)`) never leaks the value
//! - serializes as `"[REDACTED]"`
//! - zeroizes its buffer on drop
//! - hands the value out only through [`SecretString::expose`]
//!
//! ```
//! use roster_common_secret::SecretString;
//!
//! let credential = SecretString::new("Xk7#pQ2m@Lz9".to_string());
//! assert_eq!(format!("{credential}"), "[REDACTED]");
//! assert_eq!(credential.expose(), "Xk7#pQ2m@Lz9");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise be rendered.
pub const REDACTED: &str = "[REDACTED]";

/// A string that must not appear in logs, reports or config dumps unless a
/// call site explicitly asks for it.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretString {
	inner: String,
}

impl SecretString {
	pub fn new(inner: impl Into<String>) -> Self {
		Self {
			inner: inner.into(),
		}
	}

	/// Borrow the plain value. Every call site is a deliberate disclosure.
	pub fn expose(&self) -> &str {
		&self.inner
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}
}

impl Clone for SecretString {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl Eq for SecretString {}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{SecretString, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	impl Serialize for SecretString {
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de> Deserialize<'de> for SecretString {
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			String::deserialize(deserializer).map(SecretString::new)
		}
	}
}
