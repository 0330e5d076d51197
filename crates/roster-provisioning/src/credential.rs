// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Temporary credentials for new directory accounts.

use rand::seq::SliceRandom;
use rand::Rng;
use roster_common_secret::SecretString;

pub use roster_config::MIN_CREDENTIAL_LENGTH;

// Look-alike characters (0/O, 1/l/I) are left out.
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghjkmnpqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"@#$%&*+=?";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
	#[error("credential length {length} is below the minimum of {MIN_CREDENTIAL_LENGTH}")]
	TooShort { length: usize },
}

/// Generates credentials with at least one character of every class.
#[derive(Debug, Clone, Copy)]
pub struct CredentialGenerator {
	length: usize,
}

impl CredentialGenerator {
	pub fn new(length: usize) -> Result<Self, CredentialError> {
		if length < MIN_CREDENTIAL_LENGTH {
			return Err(CredentialError::TooShort { length });
		}
		Ok(Self { length })
	}

	pub fn length(&self) -> usize {
		self.length
	}

	pub fn generate(&self) -> SecretString {
		self.generate_with(&mut rand::thread_rng())
	}

	pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> SecretString {
		let classes = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS];
		let all: Vec<u8> = classes.concat();

		let mut chars: Vec<u8> = classes
			.iter()
			.filter_map(|class| class.choose(rng).copied())
			.collect();
		while chars.len() < self.length {
			if let Some(c) = all.choose(rng) {
				chars.push(*c);
			}
		}
		chars.shuffle(rng);

		SecretString::new(chars.into_iter().map(char::from).collect::<String>())
	}
}
