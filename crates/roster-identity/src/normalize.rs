// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Canonical forms of person names.
//!
//! Two modes share the same front half (lower-case, canonical decomposition,
//! combining marks dropped, remaining special letters folded to Latin):
//!
//! - [`NormalizeMode::Address`] keeps only ASCII letters and digits, so the
//!   result can be used directly in an address local part.
//! - [`NormalizeMode::Comparison`] keeps alphanumerics separated by single
//!   spaces, for building [`NormalizedNameKey`]s.
//!
//! ```
//! use roster_identity::normalize::{normalize, NormalizeMode};
//!
//! assert_eq!(normalize("María José", NormalizeMode::Address), "mariajose");
//! assert_eq!(normalize("  María   José ", NormalizeMode::Comparison), "maria jose");
//! ```

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
	Address,
	Comparison,
}

/// Lookup key for a person: the sorted multiset of their normalized name
/// tokens, space-joined. Only ever compared, never shown to anyone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedNameKey(String);

impl NormalizedNameKey {
	/// Key for a candidate given separately as given names and family names.
	pub fn from_parts(given: &str, family: &str) -> Self {
		Self::from_display_name(&format!("{given} {family}"))
	}

	/// Key for a single free-text display name, as stored in the directory.
	pub fn from_display_name(display_name: &str) -> Self {
		let normalized = normalize(display_name, NormalizeMode::Comparison);
		let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
		tokens.sort_unstable();
		Self(tokens.join(" "))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Normalize free text according to `mode`. Empty input yields empty output.
pub fn normalize(text: &str, mode: NormalizeMode) -> String {
	if text.is_empty() {
		return String::new();
	}

	let folded: String = text
		.to_lowercase()
		.nfd()
		.filter(|c| !is_combining_mark(*c))
		.flat_map(fold_special_letter)
		.collect();

	match mode {
		NormalizeMode::Address => folded.chars().filter(char::is_ascii_alphanumeric).collect(),
		NormalizeMode::Comparison => {
			let kept: String = folded
				.chars()
				.map(|c| if c.is_whitespace() { ' ' } else { c })
				.filter(|c| c.is_alphanumeric() || *c == ' ')
				.collect();
			kept.split_whitespace().collect::<Vec<_>>().join(" ")
		}
	}
}

/// Letters that survive decomposition without a combining mark to strip.
fn fold_special_letter(c: char) -> FoldedChars {
	let replacement: &'static str = match c {
		'ñ' => "n",
		'ü' => "u",
		'ø' => "o",
		'đ' | 'ð' => "d",
		'ł' => "l",
		'ı' => "i",
		'ß' => "ss",
		'æ' => "ae",
		'œ' => "oe",
		'þ' => "th",
		_ => return FoldedChars::One(Some(c)),
	};
	FoldedChars::Many(replacement.chars())
}

enum FoldedChars {
	One(Option<char>),
	Many(std::str::Chars<'static>),
}

impl Iterator for FoldedChars {
	type Item = char;

	fn next(&mut self) -> Option<char> {
		match self {
			FoldedChars::One(c) => c.take(),
			FoldedChars::Many(chars) => chars.next(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod address_mode {
		use super::*;

		#[test]
		fn strips_accents_and_spaces() {
			assert_eq!(normalize("María José", NormalizeMode::Address), "mariajose");
			assert_eq!(normalize("Núñez", NormalizeMode::Address), "nunez");
			assert_eq!(normalize("Müller", NormalizeMode::Address), "muller");
		}

		#[test]
		fn drops_punctuation() {
			assert_eq!(normalize("O'Connor-Smith", NormalizeMode::Address), "oconnorsmith");
		}

		#[test]
		fn folds_letters_without_marks() {
			assert_eq!(normalize("Søren", NormalizeMode::Address), "soren");
			assert_eq!(normalize("Łukasz", NormalizeMode::Address), "lukasz");
			assert_eq!(normalize("Strauß", NormalizeMode::Address), "strauss");
		}

		#[test]
		fn empty_stays_empty() {
			assert_eq!(normalize("", NormalizeMode::Address), "");
			assert_eq!(normalize("   ", NormalizeMode::Address), "");
		}
	}

	mod comparison_mode {
		use super::*;

		#[test]
		fn collapses_whitespace() {
			assert_eq!(
				normalize("  Laura\t Sofía  ", NormalizeMode::Comparison),
				"laura sofia"
			);
		}

		#[test]
		fn keeps_single_spaces_after_dropping_symbols() {
			assert_eq!(normalize("Ana - María", NormalizeMode::Comparison), "ana maria");
		}
	}

	mod keys {
		use super::*;

		#[test]
		fn tokens_are_sorted() {
			let key = NormalizedNameKey::from_parts("Laura Sofia", "Becerra Sandoval");
			assert_eq!(key.as_str(), "becerra laura sandoval sofia");
		}

		#[test]
		fn field_order_mistakes_do_not_matter() {
			let a = NormalizedNameKey::from_parts("Laura Sofia", "Becerra Sandoval");
			let b = NormalizedNameKey::from_parts("Becerra Sandoval", "Laura Sofia");
			let c = NormalizedNameKey::from_display_name("Sofía LAURA Sandoval  Becerra");
			assert_eq!(a, b);
			assert_eq!(a, c);
		}

		#[test]
		fn one_character_difference_is_a_different_key() {
			let a = NormalizedNameKey::from_parts("Laura", "Becerra");
			let b = NormalizedNameKey::from_parts("Laura", "Becera");
			assert_ne!(a, b);
		}

		#[test]
		fn repeated_tokens_are_kept() {
			let key = NormalizedNameKey::from_parts("Juan", "Juan Perez");
			assert_eq!(key.as_str(), "juan juan perez");
		}
	}

	proptest! {
		#[test]
		fn address_mode_is_ascii_alphanumeric(s in "\\PC{0,40}") {
			let out = normalize(&s, NormalizeMode::Address);
			prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric()));
		}

		#[test]
		fn normalization_is_idempotent(s in "[a-zA-ZÀ-ÿ0-9 ,.'-]{0,40}") {
			let once = normalize(&s, NormalizeMode::Comparison);
			prop_assert_eq!(normalize(&once, NormalizeMode::Comparison), once.clone());
			let addr = normalize(&s, NormalizeMode::Address);
			prop_assert_eq!(normalize(&addr, NormalizeMode::Address), addr.clone());
		}

		#[test]
		fn key_ignores_token_order(mut tokens in prop::collection::vec("[a-zA-Záéíóúñ]{1,8}", 1..6)) {
			let forward = NormalizedNameKey::from_display_name(&tokens.join(" "));
			tokens.reverse();
			let split = tokens.len() / 2;
			let given = tokens[..split].join(" ");
			let family = tokens[split..].join(" ");
			prop_assert_eq!(forward, NormalizedNameKey::from_parts(&given, &family));
		}
	}
}
