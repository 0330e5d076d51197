// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity resolution for roster.
//!
//! Deciding whether an onboarding candidate already has an institutional
//! address, and minting a collision-free one when they do not:
//!
//! - [`normalize`]: canonical forms of free-text person names
//! - [`DuplicateIdentityMatcher`]: exact lookup of a candidate's sorted name
//!   tokens against the directory roster
//! - [`EmailAllocator`]: deterministic `given.family@domain` allocation with
//!   letter and numeric suffix fallbacks
//! - [`ExistingIdentityIndex`]: both of the above, built once per batch

mod allocator;
mod error;
mod index;
mod matcher;
pub mod normalize;

pub use allocator::{AddressRegistry, EmailAllocator, MAX_NUMERIC_SUFFIX};
pub use error::{IdentityError, Result};
pub use index::{ExistingIdentity, ExistingIdentityIndex};
pub use matcher::{DuplicateIdentityMatcher, MatchOutcome};
pub use normalize::{NormalizeMode, NormalizedNameKey};
