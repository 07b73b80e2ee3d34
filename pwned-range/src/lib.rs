//! Password exposure checks against the Have I Been Pwned range API.
//!
//! The checker uses k-anonymity: a password is SHA-1 hashed, only the first 5
//! hex characters of the digest are sent to the range endpoint, and the
//! remaining 35 are matched locally against the returned `SUFFIX:COUNT` lines.
//! Requests ask for padded responses, so the number of lines returned says
//! nothing about how often the prefix occurs.
//!
//! The range service sits behind the [`RangeClient`] trait so the HTTP client
//! is built once and injected; [`HibpClient`] is the reqwest-backed default.

pub mod checker;
pub mod client;
pub mod credential;
pub mod digest;
pub mod error;
pub mod range;

pub use checker::{Outcome, PasswordExposureChecker, RATE_LIMITED_STATUS, TRANSPORT_FAILURE_STATUS};
pub use client::{HibpClient, RangeClient, RangeClientConfig};
pub use credential::{CredentialFormat, CredentialInput, InvalidInput, PASSWORD_CREDENTIAL_TYPE};
pub use digest::PasswordDigest;
pub use error::LookupError;
pub use range::find_occurrences;

/// The length of the hash prefix sent to the range API (5 hex characters).
pub const PREFIX_LEN: usize = 5;

/// The length of an uppercase hex SHA-1 digest.
pub const DIGEST_HEX_LEN: usize = 40;

/// Hex lookup table for digest conversion.
pub const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
