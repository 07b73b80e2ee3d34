use sha1::{Digest, Sha1};

use crate::{DIGEST_HEX_LEN, HEX_CHARS, PREFIX_LEN};

/// Uppercase hex SHA-1 of a plaintext password, split at the range boundary.
///
/// The first [`PREFIX_LEN`] characters are sent to the range API; the
/// remaining 35 never leave the process.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PasswordDigest {
    hex: [u8; DIGEST_HEX_LEN],
}

impl PasswordDigest {
    /// Hashes the UTF-8 bytes of `plaintext`.
    pub fn of(plaintext: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(plaintext.as_bytes());
        let hash: [u8; 20] = hasher.finalize().into();

        Self { hex: digest_to_hex(&hash) }
    }

    /// All 40 hex characters.
    pub fn as_str(&self) -> &str {
        // `hex` only ever holds bytes from HEX_CHARS.
        std::str::from_utf8(&self.hex).unwrap_or_default()
    }

    /// The 5-character range prefix.
    pub fn prefix(&self) -> &str {
        &self.as_str()[..PREFIX_LEN]
    }

    /// The 35-character suffix matched locally against the range body.
    pub fn suffix(&self) -> &str {
        &self.as_str()[PREFIX_LEN..]
    }
}

// Manual impl so the digest of a password doesn't end up in debug logs in full.
impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordDigest").field("prefix", &self.prefix()).finish_non_exhaustive()
    }
}

/// Convert a raw 20-byte SHA-1 to 40 uppercase hex chars (stack allocated)
#[inline]
pub fn digest_to_hex(hash: &[u8; 20]) -> [u8; DIGEST_HEX_LEN] {
    let mut out = [0u8; DIGEST_HEX_LEN];
    for (i, byte) in hash.iter().enumerate() {
        out[i * 2] = HEX_CHARS[(byte >> 4) as usize];
        out[i * 2 + 1] = HEX_CHARS[(byte & 0x0f) as usize];
    }
    out
}
