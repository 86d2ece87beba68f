//! Deterministic cache keys for render requests.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex digits in the textual form of a fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Cache key derived from every field of a render request that affects the
/// rendered output.
///
/// Fingerprints are stable across processes and sessions: they are the first
/// eight bytes of a SHA-256 digest over a canonical encoding of the request,
/// so the durable cache can recover them from file names on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Wraps a raw fingerprint value.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw fingerprint value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Digests a canonical byte encoding into a fingerprint.
    pub(crate) fn digest(canonical: &[u8]) -> Self {
        let digest = Sha256::digest(canonical);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(prefix))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Error parsing a fingerprint from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid fingerprint '{0}' - expected {FINGERPRINT_HEX_LEN} hex digits")]
pub struct FingerprintParseError(String);

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != FINGERPRINT_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FingerprintParseError(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| FingerprintParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_zero_padded_hex() {
        assert_eq!(Fingerprint::from_raw(0xab).to_string(), "00000000000000ab");
    }

    #[test]
    fn test_parse_display_form() {
        let fp = Fingerprint::from_raw(0x0123_4567_89ab_cdef);
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        assert_eq!(parsed, fp);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("abc".parse::<Fingerprint>().is_err());
        assert!("00000000000000000".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!("000000000000000g".parse::<Fingerprint>().is_err());
        assert!("+00000000000000f".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(Fingerprint::digest(b"tile"), Fingerprint::digest(b"tile"));
        assert_ne!(Fingerprint::digest(b"tile"), Fingerprint::digest(b"tiles"));
    }

    #[test]
    fn test_digest_known_value() {
        // SHA-256("abc") = ba7816bf8f01cfea...
        assert_eq!(
            Fingerprint::digest(b"abc").to_string(),
            "ba7816bf8f01cfea"
        );
    }
}
