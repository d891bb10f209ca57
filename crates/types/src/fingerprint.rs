use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of raw bytes in a content digest.
pub const FINGERPRINT_BYTES: usize = 32;
/// Expected string length of an encoded fingerprint (64 lowercase hex chars).
pub const FINGERPRINT_STRING_LENGTH: usize = FINGERPRINT_BYTES * 2;

/// Errors that can occur when parsing a fingerprint string.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("fingerprint must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("fingerprint is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Hexadecimal content digest of a user-selected file.
///
/// Compared by equality only. The empty string is a valid sentinel meaning
/// "no file selected yet"; every non-empty value is the lowercase hex
/// encoding of a 32-byte digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The "no file selected yet" sentinel.
    pub fn empty() -> Self {
        Fingerprint(String::new())
    }

    /// Encode a raw 32-byte digest as a fingerprint.
    pub fn from_digest(digest: [u8; FINGERPRINT_BYTES]) -> Self {
        Fingerprint(hex::encode(digest))
    }

    /// Parse a fingerprint string. Uppercase hex is normalised to lowercase;
    /// the empty string parses to the sentinel.
    pub fn from_hex(hex_str: &str) -> Result<Self, FingerprintError> {
        if hex_str.is_empty() {
            return Ok(Self::empty());
        }
        if hex_str.len() != FINGERPRINT_STRING_LENGTH {
            return Err(FingerprintError::InvalidLength {
                expected: FINGERPRINT_STRING_LENGTH,
                actual: hex_str.len(),
            });
        }
        let bytes = hex::decode(hex_str)?;
        Ok(Fingerprint(hex::encode(bytes)))
    }

    /// Whether this is the "no file selected" sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Fingerprint::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_digest_is_lowercase_hex() {
        let fp = Fingerprint::from_digest([0xAB; 32]);
        assert_eq!(fp.as_str(), "ab".repeat(32));
        assert!(!fp.is_empty());
    }

    #[test]
    fn empty_sentinel_roundtrips() {
        let fp = Fingerprint::empty();
        assert!(fp.is_empty());
        assert_eq!(Fingerprint::from_hex("").unwrap(), fp);
    }

    #[test]
    fn from_hex_normalises_case() {
        let upper = "AB".repeat(32);
        let fp = Fingerprint::from_hex(&upper).unwrap();
        assert_eq!(fp.as_str(), "ab".repeat(32));
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(
            Fingerprint::from_hex("abc123"),
            Err(FingerprintError::InvalidLength { actual: 6, .. })
        ));
        let not_hex = "zz".repeat(32);
        assert!(matches!(
            Fingerprint::from_hex(&not_hex),
            Err(FingerprintError::InvalidHex(_))
        ));
    }

    #[test]
    fn serde_as_plain_string() {
        let fp = Fingerprint::from_digest([7u8; 32]);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.as_str()));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }
}
