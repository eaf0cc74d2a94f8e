use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use digest::Digest;
use sha2::Sha256;
use thiserror::Error;

/// SHA-256 digest of a payload.
///
/// The canonical textual form is standard base64 with padding, which is what
/// remote responses carry. A hex form is accepted as well for hand-written
/// fixtures and diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentChecksum([u8; Self::LEN]);

impl ContentChecksum {
    /// Length of the digest in bytes.
    pub const LEN: usize = 32;

    /// Computes the checksum of `content`.
    #[must_use]
    pub fn compute(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    /// Wraps raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a checksum from a slice that must be exactly [`Self::LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ChecksumParseError> {
        <[u8; Self::LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| ChecksumParseError::Length { len: bytes.len() })
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Parses the base64 form used on the wire.
    pub fn from_base64(text: &str) -> Result<Self, ChecksumParseError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|_| ChecksumParseError::Encoding)?;
        Self::from_slice(&bytes)
    }

    /// Renders the base64 form used on the wire.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parses a 64 character hex string (either case).
    pub fn from_hex(text: &str) -> Result<Self, ChecksumParseError> {
        let text = text.trim();
        if text.len() != Self::LEN * 2 {
            return Err(ChecksumParseError::Length { len: text.len() / 2 });
        }
        let mut out = [0u8; Self::LEN];
        for (slot, pair) in out.iter_mut().zip(text.as_bytes().chunks_exact(2)) {
            let high = hex_value(pair[0]).ok_or(ChecksumParseError::Encoding)?;
            let low = hex_value(pair[1]).ok_or(ChecksumParseError::Encoding)?;
            *slot = (high << 4) | low;
        }
        Ok(Self(out))
    }

    /// Renders the lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::with_capacity(Self::LEN * 2);
        for byte in self.0 {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for ContentChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for ContentChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentChecksum({})", self.to_hex())
    }
}

impl FromStr for ContentChecksum {
    type Err = ChecksumParseError;

    /// Accepts the hex form when the input is exactly 64 hex digits and the
    /// base64 form otherwise.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.len() == Self::LEN * 2 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            Self::from_hex(trimmed)
        } else {
            Self::from_base64(trimmed)
        }
    }
}

/// Failure to interpret a textual or raw checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ChecksumParseError {
    /// The text is not valid base64 or hex.
    #[error("checksum is not valid base64 or hex")]
    Encoding,
    /// The decoded digest has the wrong number of bytes.
    #[error("checksum must be {expected} bytes, got {len}", expected = ContentChecksum::LEN)]
    Length {
        /// Number of decoded bytes.
        len: usize,
    },
}

/// Declared and computed checksums disagree.
///
/// This always means corrupt content. Callers must not retry with the same
/// bytes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// The computed digest differs from the declared one.
    #[error("checksum mismatch over {len} bytes: expected {expected}, computed {actual}")]
    Mismatch {
        /// Declared checksum.
        expected: ContentChecksum,
        /// Checksum of the bytes actually received.
        actual: ContentChecksum,
        /// Number of bytes that were hashed.
        len: usize,
    },
}

/// Verifies `content` against an optional declared checksum.
///
/// Content without a declared checksum is accepted as is.
pub fn verify(content: &[u8], expected: Option<&ContentChecksum>) -> Result<(), IntegrityError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = ContentChecksum::compute(content);
    if actual == *expected {
        Ok(())
    } else {
        Err(IntegrityError::Mismatch {
            expected: *expected,
            actual,
            len: content.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_HEX: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(ContentChecksum::compute(b"").to_hex(), EMPTY_HEX);
    }

    #[test]
    fn hex_and_base64_forms_agree() {
        let checksum = ContentChecksum::compute(b"abc");
        let from_hex = ContentChecksum::from_hex(&checksum.to_hex()).expect("hex parses");
        let from_b64 = ContentChecksum::from_base64(&checksum.to_base64()).expect("b64 parses");
        assert_eq!(from_hex, checksum);
        assert_eq!(from_b64, checksum);
    }

    #[test]
    fn from_str_detects_form() {
        let hex: ContentChecksum = EMPTY_HEX.parse().expect("hex");
        let b64: ContentChecksum = hex.to_base64().parse().expect("base64");
        assert_eq!(hex, b64);
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let parsed = ContentChecksum::from_hex(&EMPTY_HEX.to_ascii_uppercase()).expect("hex");
        assert_eq!(parsed.to_hex(), EMPTY_HEX);
    }

    #[test]
    fn short_digest_is_rejected() {
        let short = STANDARD.encode([0u8; 16]);
        assert_eq!(
            ContentChecksum::from_base64(&short),
            Err(ChecksumParseError::Length { len: 16 })
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            ContentChecksum::from_base64("not base64!!"),
            Err(ChecksumParseError::Encoding)
        );
        assert!(ContentChecksum::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn verify_without_declared_checksum_passes() {
        assert!(verify(b"anything", None).is_ok());
    }

    #[test]
    fn verify_reports_mismatch_details() {
        let declared = ContentChecksum::compute(b"original");
        let err = verify(b"tampered", Some(&declared)).expect_err("mismatch");
        let IntegrityError::Mismatch {
            expected,
            actual,
            len,
        } = err;
        assert_eq!(expected, declared);
        assert_eq!(actual, ContentChecksum::compute(b"tampered"));
        assert_eq!(len, 8);
    }
}
