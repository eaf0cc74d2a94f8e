//! crates/engine/src/wire.rs
//!
//! Remote document format.
//!
//! Both documents are camelCase JSON. Binary payloads are base64 and the
//! optional checksum is the base64 SHA-256 of the decoded payload bytes, so
//! corruption is caught before any inflation or patching.
//!
//! ```text
//! Symbols_V1/Latest.json          {"content": b64(zlib(snapshot)), "checksum": b64?}
//! Symbols_V1/<version>_Patch.json {"upToDate": true}
//!                                 {"tooOld": true}
//!                                 {"content": b64(patch), "checksum": b64?}
//! ```

use std::io::{self, Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use checksums::{ChecksumParseError, ContentChecksum};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory of the current format revision.
pub const FORMAT_DIR: &str = "Symbols_V1";

/// Path of the full snapshot document.
#[must_use]
pub fn full_snapshot_path() -> String {
    format!("{FORMAT_DIR}/Latest.json")
}

/// Path of the patch document for a local snapshot at `version`.
#[must_use]
pub fn patch_path(version: &str) -> String {
    format!("{FORMAT_DIR}/{version}_Patch.json")
}

/// Malformed remote documents. Every variant is corrupt content.
#[derive(Debug, Error)]
pub enum WireError {
    /// The body is not the expected JSON document.
    #[error("malformed {document} document: {source}")]
    Json {
        /// Which document was being read.
        document: &'static str,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The payload is not valid base64.
    #[error("content is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The checksum field cannot be parsed.
    #[error("checksum field is unusable: {0}")]
    Checksum(#[from] ChecksumParseError),
    /// The snapshot payload does not inflate.
    #[error("snapshot does not inflate: {0}")]
    Inflate(#[source] io::Error),
    /// The inflated snapshot exceeds the configured ceiling.
    #[error("inflated snapshot exceeds {limit} bytes")]
    TooLarge {
        /// Configured ceiling.
        limit: usize,
    },
    /// A patch document carries no tag or more than one.
    #[error("patch document must carry exactly one of upToDate, tooOld, content; found {tags}")]
    Descriptor {
        /// Number of tags present.
        tags: usize,
    },
}

/// Full snapshot document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResponse {
    /// Base64 of the zlib-compressed snapshot.
    pub content: String,
    /// Base64 SHA-256 of the decoded `content` bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Patch document as transmitted. Use [`parse_patch`] to validate it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    /// The local snapshot is current.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub up_to_date: bool,
    /// The local snapshot is too old to patch.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub too_old: bool,
    /// Base64 of the patch bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Base64 SHA-256 of the decoded `content` bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Validated patch document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchDescriptor {
    /// Nothing to do.
    UpToDate,
    /// Download the full snapshot instead.
    TooOld,
    /// Apply these patch bytes.
    Delta {
        /// Decoded patch bytes.
        bytes: Vec<u8>,
        /// Expected checksum of `bytes`.
        checksum: Option<ContentChecksum>,
    },
}

/// Decoded full snapshot document, not yet verified or inflated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullPayload {
    /// Decoded `content` bytes (still compressed).
    pub compressed: Vec<u8>,
    /// Expected checksum of `compressed`.
    pub checksum: Option<ContentChecksum>,
}

/// Parses a full snapshot document.
pub fn parse_full(body: &[u8]) -> Result<FullPayload, WireError> {
    let response: FullResponse = serde_json::from_slice(body).map_err(|source| WireError::Json {
        document: "snapshot",
        source,
    })?;
    Ok(FullPayload {
        compressed: STANDARD.decode(response.content)?,
        checksum: parse_checksum(response.checksum.as_deref())?,
    })
}

/// Parses and validates a patch document.
pub fn parse_patch(body: &[u8]) -> Result<PatchDescriptor, WireError> {
    let response: PatchResponse = serde_json::from_slice(body).map_err(|source| WireError::Json {
        document: "patch",
        source,
    })?;
    let tags = usize::from(response.up_to_date)
        + usize::from(response.too_old)
        + usize::from(response.content.is_some());
    if tags != 1 {
        return Err(WireError::Descriptor { tags });
    }

    if response.up_to_date {
        return Ok(PatchDescriptor::UpToDate);
    }
    if response.too_old {
        return Ok(PatchDescriptor::TooOld);
    }
    let content = response.content.unwrap_or_default();
    Ok(PatchDescriptor::Delta {
        bytes: STANDARD.decode(content)?,
        checksum: parse_checksum(response.checksum.as_deref())?,
    })
}

fn parse_checksum(text: Option<&str>) -> Result<Option<ContentChecksum>, WireError> {
    text.map(ContentChecksum::from_base64).transpose().map_err(WireError::from)
}

/// Inflates zlib `compressed` bytes, refusing output larger than `limit`.
pub fn inflate(compressed: &[u8], limit: usize) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).min(limit));
    let ceiling = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    ZlibDecoder::new(compressed)
        .take(ceiling)
        .read_to_end(&mut out)
        .map_err(WireError::Inflate)?;
    if out.len() > limit {
        return Err(WireError::TooLarge { limit });
    }
    Ok(out)
}

/// Compresses `snapshot` with zlib.
pub fn deflate(snapshot: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(snapshot.len() / 2), Compression::default());
    encoder.write_all(snapshot)?;
    encoder.finish()
}

impl FullResponse {
    /// Builds the document for `snapshot`, with checksum.
    pub fn for_snapshot(snapshot: &[u8]) -> io::Result<Self> {
        let compressed = deflate(snapshot)?;
        Ok(Self {
            checksum: Some(ContentChecksum::compute(&compressed).to_base64()),
            content: STANDARD.encode(compressed),
        })
    }
}

impl PatchResponse {
    /// `{"upToDate": true}`
    #[must_use]
    pub fn up_to_date() -> Self {
        Self {
            up_to_date: true,
            ..Self::default()
        }
    }

    /// `{"tooOld": true}`
    #[must_use]
    pub fn too_old() -> Self {
        Self {
            too_old: true,
            ..Self::default()
        }
    }

    /// Builds a delta document for `patch`, with checksum.
    #[must_use]
    pub fn delta(patch: &[u8]) -> Self {
        Self {
            content: Some(STANDARD.encode(patch)),
            checksum: Some(ContentChecksum::compute(patch).to_base64()),
            ..Self::default()
        }
    }
}
