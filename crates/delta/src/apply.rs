use checksums::verify;
use logging::trace_delta;

use crate::error::PatchError;
use crate::format::{PatchReader, TokenRef};

/// Applies `patch` to `base`, producing the target snapshot bytes.
///
/// The base is checked against the header before any token is read, and the
/// result is checked against the header before it is returned. Output growth
/// stops as soon as it would exceed the declared target length, so a hostile
/// patch cannot inflate memory beyond what its header admits.
///
/// # Errors
///
/// Returns a [`PatchError`] when the patch is malformed, was built for a
/// different base, or does not reproduce the declared target.
pub fn apply_patch(base: &[u8], patch: &[u8]) -> Result<Vec<u8>, PatchError> {
    let mut reader = PatchReader::new(patch)?;
    let header = reader.header;

    let base_len = base.len() as u64;
    if header.base_len != base_len {
        return Err(PatchError::IncompatibleBase {
            expected_len: header.base_len,
            actual_len: base_len,
        });
    }
    verify(base, Some(&header.base_checksum)).map_err(PatchError::BaseChecksum)?;

    let block_len = u64::from(header.block_len);
    let capacity = header.target_len.min(base_len + patch.len() as u64);
    let mut output = Vec::with_capacity(capacity as usize);
    let mut tokens = 0usize;

    while let Some(token) = reader.next_token()? {
        tokens += 1;
        let piece = match token {
            TokenRef::Literal(bytes) => bytes,
            TokenRef::Copy { index, len } => {
                let out_of_bounds = PatchError::CopyOutOfBounds {
                    index,
                    len,
                    base_len,
                };
                let start = index.checked_mul(block_len).ok_or(out_of_bounds.clone())?;
                let end = start
                    .checked_add(u64::from(len))
                    .filter(|&end| end <= base_len)
                    .ok_or(out_of_bounds)?;
                &base[start as usize..end as usize]
            }
        };

        let produced = output.len() as u64 + piece.len() as u64;
        if produced > header.target_len {
            return Err(PatchError::TargetLength {
                expected: header.target_len,
                actual: produced,
            });
        }
        output.extend_from_slice(piece);
    }

    if output.len() as u64 != header.target_len {
        return Err(PatchError::TargetLength {
            expected: header.target_len,
            actual: output.len() as u64,
        });
    }
    verify(&output, Some(&header.target_checksum)).map_err(PatchError::TargetChecksum)?;

    trace_delta!(
        "applied patch: {} tokens, {} -> {} bytes, target {}",
        tokens,
        base_len,
        output.len(),
        header.target_checksum
    );
    Ok(output)
}
