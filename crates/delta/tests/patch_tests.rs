//! Patch generation and application tests.
//!
//! Coverage:
//! 1. Generated patches rebuild the target for typical snapshot edits
//! 2. Application is deterministic for the same (base, patch) pair
//! 3. Patches refuse to apply to any other base

use delta::{
    DEFAULT_BLOCK_LEN, PatchError, PatchGenerator, apply_patch, generate_patch, inspect_patch,
};
use proptest::prelude::*;

fn snapshot(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

// ============================================================================
// Typical edits
// ============================================================================

#[test]
fn appended_entries_are_mostly_copied() {
    let old = snapshot(64 * 1024, 1);
    let mut new = old.clone();
    new.extend_from_slice(&snapshot(1024, 2));

    let patch = generate_patch(&old, &new, DEFAULT_BLOCK_LEN);
    assert!(patch.len() < 4 * 1024, "patch is {} bytes", patch.len());
    assert_eq!(apply_patch(&old, &patch).expect("apply"), new);
}

#[test]
fn inserted_bytes_shift_later_blocks() {
    let old = snapshot(32 * 1024, 3);
    let mut new = old[..5000].to_vec();
    new.extend_from_slice(b"inserted symbol entry");
    new.extend_from_slice(&old[5000..]);

    let patch = generate_patch(&old, &new, 512);
    assert!(patch.len() < 2 * 1024, "patch is {} bytes", patch.len());
    assert_eq!(apply_patch(&old, &patch).expect("apply"), new);
}

#[test]
fn removed_range_is_skipped() {
    let old = snapshot(16 * 1024, 4);
    let mut new = old[..4096].to_vec();
    new.extend_from_slice(&old[8192..]);

    let patch = generate_patch(&old, &new, 1024);
    assert_eq!(apply_patch(&old, &patch).expect("apply"), new);
}

#[test]
fn empty_target_is_representable() {
    let old = snapshot(4096, 5);
    let patch = generate_patch(&old, &[], 256);
    assert_eq!(apply_patch(&old, &patch).expect("apply"), Vec::<u8>::new());
}

#[test]
fn header_describes_both_ends() {
    let old = snapshot(1000, 6);
    let new = snapshot(1200, 7);
    let header = inspect_patch(&generate_patch(&old, &new, 100)).expect("header");
    assert_eq!(header.base_len, 1000);
    assert_eq!(header.target_len, 1200);
    assert_eq!(header.block_len, 100);
}

// ============================================================================
// Base pinning
// ============================================================================

#[test]
fn patch_for_other_base_is_rejected() {
    let old = snapshot(8192, 8);
    let other = snapshot(8192, 9);
    let new = snapshot(8192, 10);
    let patch = generate_patch(&old, &new, 512);

    assert!(matches!(
        apply_patch(&other, &patch),
        Err(PatchError::BaseChecksum(_))
    ));
}

#[test]
fn truncated_patch_never_yields_output() {
    let old = snapshot(8192, 11);
    let mut new = old.clone();
    new[100] ^= 0xff;
    let patch = generate_patch(&old, &new, 512);

    for cut in [0, 3, 40, patch.len() / 2, patch.len() - 1] {
        assert!(apply_patch(&old, &patch[..cut]).is_err(), "cut at {cut}");
    }
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_patch_rebuilds_target(
        old in proptest::collection::vec(any::<u8>(), 0..2048),
        new in proptest::collection::vec(any::<u8>(), 0..2048),
        block_len in 1u32..64,
    ) {
        let patch = PatchGenerator::new().with_block_len(block_len).generate(&old, &new);
        prop_assert_eq!(apply_patch(&old, &patch), Ok(new));
    }

    #[test]
    fn application_is_deterministic(
        old in proptest::collection::vec(any::<u8>(), 0..1024),
        new in proptest::collection::vec(any::<u8>(), 0..1024),
        flip in any::<usize>(),
    ) {
        let mut patch = generate_patch(&old, &new, 16);
        let at = flip % patch.len();
        patch[at] ^= 0x55;
        let first = apply_patch(&old, &patch);
        let second = apply_patch(&old, &patch);
        prop_assert_eq!(first, second);
    }
}
