//! Content checksum tests.
//!
//! Validates the SHA-256 content checksum against:
//! 1. FIPS 180-2 test vectors
//! 2. Wire (base64) round trips for arbitrary payloads
//! 3. Verification outcomes for matching, mismatching and absent checksums

use checksums::{ContentChecksum, IntegrityError, RollingChecksum, verify};
use proptest::prelude::*;

// ============================================================================
// FIPS 180-2 Test Vectors
// ============================================================================

#[test]
fn fips_abc() {
    assert_eq!(
        ContentChecksum::compute(b"abc").to_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn fips_two_block_message() {
    assert_eq!(
        ContentChecksum::compute(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq")
            .to_hex(),
        "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
    );
}

#[test]
fn base64_wire_form_for_known_digest() {
    // base64(SHA-256("")) as published by most feed producers.
    assert_eq!(
        ContentChecksum::compute(b"").to_base64(),
        "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
    );
}

// ============================================================================
// Verification
// ============================================================================

#[test]
fn verify_accepts_matching_payload() {
    let payload = vec![7u8; 100_000];
    let declared = ContentChecksum::compute(&payload);
    assert!(verify(&payload, Some(&declared)).is_ok());
}

#[test]
fn verify_rejects_single_bit_flip() {
    let mut payload = vec![0u8; 1024];
    let declared = ContentChecksum::compute(&payload);
    payload[512] ^= 1;
    assert!(matches!(
        verify(&payload, Some(&declared)),
        Err(IntegrityError::Mismatch { len: 1024, .. })
    ));
}

#[test]
fn mismatch_message_names_both_digests() {
    let declared = ContentChecksum::compute(b"a");
    let err = verify(b"b", Some(&declared)).expect_err("mismatch");
    let message = err.to_string();
    assert!(message.contains(&declared.to_base64()));
    assert!(message.contains(&ContentChecksum::compute(b"b").to_base64()));
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #[test]
    fn base64_form_round_trips(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
        let checksum = ContentChecksum::compute(&payload);
        prop_assert_eq!(ContentChecksum::from_base64(&checksum.to_base64()), Ok(checksum));
    }

    #[test]
    fn rolling_window_matches_fresh(
        data in proptest::collection::vec(any::<u8>(), 16..256),
        window in 1usize..16,
    ) {
        let mut rolling = RollingChecksum::of(&data[..window]);
        for start in 1..=data.len() - window {
            rolling.roll(data[start - 1], data[start + window - 1]);
            prop_assert_eq!(rolling.value(), RollingChecksum::of(&data[start..start + window]).value());
        }
    }
}
