//! Tests for the sparse record index
//!
//! These tests verify:
//! - Span lookup for boundary, in-between and out-of-range targets
//! - Persisted index encoding with checksum
//! - Ordering and contiguity validation

use traceblock::encoding::{
    decode_records, encode_records, find_candidate_span, validate_records, Record,
};
use traceblock::BlockError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Contiguous spans of 10 bytes each, starting at the given ids
fn records(ids: &[&[u8]]) -> Vec<Record> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| Record {
            id: id.to_vec(),
            start: i as u64 * 10,
            length: 10,
        })
        .collect()
}

// =============================================================================
// Span Lookup Tests
// =============================================================================

#[test]
fn test_lookup_empty_index() {
    assert_eq!(find_candidate_span(&[], b"anything"), None);
}

#[test]
fn test_lookup_exact_boundaries() {
    let index = records(&[b"b", b"d", b"f"]);

    assert_eq!(find_candidate_span(&index, b"b"), Some(0));
    assert_eq!(find_candidate_span(&index, b"d"), Some(1));
    assert_eq!(find_candidate_span(&index, b"f"), Some(2));
}

#[test]
fn test_lookup_between_boundaries_uses_preceding_span() {
    let index = records(&[b"b", b"d", b"f"]);

    assert_eq!(find_candidate_span(&index, b"c"), Some(0));
    assert_eq!(find_candidate_span(&index, b"cz"), Some(0));
    assert_eq!(find_candidate_span(&index, b"e"), Some(1));
}

#[test]
fn test_lookup_before_first_boundary() {
    let index = records(&[b"b", b"d", b"f"]);

    assert_eq!(find_candidate_span(&index, b"a"), None);
    assert_eq!(find_candidate_span(&index, b""), None);
}

#[test]
fn test_lookup_after_last_boundary_uses_last_span() {
    let index = records(&[b"b", b"d", b"f"]);

    assert_eq!(find_candidate_span(&index, b"g"), Some(2));
    assert_eq!(find_candidate_span(&index, b"fa"), Some(2));
}

#[test]
fn test_lookup_prefix_ordering() {
    // "ab" sorts after "a" and before "b"
    let index = records(&[b"a", b"b"]);

    assert_eq!(find_candidate_span(&index, b"ab"), Some(0));
}

#[test]
fn test_lookup_single_record() {
    let index = records(&[b"m"]);

    assert_eq!(find_candidate_span(&index, b"a"), None);
    assert_eq!(find_candidate_span(&index, b"m"), Some(0));
    assert_eq!(find_candidate_span(&index, b"z"), Some(0));
}

// =============================================================================
// Persisted Form Tests
// =============================================================================

#[test]
fn test_encode_decode_records() {
    let index = records(&[b"alpha", b"beta", b""]);
    let encoded = encode_records(&index).unwrap();

    assert_eq!(decode_records(&encoded).unwrap(), index);
}

#[test]
fn test_encode_empty_index() {
    let encoded = encode_records(&[]).unwrap();

    // count (4) + crc (4)
    assert_eq!(encoded.len(), 8);
    assert!(decode_records(&encoded).unwrap().is_empty());
}

#[test]
fn test_decode_detects_bit_flip() {
    let index = records(&[b"alpha", b"beta"]);
    let mut encoded = encode_records(&index).unwrap().to_vec();
    encoded[6] ^= 0x01;

    let err = decode_records(&encoded).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_decode_too_short() {
    assert!(matches!(
        decode_records(&[0, 0, 0]),
        Err(BlockError::Corruption(_))
    ));
}

#[test]
fn test_decode_count_larger_than_body() {
    // count = 5 with no record bytes, valid checksum
    let body = 5u32.to_le_bytes();
    let mut data = body.to_vec();
    data.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());

    assert!(matches!(
        decode_records(&data),
        Err(BlockError::Corruption(_))
    ));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validate_contiguous_index() {
    assert!(validate_records(&records(&[b"a", b"b", b"c"])).is_ok());
    assert!(validate_records(&[]).is_ok());
}

#[test]
fn test_validate_rejects_gap() {
    let mut index = records(&[b"a", b"b"]);
    index[1].start += 1;

    assert!(validate_records(&index).unwrap_err().is_corruption());
}

#[test]
fn test_validate_rejects_out_of_order() {
    let index = records(&[b"b", b"a"]);

    assert!(validate_records(&index).unwrap_err().is_corruption());
}
