//! Tests for the object codec
//!
//! These tests verify:
//! - Encode/decode round-trips, including empty ids and payloads
//! - Clean end of stream vs truncated objects
//! - Streaming reader offsets
//! - I/O errors are not reported as corruption

use std::io::{self, Read};

use proptest::prelude::*;
use traceblock::encoding::{decode_next, encode, encoded_len, ObjectReader, OBJECT_HEADER_SIZE};
use traceblock::BlockError;

// =============================================================================
// Helper Functions
// =============================================================================

fn encode_all(objects: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, payload) in objects {
        out.extend_from_slice(&encode(id, payload).unwrap());
    }
    out
}

/// Reader that fails with a non-EOF error
struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }
}

/// Reader that hands out one byte per call
struct TrickleReader<'a>(&'a [u8]);

impl Read for TrickleReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.0[0];
        self.0 = &self.0[1..];
        Ok(1)
    }
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_layout() {
    let bytes = encode(b"abc", b"hello").unwrap();

    assert_eq!(bytes.len(), OBJECT_HEADER_SIZE + 3 + 5);
    assert_eq!(&bytes[0..4], &3u32.to_le_bytes());
    assert_eq!(&bytes[4..8], &5u32.to_le_bytes());
    assert_eq!(&bytes[8..11], b"abc");
    assert_eq!(&bytes[11..], b"hello");
    assert_eq!(encoded_len(b"abc", b"hello"), bytes.len() as u64);
}

#[test]
fn test_empty_id_and_payload_round_trip() {
    let bytes = encode(b"", b"").unwrap();
    assert_eq!(bytes.len(), OBJECT_HEADER_SIZE);

    let mut reader = &bytes[..];
    let obj = decode_next(&mut reader).unwrap().unwrap();
    assert!(obj.id.is_empty());
    assert!(obj.payload.is_empty());
    assert!(decode_next(&mut reader).unwrap().is_none());
}

#[test]
fn test_empty_payload_round_trip() {
    let bytes = encode(b"trace-1", b"").unwrap();

    let obj = decode_next(&mut &bytes[..]).unwrap().unwrap();
    assert_eq!(obj.id, &b"trace-1"[..]);
    assert!(obj.payload.is_empty());
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_empty_stream_is_end_of_stream() {
    let mut reader: &[u8] = &[];
    assert!(decode_next(&mut reader).unwrap().is_none());
}

#[test]
fn test_decode_consecutive_objects() {
    let data = encode_all(&[(b"a", b"1"), (b"b", b"22"), (b"c", b"333")]);
    let mut reader = &data[..];

    let mut seen = Vec::new();
    while let Some(obj) = decode_next(&mut reader).unwrap() {
        seen.push((obj.id.to_vec(), obj.payload.to_vec()));
    }

    assert_eq!(
        seen,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"22".to_vec()),
            (b"c".to_vec(), b"333".to_vec()),
        ]
    );
}

#[test]
fn test_decode_truncated_header_is_corruption() {
    let data = encode(b"id", b"payload").unwrap();

    for cut in 1..OBJECT_HEADER_SIZE {
        let result = decode_next(&mut &data[..cut]);
        assert!(
            matches!(result, Err(BlockError::Corruption(_))),
            "cut at {} should be corruption",
            cut
        );
    }
}

#[test]
fn test_decode_truncated_id_is_corruption() {
    let data = encode(b"identifier", b"payload").unwrap();
    let result = decode_next(&mut &data[..OBJECT_HEADER_SIZE + 4]);
    assert!(matches!(result, Err(BlockError::Corruption(_))));
}

#[test]
fn test_decode_truncated_payload_is_corruption() {
    let data = encode(b"id", b"payload").unwrap();
    let result = decode_next(&mut &data[..data.len() - 1]);
    assert!(matches!(result, Err(BlockError::Corruption(_))));
}

#[test]
fn test_decode_huge_declared_length_is_corruption() {
    let mut data = encode(b"id", b"payload").unwrap().to_vec();
    data[4..8].copy_from_slice(&u32::MAX.to_le_bytes());

    let err = decode_next(&mut &data[..]).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_decode_io_error_is_not_corruption() {
    let result = decode_next(&mut FailingReader);
    assert!(matches!(result, Err(BlockError::Io(_))));
}

#[test]
fn test_decode_handles_short_reads() {
    let data = encode_all(&[(b"x", b"first"), (b"y", b"second")]);
    let mut reader = TrickleReader(&data);

    let first = decode_next(&mut reader).unwrap().unwrap();
    let second = decode_next(&mut reader).unwrap().unwrap();
    assert_eq!(first.payload, &b"first"[..]);
    assert_eq!(second.payload, &b"second"[..]);
    assert!(decode_next(&mut reader).unwrap().is_none());
}

// =============================================================================
// ObjectReader Tests
// =============================================================================

#[test]
fn test_object_reader_tracks_offsets() {
    let data = encode_all(&[(b"a", b"1"), (b"bb", b"22")]);
    let mut reader = ObjectReader::new(&data[..]);

    assert_eq!(reader.offset(), 0);
    reader.next_object().unwrap().unwrap();
    assert_eq!(reader.offset(), encoded_len(b"a", b"1"));
    reader.next_object().unwrap().unwrap();
    assert_eq!(reader.offset(), data.len() as u64);
    assert!(reader.next_object().unwrap().is_none());
}

#[test]
fn test_object_reader_iterator() {
    let data = encode_all(&[(b"a", b"1"), (b"b", b"2")]);
    let objects: Vec<_> = ObjectReader::new(&data[..])
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1].id, &b"b"[..]);
}

#[test]
fn test_object_reader_stops_after_first_error() {
    let mut data = encode_all(&[(b"a", b"1"), (b"b", b"payload"), (b"c", b"3")]);
    // truncate inside the second object's payload
    let cut = encoded_len(b"a", b"1") as usize + OBJECT_HEADER_SIZE + 3;
    data.truncate(cut);

    let mut reader = ObjectReader::new(&data[..]);

    assert_eq!(reader.next().unwrap().unwrap().id, &b"a"[..]);
    assert!(reader.next().unwrap().unwrap_err().is_corruption());
    assert!(reader.next().is_none());
    assert!(reader.next().is_none());
    assert!(reader.next_object().unwrap().is_none());
}

#[test]
fn test_object_reader_iterator_ends_after_damaged_length() {
    let mut data = encode_all(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    // the first id length now swallows the rest of the stream
    data[0..4].copy_from_slice(&1000u32.to_le_bytes());

    let results: Vec<_> = ObjectReader::new(&data[..]).collect();

    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().unwrap_err().is_corruption());
}

#[test]
fn test_object_reader_visit_each_stops_early() {
    let data = encode_all(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    let mut reader = ObjectReader::new(&data[..]);

    let mut visited = 0;
    reader
        .visit_each(&mut |_id: &[u8], _payload: &[u8]| {
            visited += 1;
            Ok(visited < 2)
        })
        .unwrap();

    assert_eq!(visited, 2);
    assert_eq!(reader.offset(), encoded_len(b"a", b"1") * 2);
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_encode_decode_round_trip(
        id in prop::collection::vec(any::<u8>(), 0..64),
        payload in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let bytes = encode(&id, &payload).unwrap();
        prop_assert_eq!(bytes.len() as u64, encoded_len(&id, &payload));

        let mut reader = &bytes[..];
        let obj = decode_next(&mut reader).unwrap().unwrap();
        prop_assert_eq!(obj.id.to_vec(), id);
        prop_assert_eq!(obj.payload.to_vec(), payload);
        prop_assert!(decode_next(&mut reader).unwrap().is_none());
    }

    #[test]
    fn prop_any_strict_prefix_is_corruption(
        id in prop::collection::vec(any::<u8>(), 0..16),
        payload in prop::collection::vec(any::<u8>(), 0..64),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = encode(&id, &payload).unwrap();
        // 1..len: every non-empty strict prefix
        let cut = 1 + cut.index(bytes.len() - 1);
        let result = decode_next(&mut &bytes[..cut]);
        prop_assert!(matches!(result, Err(BlockError::Corruption(_))));
    }
}
