//! Sparse record index
//!
//! A record points at one contiguous span of the block file. The span holds
//! one or more objects in identifier order; the record carries the first
//! object's identifier. Consecutive spans are adjacent on disk.
//!
//! ## Persisted Form
//! ```text
//! ┌───────────┬──────────────────────────────────────────────┬───────────┐
//! │ Count (4) │ [IdLen (4)][Id][Start (8)][Length (4)] * N   │ CRC32 (4) │
//! └───────────┴──────────────────────────────────────────────┴───────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{BlockError, Result};

/// One index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier of the first object in the span
    pub id: Vec<u8>,
    /// Byte offset of the span in the block file
    pub start: u64,
    /// Span length in bytes
    pub length: u32,
}

impl Record {
    /// Offset one past the end of the span
    pub fn end(&self) -> u64 {
        self.start + u64::from(self.length)
    }
}

/// Locate the span that would hold `target`.
///
/// Lower-bound search for the first record whose id is `>= target`. On an
/// exact boundary hit that span is returned; otherwise the target lies in
/// the preceding span. A target below the first boundary (or an empty
/// index) has no candidate.
pub fn find_candidate_span(records: &[Record], target: &[u8]) -> Option<usize> {
    let i = records.partition_point(|r| r.id.as_slice() < target);

    match records.get(i) {
        Some(r) if r.id.as_slice() == target => Some(i),
        _ if i == 0 => None,
        _ => Some(i - 1),
    }
}

/// Check ordering and contiguity of an index
pub fn validate_records(records: &[Record]) -> Result<()> {
    for pair in records.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.id > next.id {
            return Err(BlockError::Corruption(format!(
                "index out of order at offset {}",
                next.start
            )));
        }
        if prev.end() != next.start {
            return Err(BlockError::Corruption(format!(
                "index spans not contiguous: span ends at {}, next starts at {}",
                prev.end(),
                next.start
            )));
        }
    }
    Ok(())
}

/// Serialize an index for handoff to long-term storage
pub fn encode_records(records: &[Record]) -> Result<Bytes> {
    let count = u32::try_from(records.len())
        .map_err(|_| BlockError::ObjectTooLarge(records.len()))?;

    let mut buf = BytesMut::new();
    buf.put_u32_le(count);
    for r in records {
        let id_len =
            u32::try_from(r.id.len()).map_err(|_| BlockError::ObjectTooLarge(r.id.len()))?;
        buf.put_u32_le(id_len);
        buf.put_slice(&r.id);
        buf.put_u64_le(r.start);
        buf.put_u32_le(r.length);
    }

    let crc = crc32fast::hash(&buf);
    buf.put_u32_le(crc);
    Ok(buf.freeze())
}

/// Parse an index produced by [`encode_records`]
pub fn decode_records(data: &[u8]) -> Result<Vec<Record>> {
    if data.len() < 8 {
        return Err(BlockError::Corruption(format!(
            "index too short: {} bytes",
            data.len()
        )));
    }

    let (body, crc_bytes) = data.split_at(data.len() - 4);
    let expected = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(BlockError::Corruption(format!(
            "index checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }

    let mut buf = body;
    let count = buf.get_u32_le() as usize;
    // Each record takes at least 16 bytes, so this bounds the allocation.
    let mut records = Vec::with_capacity(count.min(buf.remaining() / 16));

    for _ in 0..count {
        if buf.remaining() < 4 {
            return Err(truncated_index());
        }
        let id_len = buf.get_u32_le() as usize;
        if buf.remaining() < id_len + 12 {
            return Err(truncated_index());
        }
        let id = buf[..id_len].to_vec();
        buf.advance(id_len);
        let start = buf.get_u64_le();
        let length = buf.get_u32_le();
        records.push(Record { id, start, length });
    }

    if buf.has_remaining() {
        return Err(BlockError::Corruption(format!(
            "{} trailing bytes after index",
            buf.remaining()
        )));
    }

    Ok(records)
}

fn truncated_index() -> BlockError {
    BlockError::Corruption("truncated index record".to_string())
}
