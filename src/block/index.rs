//! Index builder
//!
//! Tracks byte offsets while objects are laid down (or re-read during
//! crash replay) and produces the sparse record index, the bloom filter
//! and the block metadata when the block is sealed.

use std::time::SystemTime;

use uuid::Uuid;

use crate::encoding::{BlockMeta, Record};
use crate::error::{BlockError, Result};
use crate::filter::{BloomFilter, MembershipFilter};

/// Largest span a record can describe
const MAX_SPAN_BYTES: u64 = u32::MAX as u64;

pub(crate) struct IndexBuilder {
    records_per_span: usize,
    /// Byte cap per span; a span is cut early rather than overflow it
    span_limit: u64,
    meta: BlockMeta,
    records: Vec<Record>,
    /// Every identifier, in order, for the filter built at seal time
    ids: Vec<Vec<u8>>,
    /// Offset where the next object starts
    offset: u64,
    /// Start offset of the open span
    span_start: u64,
    /// Objects in the open span (0 = no open span)
    span_objects: usize,
}

impl IndexBuilder {
    pub(crate) fn new(block_id: Uuid, tenant_id: &str, records_per_span: usize) -> Self {
        Self {
            records_per_span: records_per_span.max(1),
            span_limit: MAX_SPAN_BYTES,
            meta: BlockMeta::new(block_id, tenant_id),
            records: Vec::new(),
            ids: Vec::new(),
            offset: 0,
            span_start: 0,
            span_objects: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_span_limit(mut self, span_limit: u64) -> Self {
        self.span_limit = span_limit;
        self
    }

    pub(crate) fn object_count(&self) -> u64 {
        self.meta.object_count
    }

    /// Fail if `id` would break ascending order
    pub(crate) fn check_order(&self, id: &[u8]) -> Result<()> {
        match self.ids.last() {
            Some(last) if id < last.as_slice() => Err(BlockError::OutOfOrder),
            _ => Ok(()),
        }
    }

    /// Account for one object of `encoded_len` bytes.
    ///
    /// All checks run before any state changes, so a rejected object leaves
    /// the builder as it was.
    pub(crate) fn push(&mut self, id: &[u8], encoded_len: u64, at: SystemTime) -> Result<()> {
        self.check_order(id)?;
        if encoded_len > self.span_limit {
            return Err(BlockError::ObjectTooLarge(
                usize::try_from(encoded_len).unwrap_or(usize::MAX),
            ));
        }

        // A repeated identifier never opens a span, so all copies of it
        // start in the same span and the first one wins on lookup.
        let repeated = self.ids.last().is_some_and(|last| last.as_slice() == id);
        let overflow =
            self.span_objects > 0 && self.offset + encoded_len - self.span_start > self.span_limit;
        if repeated && overflow {
            return Err(BlockError::SpanTooLarge {
                limit: self.span_limit,
            });
        }
        if overflow || (self.span_objects >= self.records_per_span && !repeated) {
            self.close_span()?;
        }

        if self.span_objects == 0 {
            self.span_start = self.offset;
            self.records.push(Record {
                id: id.to_vec(),
                start: self.offset,
                length: 0,
            });
        }

        self.offset += encoded_len;
        self.span_objects += 1;
        self.ids.push(id.to_vec());
        self.meta.observe(id, at);
        Ok(())
    }

    fn close_span(&mut self) -> Result<()> {
        let len = self.offset - self.span_start;
        let length = u32::try_from(len).map_err(|_| BlockError::ObjectTooLarge(len as usize))?;
        if let Some(record) = self.records.last_mut() {
            record.length = length;
            tracing::debug!(start = record.start, length, objects = self.span_objects, "index span closed");
        }
        self.span_objects = 0;
        Ok(())
    }

    /// Close the last span and build the frozen index, filter and metadata
    pub(crate) fn finish(mut self, fp_rate: f64) -> Result<(BlockMeta, Vec<Record>, BloomFilter)> {
        if self.span_objects > 0 {
            self.close_span()?;
        }

        let mut filter = BloomFilter::with_rate(self.ids.len(), fp_rate);
        for id in &self.ids {
            filter.add(id);
        }

        Ok((self.meta, self.records, filter))
    }
}
