//! Sealed block
//!
//! Read-only block with its frozen index and filter. Supports point lookup
//! through the sparse index and full scans for replay or compaction.

use std::path::Path;
use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::Mutex;
use uuid::Uuid;

use super::backing::BackingFile;
use super::naming::block_path;
use super::{CompleteBlock, ReplayBlock, WriteInfo};
use crate::encoding::{find_candidate_span, validate_records, BlockMeta, ObjectReader, Record};
use crate::error::{BlockError, Result};
use crate::filter::BloomFilter;

/// A sealed block file
pub struct BlockFile {
    meta: BlockMeta,
    filter: BloomFilter,
    records: Vec<Record>,
    backing: BackingFile,
    /// Set once the block has been handed off successfully
    time_written: Mutex<Option<SystemTime>>,
}

impl BlockFile {
    /// Wrap an existing block file in `dir` with its frozen index and filter.
    ///
    /// Used by the writer at seal time, and by callers that reload a block
    /// from a persisted index.
    pub fn open(
        dir: &Path,
        meta: BlockMeta,
        records: Vec<Record>,
        filter: BloomFilter,
    ) -> Result<Self> {
        validate_records(&records)?;
        let path = block_path(dir, meta.block_id, &meta.tenant_id)?;
        let backing = BackingFile::new(meta.block_id, path);
        Ok(Self::from_parts(meta, records, filter, backing))
    }

    pub(crate) fn from_parts(
        meta: BlockMeta,
        records: Vec<Record>,
        filter: BloomFilter,
        backing: BackingFile,
    ) -> Self {
        Self {
            meta,
            filter,
            records,
            backing,
            time_written: Mutex::new(None),
        }
    }

    /// The sparse index
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    pub fn is_cleared(&self) -> bool {
        self.backing.is_cleared()
    }

    fn lookup(&self, id: &[u8]) -> Result<Option<Bytes>> {
        let file = self.backing.open()?;

        let Some(i) = find_candidate_span(&self.records, id) else {
            return Ok(None);
        };
        let record = &self.records[i];

        let span = file.read_span(record.start, record.length)?;
        let mut objects = ObjectReader::new(&span[..]);
        while let Some(obj) = objects.next_object()? {
            if obj.id == id {
                return Ok(Some(obj.payload));
            }
        }

        Ok(None)
    }
}

impl ReplayBlock for BlockFile {
    fn iterate(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<bool>) -> Result<()> {
        self.backing.open()?.scan(visit)
    }

    fn block_id(&self) -> Uuid {
        self.meta.block_id
    }

    fn tenant_id(&self) -> &str {
        &self.meta.tenant_id
    }

    fn clear(&self) -> Result<()> {
        self.backing.clear()
    }
}

impl CompleteBlock for BlockFile {
    fn find(&self, id: &[u8]) -> Result<Option<Bytes>> {
        self.lookup(id).map_err(|e| match e {
            BlockError::Corruption(detail) => BlockError::Corruption(format!(
                "block {}: {}",
                self.meta.block_id, detail
            )),
            other => other,
        })
    }

    fn meta(&self) -> &BlockMeta {
        &self.meta
    }

    fn filter(&self) -> &BloomFilter {
        &self.filter
    }

    fn time_written(&self) -> Option<SystemTime> {
        *self.time_written.lock()
    }

    fn mark_written(&self, at: SystemTime) {
        *self.time_written.lock() = Some(at);
    }

    fn write_info(&self) -> WriteInfo {
        WriteInfo {
            block_id: self.meta.block_id,
            tenant_id: self.meta.tenant_id.clone(),
            records: self.records.clone(),
            path: self.backing.path().to_path_buf(),
        }
    }
}

impl std::fmt::Debug for BlockFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockFile")
            .field("block_id", &self.meta.block_id)
            .field("tenant_id", &self.meta.tenant_id)
            .field("records", &self.records.len())
            .field("path", &self.backing.path())
            .finish()
    }
}
