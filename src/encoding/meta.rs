//! Block metadata

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Current block format version
pub const BLOCK_VERSION: u16 = 1;

/// Identity and bounds of one sealed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub version: u16,
    pub block_id: Uuid,
    pub tenant_id: String,
    /// Smallest identifier in the block (empty for an empty block)
    pub min_id: Vec<u8>,
    /// Largest identifier in the block (empty for an empty block)
    pub max_id: Vec<u8>,
    /// Wall-clock time of the first append
    pub start_time: SystemTime,
    /// Wall-clock time of the last append
    pub end_time: SystemTime,
    pub object_count: u64,
}

impl BlockMeta {
    /// Metadata for a block with no objects yet
    pub fn new(block_id: Uuid, tenant_id: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            version: BLOCK_VERSION,
            block_id,
            tenant_id: tenant_id.into(),
            min_id: Vec::new(),
            max_id: Vec::new(),
            start_time: now,
            end_time: now,
            object_count: 0,
        }
    }

    /// Widen the bounds to cover `id` appended at `at`
    pub fn observe(&mut self, id: &[u8], at: SystemTime) {
        if self.object_count == 0 {
            self.min_id = id.to_vec();
            self.start_time = at;
        }
        self.max_id = id.to_vec();
        self.end_time = at;
        self.object_count += 1;
    }

    /// Range check: false if `id` is definitely outside `[min_id, max_id]`
    pub fn might_contain_range(&self, id: &[u8]) -> bool {
        self.object_count > 0 && id >= self.min_id.as_slice() && id <= self.max_id.as_slice()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}
