//! Block Module
//!
//! The sealed, append-only unit of storage.
//!
//! ## Lifecycle
//! ```text
//!   BlockWriter ──seal()──▶ BlockFile ──clear()──▶ (cleared)
//!    (Writing)               (Sealed)               (terminal)
//!        │
//!     crash
//!        ▼
//!   UnsealedBlock ──reseal()──▶ BlockFile
//!    (replay only)
//! ```
//!
//! ## Capabilities
//! - [`ReplayBlock`]: full scan, tenant, clear. Implemented by both
//!   [`UnsealedBlock`] and [`BlockFile`].
//! - [`CompleteBlock`]: replay plus point lookup, metadata, filter and the
//!   [`WriteInfo`] handoff. Implemented by [`BlockFile`].

mod backing;
mod complete;
mod index;
mod naming;
mod replay;
mod writer;

use std::path::PathBuf;
use std::time::SystemTime;

use bytes::Bytes;
use uuid::Uuid;

use crate::encoding::{BlockMeta, Record};
use crate::error::Result;
use crate::filter::BloomFilter;

pub use complete::BlockFile;
pub use naming::{block_file_name, block_path, parse_block_file_name, validate_tenant};
pub use replay::{BlockDir, UnsealedBlock};
pub use writer::BlockWriter;

/// Blocks that can be read back in full (crash replay, compaction input)
pub trait ReplayBlock: Send + Sync {
    /// Visit every object in file order through a fresh read handle.
    ///
    /// `visit` returns `Ok(false)` to stop early; an error from `visit`
    /// aborts the scan and is returned as is.
    fn iterate(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<bool>) -> Result<()>;

    fn block_id(&self) -> Uuid;

    fn tenant_id(&self) -> &str;

    /// Close any open handle and remove the backing file.
    /// Every later call on the block fails with `BlockError::Cleared`.
    fn clear(&self) -> Result<()>;
}

/// Sealed blocks: replay plus point lookup
pub trait CompleteBlock: ReplayBlock {
    /// Payload stored under `id`, or `None` if the block does not hold it.
    ///
    /// The membership filter is not consulted here; see [`CompleteBlock::filter`].
    fn find(&self, id: &[u8]) -> Result<Option<Bytes>>;

    fn meta(&self) -> &BlockMeta;

    /// Filter over every identifier in the block, for cross-block pruning
    fn filter(&self) -> &BloomFilter;

    /// When the block was last handed off successfully
    fn time_written(&self) -> Option<SystemTime>;

    fn mark_written(&self, at: SystemTime);

    /// Snapshot for a process taking over the raw bytes
    fn write_info(&self) -> WriteInfo;
}

/// Narrow handoff snapshot of a sealed block.
///
/// The holder reads the file at `path` directly; it must finish before the
/// source block is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteInfo {
    pub block_id: Uuid,
    pub tenant_id: String,
    pub records: Vec<Record>,
    pub path: PathBuf,
}
