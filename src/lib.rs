//! # traceblock
//!
//! The immutable on-disk block layer of a multi-tenant trace store:
//! - Length-delimited object codec
//! - Sparse record index with span lookup
//! - Per-block bloom filter for cross-block pruning
//! - Block lifecycle: writing → sealed → cleared, plus crash replay
//!
//! ## Architecture Overview
//!
//! ```text
//!                   ingest (ascending ids)
//!                           │
//!                           ▼
//!                   ┌───────────────┐
//!                   │  BlockWriter  │──── IndexBuilder (records + bloom)
//!                   └───────┬───────┘
//!                           │ seal()
//!                           ▼
//!  query fan-out    ┌───────────────┐    compaction / upload
//!  filter() ──────▶ │   BlockFile   │ ◀────── iterate(), write_info()
//!  find()           └───────┬───────┘          clear()
//!                           │
//!                           ▼
//!                 {data_dir}/{block_id}+{tenant_id}
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod encoding;
pub mod filter;
pub mod block;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use block::{BlockDir, BlockFile, BlockWriter, CompleteBlock, ReplayBlock, UnsealedBlock, WriteInfo};
pub use config::Config;
pub use encoding::{BlockMeta, Record};
pub use error::{BlockError, Result};
pub use filter::{BloomFilter, MembershipFilter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of traceblock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
