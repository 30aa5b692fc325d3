//! Error types for traceblock
//!
//! Provides a unified error type for all block operations.
//!
//! Absence of an identifier is never an error: lookups return `Ok(None)`.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using BlockError
pub type Result<T> = std::result::Result<T, BlockError>;

/// Unified error type for traceblock operations
#[derive(Debug, Error)]
pub enum BlockError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Data Integrity Errors
    // -------------------------------------------------------------------------
    /// The bytes on disk do not decode into well-formed objects or records.
    /// Callers should quarantine the block rather than retry.
    #[error("Block corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Block {block_id} has already been cleared")]
    Cleared { block_id: Uuid },

    // -------------------------------------------------------------------------
    // Write Errors
    // -------------------------------------------------------------------------
    #[error("Objects must be appended in ascending identifier order")]
    OutOfOrder,

    #[error("Object field too large: {0} bytes")]
    ObjectTooLarge(usize),

    /// Copies of one identifier must share a span, and this copy would push
    /// that span past its byte cap.
    #[error("Span would exceed {limit} bytes")]
    SpanTooLarge { limit: u64 },

    #[error("Block writer for {block_id} failed earlier and can no longer be used")]
    WriterFailed { block_id: Uuid },

    // -------------------------------------------------------------------------
    // Naming Errors
    // -------------------------------------------------------------------------
    #[error("Invalid tenant id: {0:?}")]
    InvalidTenant(String),

    #[error("Invalid block file name: {0:?}")]
    InvalidFileName(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BlockError {
    /// True when the error indicates damaged block data rather than a
    /// transient environment problem.
    pub fn is_corruption(&self) -> bool {
        matches!(self, BlockError::Corruption(_))
    }
}

impl From<bincode::Error> for BlockError {
    fn from(e: bincode::Error) -> Self {
        BlockError::Serialization(e.to_string())
    }
}
