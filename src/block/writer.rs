//! Block Writer
//!
//! Appends encoded objects in ascending identifier order to a new block
//! file, building the index and filter on the way. `seal()` freezes the
//! block and returns it as a queryable [`BlockFile`].

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::BytesMut;
use uuid::Uuid;

use super::backing::BackingFile;
use super::index::IndexBuilder;
use super::naming::block_path;
use super::BlockFile;
use crate::config::Config;
use crate::encoding::encode_into;
use crate::error::{BlockError, Result};

/// Writer for a block in the Writing state
pub struct BlockWriter {
    block_id: Uuid,
    tenant_id: String,
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    index: IndexBuilder,
    /// Scratch buffer reused for each encoded object
    scratch: BytesMut,
    fsync_on_seal: bool,
    bloom_fp_rate: f64,
    /// Set after an I/O error; the file and the index may disagree
    failed: bool,
}

impl BlockWriter {
    /// Create the backing file for a new block.
    ///
    /// Fails if a file for the same `(block_id, tenant_id)` already exists.
    pub fn create(config: &Config, block_id: Uuid, tenant_id: &str) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let path = block_path(&config.data_dir, block_id, tenant_id)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;

        tracing::debug!(%block_id, tenant_id, path = %path.display(), "block file created");

        Ok(Self {
            block_id,
            tenant_id: tenant_id.to_string(),
            path,
            writer: BufWriter::new(file),
            index: IndexBuilder::new(block_id, tenant_id, config.records_per_span),
            scratch: BytesMut::new(),
            fsync_on_seal: config.fsync_on_seal,
            bloom_fp_rate: config.bloom_fp_rate,
            failed: false,
        })
    }

    /// Append one object (must be called in ascending identifier order).
    ///
    /// A rejected object leaves the writer usable. An I/O error does not:
    /// every later `append` or `seal` fails with `WriterFailed`.
    pub fn append(&mut self, id: &[u8], payload: &[u8]) -> Result<()> {
        self.ensure_usable()?;

        self.scratch.clear();
        encode_into(&mut self.scratch, id, payload)?;
        self.index
            .push(id, self.scratch.len() as u64, SystemTime::now())?;

        if let Err(e) = self.writer.write_all(&self.scratch) {
            self.failed = true;
            tracing::error!(block_id = %self.block_id, error = %e, "block write failed");
            return Err(e.into());
        }
        Ok(())
    }

    /// Flush the data, freeze the index and filter, and open the block for reads
    pub fn seal(mut self) -> Result<BlockFile> {
        self.ensure_usable()?;

        self.writer.flush()?;
        let file = self.writer.into_inner().map_err(|e| {
            BlockError::Io(e.into_error())
        })?;
        if self.fsync_on_seal {
            file.sync_all()?;
        }
        drop(file);

        let (meta, records, filter) = self.index.finish(self.bloom_fp_rate)?;

        tracing::info!(
            block_id = %self.block_id,
            tenant_id = %self.tenant_id,
            objects = meta.object_count,
            records = records.len(),
            "block sealed"
        );

        let backing = BackingFile::new(self.block_id, self.path);
        Ok(BlockFile::from_parts(meta, records, filter, backing))
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.failed {
            return Err(BlockError::WriterFailed {
                block_id: self.block_id,
            });
        }
        Ok(())
    }

    pub fn block_id(&self) -> Uuid {
        self.block_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Objects appended so far
    pub fn object_count(&self) -> u64 {
        self.index.object_count()
    }
}
